//! Transport seam between the exchange engine and the byte stream.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    error::{DecodeError, SessionError},
    message::{self, Message},
};

const LINE_ENDINGS: &[u8] = b"\n\r";

/// Longest accepted line, terminator included.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// A bidirectional, strictly sequential message channel.
pub trait MessageChannel {
    /// Encodes and flushes one message. Completes only once the bytes are written.
    fn send(&mut self, message: &Message) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Waits for exactly one message from the peer.
    fn receive(&mut self) -> impl Future<Output = Result<Message, SessionError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Newline-delimited JSON over any buffered reader and writer pair.
pub struct FramedChannel<R, W> {
    reader: R,
    writer: W,
    line: Vec<u8>,
    max_line_bytes: usize,
}

impl<R, W> FramedChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_max_line_bytes(reader, writer, DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_max_line_bytes(reader: R, writer: W, max_line_bytes: usize) -> Self {
        Self {
            reader,
            writer,
            line: Vec::new(),
            max_line_bytes,
        }
    }
}

impl<R, W> MessageChannel for FramedChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &Message) -> Result<(), SessionError> {
        let mut encoded = message::encode(message).map_err(std::io::Error::other)?;
        encoded.push(b'\n');
        self.writer.write_all(&encoded).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Message, SessionError> {
        // Blank lines are tolerated so netcat-style peers can be used by hand.
        loop {
            self.line.clear();
            let limit = u64::try_from(self.max_line_bytes).unwrap_or(u64::MAX);
            let bytes = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.line)
                .await?;
            if bytes == 0 {
                return Err(SessionError::peer_closed());
            }
            if bytes == self.max_line_bytes && self.line.last() != Some(&b'\n') {
                return Err(DecodeError::LineTooLong {
                    limit: self.max_line_bytes,
                }
                .into());
            }

            // Raw bytes go to the decoder, which rejects invalid UTF-8 as malformed.
            let end = self
                .line
                .iter()
                .rposition(|byte| !LINE_ENDINGS.contains(byte))
                .map_or(0, |last| last + 1);
            if end == 0 {
                continue;
            }

            return Ok(message::decode(&self.line[..end])?);
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
