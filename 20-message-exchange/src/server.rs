use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::Result;
use tokio::{
    io::BufReader,
    net::{TcpListener, TcpStream},
    select,
};
use tracing::{info, warn};

use crate::{
    channel::FramedChannel,
    error::SessionError,
    exchange::{ConversationSummary, run_conversation},
    message::SenderName,
    traffic::{TracingSink, TrafficSink},
};

/// Accepts connections one at a time and holds a conversation on each.
pub struct Server {
    listener: TcpListener,
    identity: SenderName,
    sink: Arc<dyn TrafficSink>,
}

impl Server {
    pub fn new(listener: TcpListener, identity: SenderName) -> Self {
        Self {
            listener,
            identity,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TrafficSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves conversations until `shutdown` resolves.
    ///
    /// A conversation in progress is not interrupted by shutdown; it is
    /// observed once the current session has closed.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Server {
            listener,
            identity,
            sink,
        } = self;
        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            let outcome = serve_connection(stream, &identity, sink.as_ref()).await;
                            report_outcome(peer, outcome);
                        }
                        Err(err) => warn!(error = ?err, "failed to accept connection"),
                    }
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

/// Runs a full conversation on an accepted TCP stream.
pub async fn serve_connection(
    stream: TcpStream,
    identity: &SenderName,
    sink: &dyn TrafficSink,
) -> Result<ConversationSummary, SessionError> {
    let (reader, writer) = stream.into_split();
    let mut channel = FramedChannel::new(BufReader::new(reader), writer);
    run_conversation(&mut channel, identity, sink).await
}

fn report_outcome(peer: SocketAddr, outcome: Result<ConversationSummary, SessionError>) {
    match outcome {
        Ok(summary) => info!(peer = %peer, turns = summary.turns, "=== Terminating connection. ==="),
        Err(err) => warn!(peer = %peer, error = %err, "conversation aborted"),
    }
}
