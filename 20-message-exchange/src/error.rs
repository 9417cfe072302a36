use std::io;

use thiserror::Error;

/// Precondition violations raised while building a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("sender name must not be empty")]
    EmptySender,
}

/// The received bytes do not form a message of any known variant.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("message has an empty sender name")]
    EmptySender,

    #[error("message line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("unknown message type `{tag}`")]
    UnknownVariant { tag: String },
}

/// Fatal outcome of a single conversation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("protocol error: {0}")]
    Decode(#[from] DecodeError),
}

impl SessionError {
    pub(crate) fn peer_closed() -> Self {
        SessionError::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "peer closed the connection",
        ))
    }
}

/// Invalid startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Port {port} not in range 1024-49151.")]
    PortOutOfRange { port: u32 },

    #[error("invalid port `{0}`")]
    InvalidPort(String),
}
