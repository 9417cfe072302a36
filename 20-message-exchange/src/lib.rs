//! Conversational message exchange between one server and one client.
//!
//! The two sides take turns: the server greets, the client sends a message,
//! the server replies, and so on until the client logs out. Each module
//! covers one concern:
//!
//! - [`message`] defines the closed set of message variants and the
//!   newline-delimited JSON encoding.
//! - [`channel`] is the transport seam: a [`channel::MessageChannel`] trait
//!   and a framed implementation over any async reader/writer pair.
//! - [`exchange`] runs the server side of one conversation, from greeting to
//!   the farewell that answers a logout.
//! - [`traffic`] mirrors sent and received messages to an optional sink.
//! - [`server`] accepts TCP connections one at a time and hands each to the
//!   exchange engine.
//! - [`client`] is the terminal-facing counterpart.
//! - [`cli`] and [`config`] parse and validate startup options.
//!
//! Integration tests drive the engine over in-memory pipes and real sockets.

pub mod channel;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod exchange;
pub mod message;
pub mod server;
pub mod traffic;
