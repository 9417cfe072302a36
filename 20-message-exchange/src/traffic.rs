//! Optional mirror of conversation traffic.

use std::{fmt, sync::Mutex};

use tracing::info;

use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => f.write_str("=>"),
            Direction::Incoming => f.write_str("<="),
        }
    }
}

/// Consumer of (direction, message) events. Never part of the protocol.
pub trait TrafficSink: Send + Sync {
    fn record(&self, direction: Direction, message: &Message);
}

/// Discards all traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TrafficSink for NoopSink {
    fn record(&self, _direction: Direction, _message: &Message) {}
}

/// Logs each message through `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TrafficSink for TracingSink {
    fn record(&self, direction: Direction, message: &Message) {
        info!("{direction} {message}");
    }
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(Direction, Message)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Direction, Message)> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Direction, Message)>> {
        // A poisoned recorder still holds usable data.
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TrafficSink for RecordingSink {
    fn record(&self, direction: Direction, message: &Message) {
        self.lock().push((direction, message.clone()));
    }
}
