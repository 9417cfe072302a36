//! Server side of one conversation: greet, answer every message, stop after logout.

use tracing::debug;

use crate::{
    channel::MessageChannel,
    error::SessionError,
    message::{Message, MessageBody, SenderName},
    traffic::{Direction, TrafficSink},
};

pub const GREETING: &str = "[Server listening. 'Logout' (case insensitive) closes connection.]";
pub const GOOD_BYE: &str = "[Closing connection, good-bye.]";
pub const LIST_USERS_REPLY: &str = "LISTUSERS requested";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Greeting,
    AwaitingMessage,
    Replying,
    Terminating,
    Closed,
}

/// Result of a conversation that ended with a logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationSummary {
    /// Receive-then-reply cycles, including the logout turn.
    pub turns: usize,
}

/// Builds the server's answer to a received message.
pub fn reply_to(identity: &SenderName, received: &Message) -> Message {
    let text = match received.body() {
        MessageBody::ListUsers => LIST_USERS_REPLY.to_string(),
        MessageBody::Logout => GOOD_BYE.to_string(),
        MessageBody::Text { text } => format!("TEXT: '{text}'"),
    };
    Message::new(identity.clone(), MessageBody::Text { text })
}

/// Drives one conversation over `channel` until logout or a fatal error.
///
/// The channel is closed before returning on every path.
pub async fn run_conversation<C, S>(
    channel: &mut C,
    identity: &SenderName,
    sink: &S,
) -> Result<ConversationSummary, SessionError>
where
    C: MessageChannel,
    S: TrafficSink + ?Sized,
{
    Conversation::new(channel, identity, sink).run().await
}

struct Conversation<'a, C, S: ?Sized> {
    channel: &'a mut C,
    identity: &'a SenderName,
    sink: &'a S,
    state: SessionState,
    turns: usize,
}

impl<'a, C, S> Conversation<'a, C, S>
where
    C: MessageChannel,
    S: TrafficSink + ?Sized,
{
    fn new(channel: &'a mut C, identity: &'a SenderName, sink: &'a S) -> Self {
        Self {
            channel,
            identity,
            sink,
            state: SessionState::Greeting,
            turns: 0,
        }
    }

    async fn run(mut self) -> Result<ConversationSummary, SessionError> {
        let outcome = self.converse().await;
        self.transition(SessionState::Closed);

        match outcome {
            Ok(()) => {
                self.channel.close().await?;
                Ok(ConversationSummary { turns: self.turns })
            }
            Err(err) => {
                if let Err(close_err) = self.channel.close().await {
                    debug!(error = ?close_err, "failed to close channel after session error");
                }
                Err(err)
            }
        }
    }

    async fn converse(&mut self) -> Result<(), SessionError> {
        let greeting = Message::new(
            self.identity.clone(),
            MessageBody::Text {
                text: GREETING.to_string(),
            },
        );
        self.send(&greeting).await?;

        loop {
            self.transition(SessionState::AwaitingMessage);
            let received = self.channel.receive().await.inspect_err(|err| {
                debug!(turn = self.turns + 1, error = %err, "receive failed");
            })?;
            self.sink.record(Direction::Incoming, &received);

            self.transition(SessionState::Replying);
            let reply = reply_to(self.identity, &received);
            self.send(&reply).await?;
            self.turns += 1;

            if received.is_logout() {
                self.transition(SessionState::Terminating);
                return Ok(());
            }
        }
    }

    async fn send(&mut self, message: &Message) -> Result<(), SessionError> {
        self.channel.send(message).await?;
        self.sink.record(Direction::Outgoing, message);
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}
