//! Message taxonomy and the newline-delimited JSON wire format.
//!
//! Every message carries a sender, a timestamp, and a body. The body is a
//! closed enum, so the message type is always derived from the variant and
//! can never disagree with it.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, MessageError};

/// Wire tag identifying a message variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MsgType {
    Text,
    Logout,
    ListUsers,
}

impl MsgType {
    pub fn as_str(self) -> &'static str {
        match self {
            MsgType::Text => "TEXT",
            MsgType::Logout => "LOGOUT",
            MsgType::ListUsers => "LISTUSERS",
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MsgType {
    type Err = DecodeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "TEXT" => Ok(MsgType::Text),
            "LOGOUT" => Ok(MsgType::Logout),
            "LISTUSERS" => Ok(MsgType::ListUsers),
            other => Err(DecodeError::UnknownVariant {
                tag: other.to_string(),
            }),
        }
    }
}

/// Name of the participant that produced a message. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SenderName(String);

impl SenderName {
    pub fn new(name: impl Into<String>) -> Result<Self, MessageError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MessageError::EmptySender);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Variant-specific payload of a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text { text: String },
    Logout,
    /// Asks the server to enumerate connected users.
    ListUsers,
}

impl MessageBody {
    pub fn msg_type(&self) -> MsgType {
        match self {
            MessageBody::Text { .. } => MsgType::Text,
            MessageBody::Logout => MsgType::Logout,
            MessageBody::ListUsers => MsgType::ListUsers,
        }
    }
}

/// An immutable message exchanged between server and client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: SenderName,
    timestamp: DateTime<Utc>,
    body: MessageBody,
}

impl Message {
    /// Builds a message stamped with the current time.
    pub fn new(sender: SenderName, body: MessageBody) -> Self {
        Self {
            sender,
            timestamp: Utc::now(),
            body,
        }
    }

    pub fn text(sender: impl Into<String>, text: impl Into<String>) -> Result<Self, MessageError> {
        Ok(Self::new(
            SenderName::new(sender)?,
            MessageBody::Text { text: text.into() },
        ))
    }

    pub fn logout(sender: impl Into<String>) -> Result<Self, MessageError> {
        Ok(Self::new(SenderName::new(sender)?, MessageBody::Logout))
    }

    pub fn list_users(sender: impl Into<String>) -> Result<Self, MessageError> {
        Ok(Self::new(SenderName::new(sender)?, MessageBody::ListUsers))
    }

    pub fn sender(&self) -> &SenderName {
        &self.sender
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn msg_type(&self) -> MsgType {
        self.body.msg_type()
    }

    /// Text payload, present only on TEXT messages.
    pub fn text_payload(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { text } => Some(text),
            MessageBody::Logout | MessageBody::ListUsers => None,
        }
    }

    pub fn is_logout(&self) -> bool {
        matches!(self.body, MessageBody::Logout)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} at {}",
            self.msg_type(),
            self.sender,
            self.timestamp.to_rfc3339()
        )?;
        if let MessageBody::Text { text } = &self.body {
            write!(f, ": {text}")?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOut<'a> {
    msg_type: MsgType,
    sender_name: &'a str,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagProbe {
    msg_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIn {
    sender_name: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    text: Option<String>,
}

/// Serializes a message into one JSON object, without the line terminator.
pub fn encode(message: &Message) -> serde_json::Result<Vec<u8>> {
    let wire = WireOut {
        msg_type: message.msg_type(),
        sender_name: message.sender.as_str(),
        timestamp: message.timestamp,
        text: message.text_payload(),
    };
    serde_json::to_vec(&wire)
}

/// Parses one JSON object into a message.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    // The tag is resolved first so an unknown variant is reported as such
    // rather than as a generic parse failure.
    let probe: TagProbe = serde_json::from_slice(bytes)?;
    let msg_type: MsgType = probe.msg_type.parse()?;
    let wire: WireIn = serde_json::from_slice(bytes)?;

    let sender_name = wire
        .sender_name
        .ok_or(DecodeError::MissingField("senderName"))?;
    let sender = SenderName::new(sender_name).map_err(|_| DecodeError::EmptySender)?;
    let timestamp = wire
        .timestamp
        .ok_or(DecodeError::MissingField("timestamp"))?;

    let body = match msg_type {
        MsgType::Text => MessageBody::Text {
            text: wire.text.ok_or(DecodeError::MissingField("text"))?,
        },
        MsgType::Logout => MessageBody::Logout,
        MsgType::ListUsers => MessageBody::ListUsers,
    };

    Ok(Message {
        sender,
        timestamp,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_every_variant() {
        let messages = [
            Message::text("alice", "hi\nthere 'quoted'").unwrap(),
            Message::logout("alice").unwrap(),
            Message::list_users("bob").unwrap(),
        ];

        for message in messages {
            let decoded = decode(&encode(&message).unwrap()).expect("decode");
            assert_eq!(decoded, message);
            assert_eq!(decoded.timestamp(), message.timestamp());
        }
    }

    #[test]
    fn encoding_is_a_single_line() {
        let message = Message::text("alice", "line one\nline two").unwrap();
        let encoded = encode(&message).unwrap();
        assert!(!encoded.contains(&b'\n'));
    }

    #[test]
    fn encoding_carries_its_own_tag() {
        let encoded = encode(&Message::list_users("alice").unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(value["msgType"], "LISTUSERS");
        assert_eq!(value["senderName"], "alice");
        assert!(value.get("text").is_none());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = br#"{"msgType":"BROADCAST","senderName":"alice","timestamp":"2026-10-18T12:00:00Z"}"#;
        match decode(bytes) {
            Err(DecodeError::UnknownVariant { tag }) => assert_eq!(tag, "BROADCAST"),
            other => panic!("expected unknown variant, got {other:?}"),
        }
    }

    #[test]
    fn lowercase_tag_is_not_a_known_variant() {
        let bytes = br#"{"msgType":"text","senderName":"alice","timestamp":"2026-10-18T12:00:00Z","text":"hi"}"#;
        assert!(matches!(
            decode(bytes),
            Err(DecodeError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn text_without_payload_is_malformed() {
        let bytes = br#"{"msgType":"TEXT","senderName":"alice","timestamp":"2026-10-18T12:00:00Z"}"#;
        assert!(matches!(
            decode(bytes),
            Err(DecodeError::MissingField("text"))
        ));
    }

    #[test]
    fn missing_sender_and_timestamp_are_reported() {
        let no_sender = br#"{"msgType":"LOGOUT","timestamp":"2026-10-18T12:00:00Z"}"#;
        assert!(matches!(
            decode(no_sender),
            Err(DecodeError::MissingField("senderName"))
        ));

        let no_timestamp = br#"{"msgType":"LOGOUT","senderName":"alice"}"#;
        assert!(matches!(
            decode(no_timestamp),
            Err(DecodeError::MissingField("timestamp"))
        ));
    }

    #[test]
    fn empty_sender_on_the_wire_is_rejected() {
        let bytes = br#"{"msgType":"LOGOUT","senderName":"  ","timestamp":"2026-10-18T12:00:00Z"}"#;
        assert!(matches!(decode(bytes), Err(DecodeError::EmptySender)));
    }

    #[test]
    fn truncated_and_tagless_input_is_malformed() {
        assert!(matches!(
            decode(br#"{"msgType":"TEXT","sender"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode(br#"{"senderName":"alice"}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn non_string_tag_is_malformed() {
        let bytes = br#"{"msgType":5,"senderName":"alice","timestamp":"2026-10-18T12:00:00Z"}"#;
        assert!(matches!(decode(bytes), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn construction_rejects_empty_sender() {
        assert_eq!(Message::text("", "hi"), Err(MessageError::EmptySender));
        assert_eq!(Message::logout("   "), Err(MessageError::EmptySender));
    }

    #[test]
    fn msg_type_follows_the_variant() {
        assert_eq!(Message::logout("a").unwrap().msg_type(), MsgType::Logout);
        assert_eq!(Message::list_users("a").unwrap().msg_type(), MsgType::ListUsers);
        assert_eq!(Message::text("a", "x").unwrap().msg_type(), MsgType::Text);
    }

    #[test]
    fn display_includes_text_payload() {
        let message = Message::text("alice", "hi").unwrap();
        let rendered = message.to_string();
        assert!(rendered.starts_with("TEXT from alice at "));
        assert!(rendered.ends_with(": hi"));
        assert!(
            Message::logout("alice")
                .unwrap()
                .to_string()
                .starts_with("LOGOUT from alice at ")
        );
    }
}
