//! WebSocket event DTOs for the relay protocol.
//!
//! Every frame is a JSON text frame of the form `{"event": <name>, "data": <payload>}`.
//!
//! Client -> server: `addUser`, `sendMessage`.
//! Server -> client: `getUsers`, `getMessage`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MessageText, RelayMessage, Timestamp, UserId};

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Announce the user identity of this connection
    AddUser(String),
    /// Relay a chat message to another user
    SendMessage(SendMessagePayload),
}

impl ClientEvent {
    /// Decode a text frame.
    ///
    /// A frame that is not a JSON `{"event": <string>, ...}` object is
    /// `Malformed`. Unknown event names and payloads of the wrong shape are
    /// reported separately so the caller can skip them.
    pub fn from_frame(frame: &str) -> Result<Self, FrameError> {
        let envelope: Envelope = serde_json::from_str(frame).map_err(FrameError::Malformed)?;

        let decoded = match envelope.event.as_str() {
            "addUser" => serde_json::from_value(envelope.data).map(Self::AddUser),
            "sendMessage" => serde_json::from_value(envelope.data).map(Self::SendMessage),
            _ => return Err(FrameError::UnknownEvent(envelope.event)),
        };

        decoded.map_err(|source| FrameError::InvalidPayload {
            event: envelope.event,
            source,
        })
    }
}

/// Outer shape shared by every frame
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Errors raised while decoding a client frame
#[derive(Debug, Error)]
pub enum FrameError {
    /// Not a JSON event envelope
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Well-formed envelope with an event name this server does not handle
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    /// Known event whose `data` has the wrong shape
    #[error("invalid '{event}' payload: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FrameError {
    /// Whether the frame breaks the protocol envelope itself
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Payload of `sendMessage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
}

impl SendMessagePayload {
    /// Convert into a domain `RelayMessage` stamped with the receive time.
    pub fn into_relay_message(self, received_at: Timestamp) -> RelayMessage {
        RelayMessage::new(
            UserId::from(self.sender_id),
            UserId::from(self.receiver_id),
            MessageText::from(self.text),
            received_at,
        )
    }
}

/// Events pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Current roster, in announce order
    GetUsers(Vec<String>),
    /// A message relayed to this connection
    GetMessage(GetMessagePayload),
}

impl ServerEvent {
    /// Roster event from domain identities.
    pub fn roster(users: &[UserId]) -> Self {
        Self::GetUsers(users.iter().map(|u| u.as_str().to_string()).collect())
    }

    /// Relay event for the recipient of `message`.
    pub fn relayed(message: &RelayMessage) -> Self {
        Self::GetMessage(GetMessagePayload {
            sender_id: message.sender.as_str().to_string(),
            text: message.text.as_str().to_string(),
        })
    }

    /// Encode as a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Payload of `getMessage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessagePayload {
    pub sender_id: String,
    pub text: String,
}
