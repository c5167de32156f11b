//! Wire envelopes and internal event types.
//!
//! Defines the protocol between server and connected clients:
//! - Client → Server: `{ "type": <EventType>, "payload": <json> }`
//! - Server → Client: `{ "type": <EventType>, "status": <code>, "payload": <json | null> }`

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::ws::Message;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode, RoomId};

use super::connection::Connection;
use super::error::HubError;

// ============================================
// Event Types
// ============================================

/// Event types understood by the chat hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ChatCreateMessage,
    ChatDeleteMessage,
    ChatTyping,
    ReminderCreate,
    ReminderUpdateStatus,
}

impl EventType {
    /// Every event type, in registration order.
    pub const ALL: [EventType; 5] = [
        EventType::ChatCreateMessage,
        EventType::ChatDeleteMessage,
        EventType::ChatTyping,
        EventType::ReminderCreate,
        EventType::ReminderUpdateStatus,
    ];

    /// The tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ChatCreateMessage => "CHAT_CREATE_MESSAGE",
            EventType::ChatDeleteMessage => "CHAT_DELETE_MESSAGE",
            EventType::ChatTyping => "CHAT_TYPING",
            EventType::ReminderCreate => "REMINDER_CREATE",
            EventType::ReminderUpdateStatus => "REMINDER_UPDATE_STATUS",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| HubError::UnsupportedEvent(s.to_string()))
    }
}

// ============================================
// Client → Server
// ============================================

/// Envelope of every inbound text frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl ClientEnvelope {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, HubError> {
        serde_json::from_str(text).map_err(|e| HubError::MalformedEnvelope(e.to_string()))
    }
}

/// A parsed inbound event.
///
/// `room_id` always comes from the authenticated connection, never from the
/// client.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub event_type: String,
    pub room_id: RoomId,
    pub payload: Value,
}

impl IncomingEvent {
    /// Bind an envelope to the room of the connection it arrived on.
    pub fn from_envelope(envelope: ClientEnvelope, room_id: RoomId) -> Self {
        Self {
            event_type: envelope.event_type,
            room_id,
            payload: envelope.payload,
        }
    }

    /// Decode the event-specific payload.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, HubError> {
        T::deserialize(&self.payload)
            .map_err(|e| HubError::malformed_payload(self.event_type.clone(), e))
    }
}

// ============================================
// Server → Client
// ============================================

/// Envelope of every outbound text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEnvelope {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: u16,
    pub payload: Value,
}

/// Payload of a status-coded business error sent to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ErrorPayload {
    /// Build the client-facing error for a domain failure.
    ///
    /// Storage details stay in the logs.
    pub fn from_domain(error: &DomainError) -> Self {
        let message = match error.code() {
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                "Internal server error".to_string()
            }
            _ => error.message.clone(),
        };
        Self {
            code: error.code().to_string(),
            message,
        }
    }

    /// Serialize into an event payload.
    pub fn into_value(self) -> Value {
        serde_json::json!({ "code": self.code, "message": self.message })
    }
}

/// An event addressed to exactly one connection.
///
/// A broadcast is realized as one `OutgoingEvent` per room member.
#[derive(Debug, Clone)]
pub struct OutgoingEvent {
    pub target: Arc<Connection>,
    pub event_type: EventType,
    pub status: StatusCode,
    pub payload: Value,
}

impl OutgoingEvent {
    /// Creates a new addressed event.
    pub fn new(
        target: Arc<Connection>,
        event_type: EventType,
        status: StatusCode,
        payload: Value,
    ) -> Self {
        Self {
            target,
            event_type,
            status,
            payload,
        }
    }

    /// The envelope sent on the wire.
    pub fn to_envelope(&self) -> ServerEnvelope {
        ServerEnvelope {
            event_type: self.event_type,
            status: self.status.as_u16(),
            payload: self.payload.clone(),
        }
    }

    /// Serialize into a text frame.
    pub fn to_frame(&self) -> Result<Message, HubError> {
        let json = serde_json::to_string(&self.to_envelope())
            .map_err(|e| HubError::Serialization(e.to_string()))?;
        Ok(Message::Text(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::test_support::channel_connection;

    #[test]
    fn event_type_serializes_to_wire_tag() {
        for event_type in EventType::ALL {
            let json = serde_json::to_string(&event_type).unwrap();
            assert_eq!(json, format!("\"{}\"", event_type.as_str()));
        }
    }

    #[test]
    fn event_type_parses_known_tags_only() {
        assert_eq!(
            "CHAT_TYPING".parse::<EventType>().unwrap(),
            EventType::ChatTyping
        );
        assert!(matches!(
            "CHAT_EDIT".parse::<EventType>(),
            Err(HubError::UnsupportedEvent(_))
        ));
    }

    #[test]
    fn client_envelope_parses_type_and_payload() {
        let envelope =
            ClientEnvelope::parse(r#"{"type":"CHAT_CREATE_MESSAGE","payload":{"content":"hi"}}"#)
                .unwrap();
        assert_eq!(envelope.event_type, "CHAT_CREATE_MESSAGE");
        assert_eq!(envelope.payload["content"], "hi");
    }

    #[test]
    fn client_envelope_payload_defaults_to_null() {
        let envelope = ClientEnvelope::parse(r#"{"type":"CHAT_TYPING"}"#).unwrap();
        assert!(envelope.payload.is_null());
    }

    #[test]
    fn client_envelope_rejects_garbage() {
        assert!(matches!(
            ClientEnvelope::parse("not json"),
            Err(HubError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            ClientEnvelope::parse(r#"{"payload":{}}"#),
            Err(HubError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn client_supplied_room_id_is_ignored() {
        let envelope =
            ClientEnvelope::parse(r#"{"type":"CHAT_TYPING","roomId":99,"payload":null}"#).unwrap();
        let event = IncomingEvent::from_envelope(envelope, RoomId::new(1));
        assert_eq!(event.room_id, RoomId::new(1));
    }

    #[test]
    fn decode_payload_reports_event_type() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            content: String,
        }

        let event = IncomingEvent {
            event_type: "CHAT_CREATE_MESSAGE".to_string(),
            room_id: RoomId::new(1),
            payload: serde_json::json!({"wrong": 1}),
        };

        match event.decode_payload::<Needs>() {
            Err(HubError::MalformedPayload { event_type, .. }) => {
                assert_eq!(event_type, "CHAT_CREATE_MESSAGE")
            }
            other => panic!("expected MalformedPayload, got {:?}", other),
        }
    }

    #[test]
    fn outgoing_event_serializes_envelope() {
        let (conn, _rx) = channel_connection("user-1", 1);
        let event = OutgoingEvent::new(
            conn,
            EventType::ChatDeleteMessage,
            StatusCode::NOT_FOUND,
            Value::Null,
        );

        let Message::Text(text) = event.to_frame().unwrap() else {
            panic!("expected text frame");
        };
        let envelope: ServerEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope.event_type, EventType::ChatDeleteMessage);
        assert_eq!(envelope.status, 404);
        assert!(envelope.payload.is_null());
    }

    #[test]
    fn error_payload_hides_storage_details() {
        let err = DomainError::database("Failed to insert message", "connection reset");
        let payload = ErrorPayload::from_domain(&err);
        assert_eq!(payload.code, "DATABASE_ERROR");
        assert_eq!(payload.message, "Internal server error");

        let err = DomainError::new(ErrorCode::ValidationFailed, "Field 'content' cannot be empty");
        assert_eq!(
            ErrorPayload::from_domain(&err).message,
            "Field 'content' cannot be empty"
        );
    }
}
