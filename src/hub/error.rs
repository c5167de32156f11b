//! Hub error taxonomy.

use thiserror::Error;

use crate::domain::foundation::ConnectionId;

/// Errors raised while moving frames through the hub.
///
/// Business failures (not found, persistence failure, validation) are not
/// represented here: handlers report them to the requester as status-coded
/// events and return `Ok`.
#[derive(Debug, Error)]
pub enum HubError {
    /// Reading from or writing to a socket failed.
    #[error("Transport error on connection {connection_id}: {message}")]
    Transport {
        connection_id: ConnectionId,
        message: String,
    },

    /// The connection was already torn down.
    #[error("Connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    /// The inbound frame is not a valid envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope was valid but its payload does not fit the event type.
    #[error("Malformed payload for {event_type}: {reason}")]
    MalformedPayload { event_type: String, reason: String },

    /// No handler is registered for the event type.
    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),

    /// An outgoing event could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The shared outgoing queue is gone.
    #[error("Outgoing queue closed")]
    QueueClosed,
}

impl HubError {
    /// Creates a transport error for a connection.
    pub fn transport(connection_id: ConnectionId, source: impl std::fmt::Display) -> Self {
        HubError::Transport {
            connection_id,
            message: source.to_string(),
        }
    }

    /// Creates a malformed payload error.
    pub fn malformed_payload(
        event_type: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        HubError::MalformedPayload {
            event_type: event_type.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the connection that hit this error must be torn down.
    ///
    /// Protocol errors only drop the offending frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HubError::Transport { .. } | HubError::ConnectionClosed(_) | HubError::QueueClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_queue_errors_are_fatal() {
        assert!(HubError::transport(ConnectionId::new(), "broken pipe").is_fatal());
        assert!(HubError::ConnectionClosed(ConnectionId::new()).is_fatal());
        assert!(HubError::QueueClosed.is_fatal());
    }

    #[test]
    fn protocol_errors_are_not_fatal() {
        assert!(!HubError::UnsupportedEvent("NOPE".to_string()).is_fatal());
        assert!(!HubError::MalformedEnvelope("eof".to_string()).is_fatal());
        assert!(!HubError::malformed_payload("CHAT_TYPING", "bad").is_fatal());
    }

    #[test]
    fn unsupported_event_displays_type() {
        let err = HubError::UnsupportedEvent("CHAT_EDIT".to_string());
        assert_eq!(err.to_string(), "Unsupported event type: CHAT_EDIT");
    }
}
