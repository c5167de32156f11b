//! Event router: maps an event-type tag to its handler.
//!
//! The handler table is string keyed so new event types can be registered
//! without touching the router. It is built once at startup and shared
//! read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::connection::Connection;
use super::error::HubError;
use super::events::IncomingEvent;

/// Business logic for one inbound event type.
///
/// Handlers report business failures to the requester themselves and
/// return `Ok`. An `Err` is logged by the caller; only fatal errors (see
/// [`HubError::is_fatal`]) close the connection.
#[async_trait]
pub trait ChatEventHandler: Send + Sync {
    /// Process one event sent on `conn`.
    async fn handle(&self, event: IncomingEvent, conn: Arc<Connection>) -> Result<(), HubError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Dispatch table from event type to handler.
#[derive(Default)]
pub struct EventRouter {
    handlers: HashMap<String, Arc<dyn ChatEventHandler>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for an event type, replacing any previous one.
    pub fn register(&mut self, event_type: impl Into<String>, handler: Arc<dyn ChatEventHandler>) {
        let event_type = event_type.into();
        if let Some(previous) = self.handlers.insert(event_type.clone(), handler) {
            tracing::warn!(
                event_type = %event_type,
                replaced = previous.name(),
                "Event handler replaced"
            );
        }
    }

    /// Route an event to its handler.
    ///
    /// Returns `HubError::UnsupportedEvent` if no handler is registered.
    pub async fn route(&self, event: IncomingEvent, conn: Arc<Connection>) -> Result<(), HubError> {
        let handler = self
            .handlers
            .get(&event.event_type)
            .cloned()
            .ok_or_else(|| HubError::UnsupportedEvent(event.event_type.clone()))?;

        tracing::trace!(
            connection_id = %conn.id(),
            event_type = %event.event_type,
            handler = handler.name(),
            "Routing event"
        );
        handler.handle(event, conn).await
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Registered event types (for diagnostics).
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}
