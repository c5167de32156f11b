//! Application layer - Chat event handlers.
//!
//! This layer turns inbound hub events into history store calls and
//! outgoing events. It depends on ports and the hub, never on adapters.

pub mod handlers;

pub use handlers::chat::{
    register_chat_handlers, ChatContext, CreateMessageHandler, DeleteMessageHandler,
    ReminderCreateHandler, ReminderUpdateStatusHandler, TypingHandler,
};

use std::sync::Arc;

use crate::config::HubConfig;
use crate::hub::{ChatHub, EventRouter, GroupRegistry, OutgoingPump};
use crate::ports::HistoryStore;

/// Wire a hub with every chat handler registered.
pub fn build_chat_hub(history: Arc<dyn HistoryStore>, config: &HubConfig) -> ChatHub {
    let registry = Arc::new(GroupRegistry::new());
    let pump = OutgoingPump::new(
        registry.clone(),
        config.queue_capacity,
        config.keepalive_interval(),
    );

    let mut router = EventRouter::new();
    register_chat_handlers(
        &mut router,
        ChatContext {
            registry: registry.clone(),
            pump: pump.clone(),
            history,
            max_message_length: config.max_message_length,
        },
    );

    ChatHub::new(registry, router, pump)
}
