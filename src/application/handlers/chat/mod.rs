//! Chat event handlers.
//!
//! Every handler follows the same steps:
//! 1. Look up the current room members; an empty room is a silent no-op
//!    (the requester raced with its own teardown)
//! 2. Decode the event payload; a malformed payload fails only this event
//! 3. Take the acting user from the connection's verified identity
//! 4. Call the history store if needed, then fan out or reply
//!
//! Business failures go to the requester as one status-coded event and are
//! never broadcast.

mod create_message;
mod delete_message;
mod reminder;
mod typing;

pub use create_message::{CreateMessageHandler, CreateMessagePayload};
pub use delete_message::{DeleteMessageHandler, DeleteMessagePayload, MessageDeletedPayload};
pub use reminder::{ReminderCreateHandler, ReminderUpdateStatusHandler};
pub use typing::{TypingHandler, TypingPayload};

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::hub::{
    Connection, ErrorPayload, EventRouter, EventType, GroupRegistry, HubError, OutgoingPump,
};
use crate::ports::HistoryStore;

/// Dependencies shared by the chat handlers.
#[derive(Clone)]
pub struct ChatContext {
    pub registry: Arc<GroupRegistry>,
    pub pump: OutgoingPump,
    pub history: Arc<dyn HistoryStore>,
    pub max_message_length: usize,
}

impl ChatContext {
    /// Report a business failure to the requester only.
    pub(crate) async fn reply_error(
        &self,
        conn: &Arc<Connection>,
        event_type: EventType,
        error: &DomainError,
    ) -> Result<(), HubError> {
        self.pump
            .send_to(
                conn,
                event_type,
                error.code().status_code(),
                ErrorPayload::from_domain(error).into_value(),
            )
            .await
    }
}

/// Register every chat handler with the router.
pub fn register_chat_handlers(router: &mut EventRouter, ctx: ChatContext) {
    router.register(
        EventType::ChatCreateMessage.as_str(),
        Arc::new(CreateMessageHandler::new(ctx.clone())),
    );
    router.register(
        EventType::ChatDeleteMessage.as_str(),
        Arc::new(DeleteMessageHandler::new(ctx.clone())),
    );
    router.register(
        EventType::ChatTyping.as_str(),
        Arc::new(TypingHandler::new(ctx.clone())),
    );
    router.register(
        EventType::ReminderCreate.as_str(),
        Arc::new(ReminderCreateHandler::new(ctx.clone())),
    );
    router.register(
        EventType::ReminderUpdateStatus.as_str(),
        Arc::new(ReminderUpdateStatusHandler::new(ctx)),
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::chat::{Message, MessageStatus, MsgGroup, MsgGroupMember, NewMessage};
    use crate::domain::foundation::{MessageId, RoomId, Timestamp, UserId};

    /// History store double that records calls.
    #[derive(Default)]
    pub struct MockHistoryStore {
        pub messages: Mutex<Vec<Message>>,
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl MockHistoryStore {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn with_message(message: Message) -> Self {
            Self {
                messages: Mutex::new(vec![message]),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HistoryStore for MockHistoryStore {
        async fn create_message(&self, message: NewMessage) -> Result<Message, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::database("Failed to insert message", "boom"));
            }
            let mut messages = self.messages.lock().unwrap();
            let stored = Message {
                id: MessageId::new(messages.len() as i64 + 1),
                group_id: message.group_id,
                sender_id: message.sender_id,
                content: message.content,
                status: MessageStatus::Active,
                created_at: Timestamp::now(),
            };
            messages.push(stored.clone());
            Ok(stored)
        }

        async fn delete_message(
            &self,
            message_id: MessageId,
            group_id: RoomId,
            sender_id: &UserId,
        ) -> Result<u64, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::database("Failed to delete message", "boom"));
            }
            let mut messages = self.messages.lock().unwrap();
            let mut affected = 0;
            for m in messages.iter_mut().filter(|m| {
                m.id == message_id
                    && m.group_id == group_id
                    && &m.sender_id == sender_id
                    && m.status == MessageStatus::Active
            }) {
                m.status = MessageStatus::Deleted;
                affected += 1;
            }
            Ok(affected)
        }

        async fn find_group(&self, _group_id: RoomId) -> Result<Option<MsgGroup>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn get_group_members(
            &self,
            _group_id: RoomId,
        ) -> Result<Vec<MsgGroupMember>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    pub fn context(history: Arc<dyn HistoryStore>) -> ChatContext {
        let registry = Arc::new(GroupRegistry::new());
        ChatContext {
            pump: OutgoingPump::new(registry.clone(), 256, Duration::from_secs(10)),
            registry,
            history,
            max_message_length: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{context, MockHistoryStore};
    use super::*;

    #[test]
    fn register_chat_handlers_covers_every_event_type() {
        let ctx = context(Arc::new(MockHistoryStore::default()));
        let mut router = EventRouter::new();

        register_chat_handlers(&mut router, ctx);

        for event_type in EventType::ALL {
            assert!(router.is_registered(event_type.as_str()), "{}", event_type);
        }
    }
}
