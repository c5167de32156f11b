//! In-memory `HistoryStore`.
//!
//! Holds groups, members and messages in process memory. Message ids are
//! assigned sequentially starting at 1.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::chat::{Message, MessageStatus, MsgGroup, MsgGroupMember, NewMessage};
use crate::domain::foundation::{DomainError, MessageId, RoomId, Timestamp, UserId};
use crate::ports::HistoryStore;

#[derive(Debug, Default)]
struct State {
    groups: HashMap<RoomId, MsgGroup>,
    members: HashMap<RoomId, Vec<MsgGroupMember>>,
    messages: Vec<Message>,
}

/// `HistoryStore` backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    state: Mutex<State>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a group.
    pub fn add_group(&self, group_id: RoomId, name: impl Into<String>) {
        self.state().groups.insert(
            group_id,
            MsgGroup {
                id: group_id,
                name: name.into(),
                created_at: Timestamp::now(),
            },
        );
    }

    /// Add a user to a group. Adding the same user twice is a no-op.
    pub fn add_member(&self, group_id: RoomId, user_id: UserId) {
        let mut state = self.state();
        let members = state.members.entry(group_id).or_default();
        if members.iter().all(|m| m.user_id != user_id) {
            members.push(MsgGroupMember {
                group_id,
                user_id,
                joined_at: Timestamp::now(),
            });
        }
    }

    /// Snapshot of a stored message.
    pub fn message(&self, message_id: MessageId) -> Option<Message> {
        self.state()
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    /// Number of stored messages, deleted ones included.
    pub fn message_count(&self) -> usize {
        self.state().messages.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn create_message(&self, message: NewMessage) -> Result<Message, DomainError> {
        let mut state = self.state();
        let stored = Message {
            id: MessageId::new(state.messages.len() as i64 + 1),
            group_id: message.group_id,
            sender_id: message.sender_id,
            content: message.content,
            status: MessageStatus::Active,
            created_at: Timestamp::now(),
        };
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn delete_message(
        &self,
        message_id: MessageId,
        group_id: RoomId,
        sender_id: &UserId,
    ) -> Result<u64, DomainError> {
        let mut state = self.state();
        let mut affected = 0;
        for message in state.messages.iter_mut().filter(|m| {
            m.id == message_id
                && m.group_id == group_id
                && &m.sender_id == sender_id
                && m.status == MessageStatus::Active
        }) {
            message.status = MessageStatus::Deleted;
            affected += 1;
        }
        Ok(affected)
    }

    async fn find_group(&self, group_id: RoomId) -> Result<Option<MsgGroup>, DomainError> {
        Ok(self.state().groups.get(&group_id).cloned())
    }

    async fn get_group_members(&self, group_id: RoomId) -> Result<Vec<MsgGroupMember>, DomainError> {
        Ok(self
            .state()
            .members
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn new_message(sender: &str, content: &str) -> NewMessage {
        NewMessage::new(RoomId::new(1), user(sender), content, 100).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_active_status() {
        let store = InMemoryHistoryStore::new();

        let first = store.create_message(new_message("alice", "one")).await.unwrap();
        let second = store.create_message(new_message("bob", "two")).await.unwrap();

        assert_eq!(first.id, MessageId::new(1));
        assert_eq!(second.id, MessageId::new(2));
        assert_eq!(first.status, MessageStatus::Active);
        assert_eq!(store.message_count(), 2);
    }

    #[tokio::test]
    async fn delete_flips_status_once() {
        let store = InMemoryHistoryStore::new();
        let message = store.create_message(new_message("alice", "hi")).await.unwrap();

        let first = store
            .delete_message(message.id, RoomId::new(1), &user("alice"))
            .await
            .unwrap();
        let second = store
            .delete_message(message.id, RoomId::new(1), &user("alice"))
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(
            store.message(message.id).unwrap().status,
            MessageStatus::Deleted
        );
    }

    #[tokio::test]
    async fn delete_is_scoped_to_room_and_sender() {
        let store = InMemoryHistoryStore::new();
        let message = store.create_message(new_message("alice", "hi")).await.unwrap();

        let other_sender = store
            .delete_message(message.id, RoomId::new(1), &user("bob"))
            .await
            .unwrap();
        let other_room = store
            .delete_message(message.id, RoomId::new(2), &user("alice"))
            .await
            .unwrap();

        assert_eq!(other_sender, 0);
        assert_eq!(other_room, 0);
    }

    #[tokio::test]
    async fn members_are_deduplicated() {
        let store = InMemoryHistoryStore::new();
        store.add_group(RoomId::new(1), "general");
        store.add_member(RoomId::new(1), user("alice"));
        store.add_member(RoomId::new(1), user("alice"));

        let members = store.get_group_members(RoomId::new(1)).await.unwrap();

        assert_eq!(members.len(), 1);
        assert!(store.get_group_members(RoomId::new(9)).await.unwrap().is_empty());
    }
}
