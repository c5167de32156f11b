//! HistoryStore port - Persistence of messages and message groups.
//!
//! The hub never talks to storage directly. Handlers go through this port,
//! which keeps wire and domain types decoupled from storage row shapes.

use async_trait::async_trait;

use crate::domain::chat::{Message, MsgGroup, MsgGroupMember, NewMessage};
use crate::domain::foundation::{DomainError, MessageId, RoomId, UserId};

/// Persistence for chat history.
///
/// # Contract
///
/// - `create_message` assigns the id and creation time and stores the
///   message as `active`.
/// - `delete_message` flips an `active` message to `deleted` only when the
///   id, group and sender all match, and returns the number of affected
///   rows. Zero means "nothing to delete"; it is not an error.
/// - Storage failures are reported as `ErrorCode::DatabaseError`.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a new message.
    async fn create_message(&self, message: NewMessage) -> Result<Message, DomainError>;

    /// Soft-delete a message sent by `sender_id` in `group_id`.
    async fn delete_message(
        &self,
        message_id: MessageId,
        group_id: RoomId,
        sender_id: &UserId,
    ) -> Result<u64, DomainError>;

    /// Look up a message group.
    async fn find_group(&self, group_id: RoomId) -> Result<Option<MsgGroup>, DomainError>;

    /// List the members of a message group.
    async fn get_group_members(&self, group_id: RoomId)
        -> Result<Vec<MsgGroupMember>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_store_trait_is_object_safe_and_send_sync() {
        fn _assert_trait_object(_: &dyn HistoryStore) {}
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<std::sync::Arc<dyn HistoryStore>>();
    }
}
