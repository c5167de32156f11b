//! Room membership port.
//!
//! Checked once per connection, after identity verification and before the
//! WebSocket upgrade. The check is fail-secure: an error rejects the
//! handshake just like a negative answer.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, RoomId, UserId};

/// Answers whether a user belongs to a room.
#[async_trait]
pub trait MembershipChecker: Send + Sync {
    /// Returns `Ok(true)` if `user_id` is a member of `room_id`.
    ///
    /// Returns `ErrorCode::GroupNotFound` when the room does not exist.
    async fn is_member(&self, user_id: &UserId, room_id: RoomId) -> Result<bool, DomainError>;
}
