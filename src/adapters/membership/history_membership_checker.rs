//! Membership checks backed by the history store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, RoomId, UserId};
use crate::ports::{HistoryStore, MembershipChecker};

/// `MembershipChecker` that reads group membership from the `HistoryStore`.
#[derive(Clone)]
pub struct HistoryMembershipChecker {
    history: Arc<dyn HistoryStore>,
}

impl HistoryMembershipChecker {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }
}

#[async_trait]
impl MembershipChecker for HistoryMembershipChecker {
    async fn is_member(&self, user_id: &UserId, room_id: RoomId) -> Result<bool, DomainError> {
        if self.history.find_group(room_id).await?.is_none() {
            return Err(DomainError::new(
                ErrorCode::GroupNotFound,
                format!("Group {} not found", room_id),
            ));
        }

        let members = self.history.get_group_members(room_id).await?;
        Ok(members.iter().any(|m| &m.user_id == user_id))
    }
}
