//! Message groups (rooms) and their members.

use crate::domain::foundation::{RoomId, Timestamp, UserId};

/// A persisted message group. Its id is the hub's room id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgGroup {
    pub id: RoomId,
    pub name: String,
    pub created_at: Timestamp,
}

/// Membership of one user in one message group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgGroupMember {
    pub group_id: RoomId,
    pub user_id: UserId,
    pub joined_at: Timestamp,
}
