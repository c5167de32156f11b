//! Chat domain module.
//!
//! Messages and message groups as persisted by the history store. A
//! message's status is a two-state flag (`active` → `deleted`); the flip is
//! enforced by the store, never re-validated in the hub.

mod group;
mod message;

pub use group::{MsgGroup, MsgGroupMember};
pub use message::{Message, MessageStatus, MessageView, NewMessage};
