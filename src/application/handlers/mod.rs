//! Application handlers.
//!
//! One handler per inbound event type, registered with the hub's router.

pub mod chat;
