//! Domain layer containing chat types and shared primitives.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `chat` - Messages, message groups and group members

pub mod chat;
pub mod foundation;
