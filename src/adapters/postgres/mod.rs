//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresHistoryStore` - Messages, groups and group members

mod history_store;

pub use history_store::PostgresHistoryStore;
