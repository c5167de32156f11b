//! Adapters - Implementations of port interfaces and the service's HTTP surface.
//!
//! - `auth` - `IdentityVerifier` implementations (JWT, mock)
//! - `membership` - `MembershipChecker` on top of the history store
//! - `memory` - In-memory `HistoryStore`
//! - `postgres` - PostgreSQL `HistoryStore`
//! - `websocket` - Handshake and upgrade into the hub
//! - `http` - Application router and health route

pub mod auth;
pub mod http;
pub mod membership;
pub mod memory;
pub mod postgres;
pub mod websocket;

pub use auth::{JwtConfig, JwtIdentityVerifier, MockIdentityVerifier};
pub use http::app_router;
pub use membership::HistoryMembershipChecker;
pub use memory::InMemoryHistoryStore;
pub use postgres::PostgresHistoryStore;
pub use websocket::{websocket_router, WebSocketState};
