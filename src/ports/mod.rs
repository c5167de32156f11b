//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the hub and the outside world. Adapters implement these ports.
//!
//! - `HistoryStore` - Message and group persistence
//! - `IdentityVerifier` - Credential verification at handshake time
//! - `MembershipChecker` - Room membership check at handshake time

mod history_store;
mod identity_verifier;
mod membership_checker;

pub use history_store::HistoryStore;
pub use identity_verifier::IdentityVerifier;
pub use membership_checker::MembershipChecker;
