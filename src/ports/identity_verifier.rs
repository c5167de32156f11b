//! Identity verification port.
//!
//! Consumed once per connection, before the WebSocket upgrade. The user
//! returned here is the only source of the acting user id for every event
//! the connection sends afterwards.
//!
//! # Example
//!
//! ```ignore
//! let user = verifier.verify_identity(token).await?;
//! tracing::debug!(user_id = %user.id, "credential accepted");
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Verifies a client credential and extracts the user identity.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for malformed or badly signed credentials
/// - Return `AuthError::TokenExpired` for expired credentials
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a raw credential (without any "Bearer " prefix).
    async fn verify_identity(&self, credential: &str) -> Result<AuthenticatedUser, AuthError>;
}
