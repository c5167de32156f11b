//! Authentication types for the domain layer.
//!
//! These types represent a user whose credential was verified before a
//! connection was admitted. Any identity provider can populate them via the
//! `IdentityVerifier` port.

use super::UserId;
use thiserror::Error;

/// User identity extracted from a verified credential.
///
/// This is the only source of the acting user id for chat events; client
/// payloads never supply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the identity provider.
    pub id: UserId,

    /// Display name if the credential carried one.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: UserId, display_name: Option<String>) -> Self {
        Self { id, display_name }
    }
}

/// Authentication errors that can occur during credential verification.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("Missing credential")]
    MissingCredential,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
