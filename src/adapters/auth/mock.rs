//! Mock identity verifier for testing.
//!
//! Implements the `IdentityVerifier` port without real tokens.
//!
//! # Example
//!
//! ```ignore
//! use chat_hub::adapters::auth::MockIdentityVerifier;
//!
//! let verifier = MockIdentityVerifier::new().with_test_user("alice-token", "alice");
//! let user = verifier.verify_identity("alice-token").await?;
//! assert_eq!(user.id.as_str(), "alice");
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::IdentityVerifier;

/// Mock identity verifier.
///
/// Stores a map of tokens to users. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockIdentityVerifier {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Returned for every verification while set
    force_error: RwLock<Option<AuthError>>,
}

impl MockIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a user.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a valid token for a user with no display name.
    pub fn with_test_user(self, token: impl Into<String>, user_id: UserId) -> Self {
        self.with_user(token, AuthenticatedUser::new(user_id, None))
    }

    /// Forces all verifications to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *self
            .force_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }

    /// Registers a new valid token at runtime.
    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), user);
    }

    /// Removes a token, making it invalid.
    pub fn remove_token(&self, token: &str) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify_identity(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error);
        }
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(credential)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
