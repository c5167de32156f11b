//! JWT adapter for handshake credential verification.
//!
//! Verifies HS256 tokens signed with a shared secret:
//!
//! 1. Validates the signature against the configured secret
//! 2. Validates expiry, and issuer/audience when configured
//! 3. Maps the `sub` claim to the domain `UserId`
//!
//! # Example
//!
//! ```ignore
//! use chat_hub::adapters::auth::{JwtConfig, JwtIdentityVerifier};
//! use chat_hub::ports::IdentityVerifier;
//!
//! let verifier = JwtIdentityVerifier::new(JwtConfig::new(secret));
//! let user = verifier.verify_identity("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::IdentityVerifier;

/// Settings for the JWT adapter.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 shared secret
    pub secret: Secret<String>,

    /// Expected `iss` claim. Not checked when `None`.
    pub issuer: Option<String>,

    /// Expected `aud` claim. Not checked when `None`.
    pub audience: Option<String>,
}

impl JwtConfig {
    /// Create a configuration that checks only signature and expiry.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Secret::new(secret.into()),
            issuer: None,
            audience: None,
        }
    }

    /// Require a specific issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require a specific audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }
}

/// Claims read from handshake tokens.
#[derive(Debug, Serialize, Deserialize)]
struct ChatClaims {
    /// Subject - the user ID
    sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    exp: i64,

    /// Display name
    #[serde(default)]
    name: Option<String>,
}

/// Shared-secret JWT identity verifier.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key,
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify_identity(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let token_data =
            decode::<ChatClaims>(credential, &self.decoding_key, &self.validation).map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer => {
                        tracing::warn!("Invalid issuer in token");
                        AuthError::InvalidToken
                    }
                    ErrorKind::InvalidAudience => {
                        tracing::warn!("Invalid audience in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::debug!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })?;
        let claims = token_data.claims;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Token has empty subject");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, claims.name))
    }
}

impl std::fmt::Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityVerifier")
            .field("issuer", &self.validation.iss)
            .field("audience", &self.validation.aud)
            .finish_non_exhaustive()
    }
}
