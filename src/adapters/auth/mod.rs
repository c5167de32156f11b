//! Authentication adapters.
//!
//! Implementations of the `IdentityVerifier` port:
//!
//! - `jwt` - HS256 shared-secret token verification
//! - `mock` - Test implementation that doesn't require real tokens

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtIdentityVerifier};
pub use mock::MockIdentityVerifier;
