//! Identity provider boundary.
//!
//! # Responsibility
//! - Model the opaque identity handed over by the external auth flow.
//! - Expose token acquisition as a single request/response call instead of
//!   the callback-style popup flow of the hosting application.
//!
//! # Invariants
//! - The core never performs the authentication handshake itself.
//! - An expired or missing token is surfaced as `AuthError::Expired`; local
//!   operations continue unaffected.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque bearer token for remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

/// Signed-in identity as supplied by the external auth flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Identity key used to namespace local storage (for example an email).
    pub key: String,
}

/// Token acquisition failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Credential is missing or expired; the caller must re-run the
    /// external authentication flow.
    Expired,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "access token is missing or expired"),
        }
    }
}

impl Error for AuthError {}

/// Access point to the external authentication flow.
pub trait IdentityProvider {
    /// Returns the signed-in identity, or `None` before first sign-in.
    fn identity(&self) -> Option<Identity>;

    /// Returns a currently valid access token.
    ///
    /// # Errors
    /// - `AuthError::Expired` when no valid credential is available. The
    ///   caller is expected to force re-authentication rather than retry.
    fn acquire_token(&self) -> Result<AccessToken, AuthError>;
}
