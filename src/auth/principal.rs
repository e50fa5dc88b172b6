//! Request-scoped identity types.

use crate::backend::{ScopedClient, VerifiedUser};

/// An authenticated caller, built only from a credential the backend has
/// independently verified. Lives for one request, never mutated.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Opaque unique user identifier
    pub id: String,
    /// Email, when the account has one
    pub email: Option<String>,
    /// Role claim, when present
    pub role: Option<String>,
    /// Audience claim, `"authenticated"` when the backend omits it
    pub audience: String,
}

impl From<VerifiedUser> for Principal {
    fn from(user: VerifiedUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            audience: user.aud.unwrap_or_else(|| "authenticated".to_string()),
        }
    }
}

/// Verified principal plus a backend client scoped to the caller's token.
#[derive(Debug)]
pub struct AuthContext {
    /// The verified caller
    pub principal: Principal,
    /// Backend client carrying the caller's bearer token; queries through it
    /// run under the backend's row-level authorization
    pub client: ScopedClient,
}

/// Three-way authorization outcome.
///
/// A sum type instead of boolean flags so call sites must handle anonymous
/// and insufficient-privilege callers explicitly.
pub enum AuthOutcome {
    /// Credential verified; context available
    Authenticated(AuthContext),
    /// No usable credential
    Unauthenticated {
        /// Why the credential was rejected
        reason: String,
    },
    /// Verified credential without the required privilege
    Forbidden {
        /// Why access was denied
        reason: String,
    },
}
