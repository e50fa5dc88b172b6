//! Converts an `Authorization: Bearer <token>` header into a trusted
//! [`Principal`], or fails explicitly.
//!
//! Verification is a ladder of terminal outcomes: no header, malformed
//! header, implausibly short token, backend rejection, or success. The
//! gateway never trusts claims it decoded itself; only what the backend
//! session service confirms.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

use crate::auth::principal::{AuthContext, AuthOutcome, Principal};
use crate::backend::{BackendAuth, BackendError};
use crate::error::EdgeError;

/// Tokens shorter than this cannot be real session tokens.
const MIN_TOKEN_LEN: usize = 10;

/// Bearer-credential verifier backed by the platform's session service.
#[derive(Clone)]
pub struct AuthVerifier {
    backend: Arc<dyn BackendAuth>,
}

impl AuthVerifier {
    /// Creates a verifier over the given backend.
    pub fn new(backend: Arc<dyn BackendAuth>) -> Self {
        Self { backend }
    }

    /// Extracts the raw bearer token, enforcing header shape only.
    fn extract_token(headers: &HeaderMap) -> Result<&str, EdgeError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or(EdgeError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| EdgeError::InvalidAuthHeader)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(EdgeError::InvalidAuthHeader)?;

        if token.len() < MIN_TOKEN_LEN {
            return Err(EdgeError::InvalidToken);
        }
        Ok(token)
    }

    /// Resolves the request's bearer token to a verified [`Principal`].
    pub async fn verify(&self, headers: &HeaderMap) -> Result<Principal, EdgeError> {
        let token = Self::extract_token(headers)?;

        match self.backend.get_user(token).await {
            Ok(Some(user)) => Ok(Principal::from(user)),
            Ok(None) => Err(EdgeError::VerificationFailed {
                reason: "User not found or token expired".to_string(),
            }),
            Err(BackendError::Rejected { reason }) => Err(EdgeError::VerificationFailed {
                reason: format!("Authentication failed: {reason}"),
            }),
            Err(err) => {
                debug!(error = %err, "session verification unavailable");
                Err(EdgeError::VerificationFailed {
                    reason: "Failed to verify authentication token".to_string(),
                })
            }
        }
    }

    /// Verifies the caller and pairs the principal with a backend client
    /// scoped to their token.
    pub async fn require_auth(&self, headers: &HeaderMap) -> Result<AuthContext, EdgeError> {
        let principal = self.verify(headers).await?;
        // extract_token succeeded inside verify; re-borrow for the client
        let token = Self::extract_token(headers)?;
        Ok(AuthContext {
            principal,
            client: self.backend.scoped_client(token),
        })
    }

    /// Like [`require_auth`](Self::require_auth) but anonymous callers get
    /// `None` instead of an error.
    pub async fn optional_auth(&self, headers: &HeaderMap) -> Option<AuthContext> {
        self.require_auth(headers).await.ok()
    }

    /// Verifies the caller and additionally requires the profile's
    /// `is_admin` flag. A missing row or lookup failure denies access.
    pub async fn require_admin(&self, headers: &HeaderMap) -> Result<AuthContext, EdgeError> {
        let context = self.require_auth(headers).await?;

        match self.backend.is_admin(&context.principal.id).await {
            Ok(true) => Ok(context),
            Ok(false) => Err(EdgeError::AdminRequired),
            Err(err) => {
                debug!(error = %err, user = %context.principal.id, "admin lookup failed");
                Err(EdgeError::AdminRequired)
            }
        }
    }

    /// Three-way outcome for handlers that branch on anonymous versus
    /// authenticated versus under-privileged callers.
    pub async fn authorize(&self, headers: &HeaderMap, admin: bool) -> AuthOutcome {
        let result = if admin {
            self.require_admin(headers).await
        } else {
            self.require_auth(headers).await
        };

        match result {
            Ok(context) => AuthOutcome::Authenticated(context),
            Err(err @ (EdgeError::AdminRequired | EdgeError::Forbidden { .. })) => {
                AuthOutcome::Forbidden {
                    reason: err.public_message(),
                }
            }
            Err(err) => AuthOutcome::Unauthenticated {
                reason: err.public_message(),
            },
        }
    }
}
