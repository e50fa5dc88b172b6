//! Error handling module with type-safe, non-exhaustive error types
//!
//! Every component-level failure is translated to an HTTP response at the
//! handler boundary; no raw error ever reaches a caller. Internal detail is
//! logged with a correlation ID and replaced by a generic message on the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Non-exhaustive error enum for forward compatibility
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EdgeError {
    /// Authorization header was not provided
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// Authorization header does not use the Bearer scheme
    #[error("Invalid Authorization header format. Expected: Bearer <token>")]
    InvalidAuthHeader,

    /// Bearer token is empty or implausibly short
    #[error("Invalid token format")]
    InvalidToken,

    /// The backend session service rejected the token
    #[error("{reason}")]
    VerificationFailed {
        /// Reason reported by the session service, or the fixed
        /// "User not found or token expired" when no user came back
        reason: String,
    },

    /// Authenticated but not an admin
    #[error("Admin access required")]
    AdminRequired,

    /// Authenticated but not permitted to access the resource
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Description of the ownership or privilege mismatch
        reason: String,
    },

    /// Rate limit exceeded for the client's window
    #[error("Rate limit exceeded")]
    RateLimited {
        /// When the client can retry
        retry_after: Duration,
        /// Ceiling for the window
        limit: u32,
        /// Epoch-millis timestamp at which the window resets
        reset_at: i64,
    },

    /// Missing or malformed request parameters
    #[error("{reason}")]
    Validation {
        /// Description of the invalid input
        reason: String,
    },

    /// A third-party data source failed or returned malformed data
    #[error("Upstream provider {provider} failed: {reason}")]
    Upstream {
        /// Name of the failing provider
        provider: String,
        /// Description of the failure
        reason: String,
    },

    /// Internal error (details sanitized in responses)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Error kind labels used in the JSON error body and in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401 - missing/malformed/expired/invalid credential
    Authentication,
    /// 403 - valid credential, insufficient privilege
    Authorization,
    /// 429 - quota exhausted for the window
    RateLimit,
    /// 400 - missing/malformed request parameters
    Validation,
    /// Upstream data source failure (recovered locally where possible)
    Upstream,
    /// 500 - unexpected failure, generic message on the wire
    Internal,
}

impl ErrorKind {
    /// String label for response bodies and metric dimensions
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "AuthenticationError",
            Self::Authorization => "AuthorizationError",
            Self::RateLimit => "RateLimitError",
            Self::Validation => "ValidationError",
            Self::Upstream => "UpstreamProviderError",
            Self::Internal => "InternalError",
        }
    }
}

/// JSON body for auth-style error responses: `{ error, message, statusCode }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error kind label
    pub error: &'static str,
    /// Human-readable message (sanitized)
    pub message: String,
    /// HTTP status code, duplicated in the body for browser clients
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl EdgeError {
    /// Error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAuthHeader
            | Self::InvalidAuthHeader
            | Self::InvalidToken
            | Self::VerificationFailed { .. } => ErrorKind::Authentication,
            Self::AdminRequired | Self::Forbidden { .. } => ErrorKind::Authorization,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthHeader
            | Self::InvalidAuthHeader
            | Self::InvalidToken
            | Self::VerificationFailed { .. } => StatusCode::UNAUTHORIZED,
            Self::AdminRequired | Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a client may retry after a delay
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Upstream { .. })
    }

    /// Retry-after hint, if applicable
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Message safe to put on the wire. Internal errors get a generic
    /// message; everything else is already user-facing.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Builds the `{ error, message, statusCode }` body for this error.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind().as_str(),
            message: self.public_message(),
            status_code: self.status().as_u16(),
        }
    }
}

/// Rate-limit rejection body: `{ error, message, retryAfter }`
#[derive(Debug, Serialize)]
pub struct RateLimitBody {
    /// Always "Too Many Requests"
    pub error: &'static str,
    /// Human-readable message
    pub message: &'static str,
    /// Seconds until the window resets
    #[serde(rename = "retryAfter")]
    pub retry_after: u64,
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        if let EdgeError::Internal(ref inner) = self {
            let correlation_id = Uuid::new_v4();
            error!(%correlation_id, error = %inner, "internal error");
        }

        match self {
            EdgeError::RateLimited {
                retry_after,
                limit,
                reset_at,
            } => {
                let retry_secs = retry_after.as_secs();
                let body = RateLimitBody {
                    error: "Too Many Requests",
                    message: "Rate limit exceeded. Please try again later.",
                    retry_after: retry_secs,
                };
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [
                        ("Retry-After", retry_secs.to_string()),
                        ("X-RateLimit-Limit", limit.to_string()),
                        ("X-RateLimit-Remaining", "0".to_string()),
                        ("X-RateLimit-Reset", reset_at.to_string()),
                    ],
                    Json(body),
                )
                    .into_response()
            }
            other => {
                let status = other.status();
                (status, Json(other.to_body())).into_response()
            }
        }
    }
}

impl From<reqwest::Error> for EdgeError {
    fn from(err: reqwest::Error) -> Self {
        let provider = err
            .url()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            // Never leak URLs with query parameters or keys
            "request failed".to_string()
        };
        EdgeError::Upstream { provider, reason }
    }
}
