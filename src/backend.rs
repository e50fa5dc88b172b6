//! Backend client for the hosted database and its auth service.
//!
//! The gateway never decodes tokens itself; it delegates session
//! verification to the backend's auth endpoint and performs the few
//! privileged lookups (admin flag, wallet ownership) with the service-role
//! key. Caller-scoped clients carry the original bearer token so row-level
//! security applies to anything queried through them.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;

/// Errors from backend calls.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The auth service rejected the credential
    #[error("{reason}")]
    Rejected {
        /// Reason reported by the auth service
        reason: String,
    },

    /// Transport-level failure reaching the backend
    #[error("backend request failed")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with something unparseable
    #[error("unexpected backend response: {reason}")]
    Malformed {
        /// What was wrong with the response
        reason: String,
    },
}

/// A user identity as reported by the backend session service.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedUser {
    /// Opaque unique user identifier
    pub id: String,
    /// Email, when the account has one
    #[serde(default)]
    pub email: Option<String>,
    /// Role claim, when present
    #[serde(default)]
    pub role: Option<String>,
    /// Audience claim
    #[serde(default)]
    pub aud: Option<String>,
}

/// Session verification, admin lookup and wallet ownership against the
/// backend. Split out as a trait so handlers can be tested with doubles.
#[async_trait]
pub trait BackendAuth: Send + Sync {
    /// Resolves a bearer token to its user, or `None` when the token is
    /// valid HTTP-wise but maps to no user.
    async fn get_user(&self, token: &str) -> Result<Option<VerifiedUser>, BackendError>;

    /// Whether the user's profile carries the `is_admin` flag.
    async fn is_admin(&self, user_id: &str) -> Result<bool, BackendError>;

    /// Whether `address` on `blockchain` is recorded as belonging to the user.
    async fn owns_address(
        &self,
        user_id: &str,
        blockchain: &str,
        address: &str,
    ) -> Result<bool, BackendError>;

    /// Constructs a client pre-authenticated with the caller's bearer token.
    fn scoped_client(&self, bearer_token: &str) -> ScopedClient;
}

/// Concrete backend client over HTTP (GoTrue for sessions, PostgREST for
/// table reads).
pub struct SupabaseBackend {
    http: reqwest::Client,
    base_url: Url,
    service_role_key: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AddressRow {
    #[allow(dead_code)]
    address: String,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(default, alias = "error_description", alias = "message")]
    msg: Option<String>,
}

impl SupabaseBackend {
    /// Builds the backend client from service configuration.
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_url.clone(),
            service_role_key: config.service_role_key.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Builds a client against an explicit base URL, used by tests that
    /// point the backend at a local HTTP double.
    pub fn with_base_url(
        base_url: Url,
        service_role_key: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            base_url,
            service_role_key: service_role_key.into(),
            anon_key: anon_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url.join(path).map_err(|e| BackendError::Malformed {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl BackendAuth for SupabaseBackend {
    async fn get_user(&self, token: &str) -> Result<Option<VerifiedUser>, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header("apikey", &self.service_role_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let user: VerifiedUser =
                    response.json().await.map_err(|e| BackendError::Malformed {
                        reason: e.to_string(),
                    })?;
                if user.id.is_empty() {
                    return Ok(None);
                }
                Ok(Some(user))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_client_error() => {
                let reason = response
                    .json::<AuthErrorBody>()
                    .await
                    .ok()
                    .and_then(|b| b.msg)
                    .unwrap_or_else(|| "invalid or expired token".to_string());
                debug!(%status, "session verification rejected");
                Err(BackendError::Rejected { reason })
            }
            status => Err(BackendError::Malformed {
                reason: format!("auth service returned {status}"),
            }),
        }
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, BackendError> {
        let mut url = self.endpoint("rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("select", "is_admin")
            .append_pair("id", &format!("eq.{user_id}"));

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .send()
            .await?
            .error_for_status()?;

        let rows: Vec<ProfileRow> =
            response.json().await.map_err(|e| BackendError::Malformed {
                reason: e.to_string(),
            })?;
        Ok(rows
            .first()
            .and_then(|row| row.is_admin)
            .unwrap_or(false))
    }

    async fn owns_address(
        &self,
        user_id: &str,
        blockchain: &str,
        address: &str,
    ) -> Result<bool, BackendError> {
        let mut url = self.endpoint("rest/v1/blockchain_deposit_addresses")?;
        url.query_pairs_mut()
            .append_pair("select", "address")
            .append_pair("user_id", &format!("eq.{user_id}"))
            .append_pair("network_code", &format!("eq.{}", blockchain.to_lowercase()))
            .append_pair("address", &format!("eq.{address}"));

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "address ownership lookup failed");
            return Ok(false);
        }

        let rows: Vec<AddressRow> =
            response.json().await.map_err(|e| BackendError::Malformed {
                reason: e.to_string(),
            })?;
        Ok(!rows.is_empty())
    }

    fn scoped_client(&self, bearer_token: &str) -> ScopedClient {
        ScopedClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            anon_key: self.anon_key.clone(),
            bearer_token: bearer_token.to_string(),
        }
    }
}

/// A backend client bound to one caller's bearer token.
///
/// Opaque to the rest of the gateway: handlers hand it to downstream logic
/// that needs row-level-scoped reads and writes. Constructed fresh per
/// request, never pooled across callers.
#[derive(Clone, Debug)]
pub struct ScopedClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    bearer_token: String,
}

impl ScopedClient {
    /// Builds a scoped client directly; used by backend doubles in tests.
    pub fn new(base_url: Url, anon_key: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            anon_key: anon_key.into(),
            bearer_token: bearer_token.into(),
        }
    }

    /// Starts a GET against a PostgREST path, pre-authenticated as the
    /// caller so row-level security applies.
    pub fn get(&self, path: &str) -> Result<reqwest::RequestBuilder, BackendError> {
        let url = self.base_url.join(path).map_err(|e| BackendError::Malformed {
            reason: e.to_string(),
        })?;
        Ok(self.http.get(url).headers(self.auth_headers()))
    }

    /// Starts a POST against a PostgREST path under the caller's identity.
    pub fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, BackendError> {
        let url = self.base_url.join(path).map_err(|e| BackendError::Malformed {
            reason: e.to_string(),
        })?;
        Ok(self.http.post(url).headers(self.auth_headers()))
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.bearer_token)) {
            headers.insert(AUTHORIZATION, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", value);
        }
        headers
    }
}
