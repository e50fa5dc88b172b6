//! Shared fixtures: a canned backend double, app-state builders wired to
//! unreachable upstreams, and request/response helpers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt;
use url::Url;

use tyt_edge::auth::AuthVerifier;
use tyt_edge::backend::{BackendAuth, BackendError, ScopedClient, VerifiedUser};
use tyt_edge::cors::CorsPolicy;
use tyt_edge::handlers::AppState;
use tyt_edge::observability::GatewayMetrics;
use tyt_edge::providers::balance::{BalanceFetcher, ChainEndpoints};
use tyt_edge::providers::bitcoin::BitcoinDataService;
use tyt_edge::providers::token_price::TokenPriceService;
use tyt_edge::rate_limiter::RateLimiters;

/// Nothing listens here; connections are refused immediately.
pub const OFFLINE: &str = "http://127.0.0.1:1";

/// A token long enough to pass the plausibility check.
pub const TOKEN: &str = "a-plausible-session-token";

/// Backend double with canned answers.
pub struct StubBackend {
    pub user: Option<VerifiedUser>,
    pub owns: bool,
    pub admin: bool,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self {
            user: Some(sample_user()),
            owns: true,
            admin: false,
        }
    }
}

#[async_trait]
impl BackendAuth for StubBackend {
    async fn get_user(&self, _token: &str) -> Result<Option<VerifiedUser>, BackendError> {
        Ok(self.user.clone())
    }

    async fn is_admin(&self, _user_id: &str) -> Result<bool, BackendError> {
        Ok(self.admin)
    }

    async fn owns_address(
        &self,
        _user_id: &str,
        _blockchain: &str,
        _address: &str,
    ) -> Result<bool, BackendError> {
        Ok(self.owns)
    }

    fn scoped_client(&self, bearer_token: &str) -> ScopedClient {
        scoped_client(bearer_token)
    }
}

pub fn sample_user() -> VerifiedUser {
    VerifiedUser {
        id: "user-123".to_string(),
        email: Some("miner@takeyourtoken.app".to_string()),
        role: Some("authenticated".to_string()),
        aud: Some("authenticated".to_string()),
    }
}

pub fn scoped_client(bearer_token: &str) -> ScopedClient {
    ScopedClient::new(Url::parse(OFFLINE).unwrap(), "anon-key", bearer_token)
}

/// App state whose upstreams are all unreachable. Suitable for everything
/// that exercises routing, limits, auth and fallback paths.
pub fn offline_state(backend: Arc<dyn BackendAuth>) -> AppState {
    let http = reqwest::Client::new();
    AppState {
        cors: CorsPolicy::default(),
        limiters: Arc::new(RateLimiters::default()),
        verifier: AuthVerifier::new(backend.clone()),
        backend,
        token_price: Arc::new(TokenPriceService::with_providers(
            http.clone(),
            Vec::new(),
            OFFLINE,
        )),
        bitcoin: Arc::new(BitcoinDataService::with_base_urls(
            http.clone(),
            OFFLINE,
            OFFLINE,
        )),
        balances: Arc::new(BalanceFetcher::with_endpoints(http, offline_endpoints())),
        metrics: Arc::new(GatewayMetrics::new().unwrap()),
    }
}

pub fn offline_endpoints() -> ChainEndpoints {
    ChainEndpoints {
        bitcoin: OFFLINE.to_string(),
        ethereum: OFFLINE.to_string(),
        solana: OFFLINE.to_string(),
        tron: OFFLINE.to_string(),
        xrp: OFFLINE.to_string(),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
