//! HTTP handlers and router assembly.
//!
//! Every endpoint runs the same pipeline: CORS preflight short-circuit,
//! rate-limit check for its tier, auth resolution when required, the
//! endpoint-specific fetch, and response assembly with CORS headers attached
//! on every branch.

pub mod balance;
pub mod bitcoin_price;
pub mod swap_rate;
pub mod token_price;

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::auth::AuthVerifier;
use crate::backend::BackendAuth;
use crate::cors::CorsPolicy;
use crate::error::EdgeError;
use crate::observability::GatewayMetrics;
use crate::providers::balance::BalanceFetcher;
use crate::providers::bitcoin::BitcoinDataService;
use crate::providers::token_price::TokenPriceService;
use crate::rate_limiter::{client_key, RateLimitDecision, RateLimiter, RateLimiters};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Origin allow-list
    pub cors: CorsPolicy,
    /// Per-tier rate limiters
    pub limiters: Arc<RateLimiters>,
    /// Bearer-credential verifier
    pub verifier: AuthVerifier,
    /// Backend auth/lookup client
    pub backend: Arc<dyn BackendAuth>,
    /// Token market-data chain
    pub token_price: Arc<TokenPriceService>,
    /// Bitcoin price and network stats
    pub bitcoin: Arc<BitcoinDataService>,
    /// On-chain balance lookups
    pub balances: Arc<BalanceFetcher>,
    /// Prometheus counters
    pub metrics: Arc<GatewayMetrics>,
}

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).options(preflight))
        .route("/token-price", get(token_price::handle).options(preflight))
        .route("/bitcoin-price", get(bitcoin_price::handle).options(preflight))
        .route("/swap-rate", post(swap_rate::handle).options(preflight))
        .route("/balance", post(balance::handle).options(preflight))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answers CORS preflights for every route.
async fn preflight(State(state): State<AppState>, method: Method, headers: HeaderMap) -> Response {
    state
        .cors
        .preflight(&method, origin(&headers))
        .unwrap_or_else(|| StatusCode::METHOD_NOT_ALLOWED.into_response())
}

/// Liveness probe.
async fn health(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = check_tier(&state, "lenient", &state.limiters.lenient, &headers).map(|()| {
        Json(json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response()
    });
    finish(&state, "health", &headers, result)
}

/// Prometheus text exposition.
async fn metrics(State(state): State<AppState>) -> Response {
    state.metrics.gather().into_response()
}

/// The request's `Origin` header value, when parseable.
pub(crate) fn origin(headers: &HeaderMap) -> Option<&str> {
    headers.get(ORIGIN).and_then(|v| v.to_str().ok())
}

/// Runs the tier's rate-limit check, translating a denial into the 429
/// response shape.
pub(crate) fn check_tier(
    state: &AppState,
    tier: &str,
    limiter: &RateLimiter,
    headers: &HeaderMap,
) -> Result<(), EdgeError> {
    let key = client_key(headers);
    match limiter.check(&key) {
        RateLimitDecision::Allowed => Ok(()),
        RateLimitDecision::Denied {
            retry_after,
            limit,
            reset_at,
        } => {
            state.metrics.record_rate_limited(tier);
            Err(EdgeError::RateLimited {
                retry_after,
                limit,
                reset_at,
            })
        }
    }
}

/// Attaches CORS headers to the outcome (success or error) and records the
/// request metric. The terminal step of every handler.
pub(crate) fn finish(
    state: &AppState,
    endpoint: &str,
    headers: &HeaderMap,
    result: Result<Response, EdgeError>,
) -> Response {
    let mut response = match result {
        Ok(response) => response,
        Err(err) => {
            if matches!(
                err.kind(),
                crate::error::ErrorKind::Authentication | crate::error::ErrorKind::Authorization
            ) {
                state.metrics.record_auth_failure(err.kind().as_str());
            }
            err.into_response()
        }
    };

    let cors_headers = state.cors.headers(origin(headers));
    for (name, value) in cors_headers.iter() {
        response.headers_mut().insert(name.clone(), value.clone());
    }

    state
        .metrics
        .record_request(endpoint, response.status().as_u16());
    response
}
