//! Bitcoin price endpoint.
//!
//! This endpoint never surfaces a 500 to its caller: when the price
//! provider is down it answers 200 with a `fallback` payload.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::handlers::{check_tier, finish, AppState};
use crate::providers::bitcoin::{
    BitcoinData, NetworkStats, FALLBACK_PRICE_EUR, FALLBACK_PRICE_USD,
};

/// Query parameters.
#[derive(Debug, Deserialize)]
pub struct NetworkQuery {
    /// `?network=true` includes difficulty/hashrate/height
    #[serde(default)]
    network: Option<String>,
}

/// `GET /bitcoin-price`
pub async fn handle(
    State(state): State<AppState>,
    Query(query): Query<NetworkQuery>,
    headers: HeaderMap,
) -> Response {
    let result = match check_tier(&state, "standard", &state.limiters.standard, &headers) {
        Ok(()) => Ok(fetch(&state, &query).await),
        Err(err) => Err(err),
    };
    finish(&state, "bitcoin-price", &headers, result)
}

async fn fetch(state: &AppState, query: &NetworkQuery) -> Response {
    let include_network = query.network.as_deref() == Some("true");

    match state.bitcoin.fetch_price().await {
        Ok(price) => {
            let network = if include_network {
                state.bitcoin.fetch_network_stats().await
            } else {
                NetworkStats::empty()
            };
            Json(BitcoinData { price, network }).into_response()
        }
        Err(err) => {
            warn!(error = %err, "bitcoin price fetch failed, serving fallback");
            state.metrics.record_provider_fallback("bitcoin-price");
            Json(json!({
                "error": err.public_message(),
                "fallback": {
                    "price": {
                        "usd": FALLBACK_PRICE_USD,
                        "eur": FALLBACK_PRICE_EUR,
                        "timestamp": Utc::now().timestamp_millis(),
                    },
                    "network": NetworkStats::fallback(),
                },
            }))
            .into_response()
        }
    }
}
