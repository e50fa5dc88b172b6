//! Swap-rate quotes from the in-process static price table.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::error::EdgeError;
use crate::handlers::{check_tier, finish, AppState};

/// Static USD prices per asset symbol. Unknown symbols quote at 1.
const ASSET_PRICES: &[(&str, f64)] = &[
    ("BTC", 95_000.0),
    ("ETH", 3_500.0),
    ("SOL", 140.0),
    ("BNB", 600.0),
    ("MATIC", 1.15),
    ("TRX", 0.15),
    ("TYT", 0.05),
    ("USDT", 1.0),
    ("USDC", 1.0),
    ("XRP", 2.5),
];

/// Request body.
#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    /// Asset to swap from
    #[serde(default)]
    pub from_asset: Option<String>,
    /// Asset to swap to
    #[serde(default)]
    pub to_asset: Option<String>,
}

/// Static USD price for a symbol.
pub fn asset_price(symbol: &str) -> f64 {
    ASSET_PRICES
        .iter()
        .find(|(name, _)| *name == symbol)
        .map(|(_, price)| *price)
        .unwrap_or(1.0)
}

/// Price ratio with a volatility perturbation in [-1%, +1%].
pub fn compute_rate(from_price: f64, to_price: f64, volatility: f64) -> f64 {
    (from_price / to_price) * (1.0 + volatility)
}

/// `POST /swap-rate`
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<SwapRequest>>,
) -> Response {
    let result = check_tier(&state, "standard", &state.limiters.standard, &headers)
        .and_then(|()| quote(body));
    finish(&state, "swap-rate", &headers, result)
}

fn quote(body: Option<Json<SwapRequest>>) -> Result<Response, EdgeError> {
    let Some(Json(request)) = body else {
        return Err(EdgeError::Validation {
            reason: "Missing required parameters".to_string(),
        });
    };
    let (Some(from_asset), Some(to_asset)) = (request.from_asset, request.to_asset) else {
        return Err(EdgeError::Validation {
            reason: "Missing required parameters".to_string(),
        });
    };

    let from_price = asset_price(&from_asset);
    let to_price = asset_price(&to_asset);
    let volatility = (rand::thread_rng().gen::<f64>() - 0.5) * 0.02;
    let rate = compute_rate(from_price, to_price, volatility);

    Ok(Json(json!({
        "success": true,
        "rate": rate,
        "from_asset": from_asset,
        "to_asset": to_asset,
        "from_price": from_price,
        "to_price": to_price,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response())
}
