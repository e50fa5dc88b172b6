//! Token price endpoint: aggregates market-data providers with a fixed
//! preference order and never hard-fails.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::handlers::{check_tier, finish, AppState};

/// `GET /token-price`
pub async fn handle(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = match check_tier(&state, "standard", &state.limiters.standard, &headers) {
        Ok(()) => {
            let data = state.token_price.fetch().await;
            if data.source == "fallback" {
                state.metrics.record_provider_fallback("token-price");
            }
            let mut response = Json(json!({
                "success": true,
                "data": data,
                "timestamp": Utc::now().to_rfc3339(),
            }))
            .into_response();
            // Short-lived client cache; prices move fast
            response.headers_mut().insert(
                axum::http::header::CACHE_CONTROL,
                axum::http::HeaderValue::from_static("public, max-age=10"),
            );
            Ok(response)
        }
        Err(err) => Err(err),
    };
    finish(&state, "token-price", &headers, result)
}
