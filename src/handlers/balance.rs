//! Authenticated balance check with server-side address-ownership
//! verification.
//!
//! Any authenticated user could otherwise probe arbitrary addresses through
//! the proxy; the ownership check confines lookups to addresses on record
//! for the caller.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::EdgeError;
use crate::handlers::{check_tier, finish, AppState};

/// Request body.
#[derive(Debug, Deserialize)]
pub struct BalanceRequest {
    /// Chain to query
    #[serde(default)]
    pub blockchain: Option<String>,
    /// Address to query
    #[serde(default)]
    pub address: Option<String>,
    /// Asset, `"native"` when omitted
    #[serde(default)]
    pub asset: Option<String>,
}

/// `POST /balance`
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<BalanceRequest>>,
) -> Response {
    let result = run(&state, &headers, body).await;
    finish(&state, "balance", &headers, result)
}

async fn run(
    state: &AppState,
    headers: &HeaderMap,
    body: Option<Json<BalanceRequest>>,
) -> Result<Response, EdgeError> {
    check_tier(state, "standard", &state.limiters.standard, headers)?;

    let context = state.verifier.require_auth(headers).await?;

    let Some(Json(request)) = body else {
        return Err(EdgeError::Validation {
            reason: "Missing required parameters".to_string(),
        });
    };
    let (Some(blockchain), Some(address)) = (request.blockchain, request.address) else {
        return Err(EdgeError::Validation {
            reason: "Missing required parameters".to_string(),
        });
    };
    let asset = request.asset.unwrap_or_else(|| "native".to_string());

    let owned = state
        .backend
        .owns_address(&context.principal.id, &blockchain, &address)
        .await
        .unwrap_or_else(|err| {
            debug!(error = %err, "ownership lookup failed, denying");
            false
        });
    if !owned {
        return Err(EdgeError::Forbidden {
            reason: "address not owned by user".to_string(),
        });
    }

    let balance = state.balances.fetch(&blockchain, &address).await?;

    Ok(Json(json!({
        "success": true,
        "balance": balance,
        "blockchain": blockchain,
        "address": address,
        "asset": asset,
        "error": null,
        "checked_at": Utc::now().to_rfc3339(),
    }))
    .into_response())
}
