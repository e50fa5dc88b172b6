//! The authenticated balance pipeline end to end: verification, ownership
//! gating and the upstream fetch.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use axum::body::Body;
use mockall::mock;
use mockall::predicate::eq;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use async_trait::async_trait;
use tyt_edge::backend::{BackendAuth, BackendError, ScopedClient, VerifiedUser};
use tyt_edge::handlers::router;
use tyt_edge::providers::balance::{BalanceFetcher, ChainEndpoints};

use crate::common::{self, StubBackend, TOKEN};

mock! {
    pub Backend {}

    #[async_trait]
    impl BackendAuth for Backend {
        async fn get_user(&self, token: &str) -> Result<Option<VerifiedUser>, BackendError>;
        async fn is_admin(&self, user_id: &str) -> Result<bool, BackendError>;
        async fn owns_address(
            &self,
            user_id: &str,
            blockchain: &str,
            address: &str,
        ) -> Result<bool, BackendError>;
        fn scoped_client(&self, bearer_token: &str) -> ScopedClient;
    }
}

fn balance_request(token: Option<&str>) -> Request<Body> {
    let body = json!({ "blockchain": "bitcoin", "address": "bc1qowned" });
    let mut builder = Request::builder()
        .method("POST")
        .uri("/balance")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.20");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn rejected_token_is_a_401_with_the_backend_reason() {
    let mut backend = MockBackend::new();
    backend.expect_get_user().returning(|_| {
        Err(BackendError::Rejected {
            reason: "invalid JWT".to_string(),
        })
    });
    backend
        .expect_scoped_client()
        .returning(common::scoped_client);

    let app = router(common::offline_state(Arc::new(backend)));
    let response = app.oneshot(balance_request(Some(TOKEN))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "AuthenticationError");
    assert_eq!(body["message"], "Authentication failed: invalid JWT");
}

#[tokio::test]
async fn foreign_address_is_a_403() {
    let mut backend = MockBackend::new();
    backend
        .expect_get_user()
        .returning(|_| Ok(Some(common::sample_user())));
    backend
        .expect_scoped_client()
        .returning(common::scoped_client);
    backend
        .expect_owns_address()
        .with(eq("user-123"), eq("bitcoin"), eq("bc1qowned"))
        .returning(|_, _, _| Ok(false));

    let app = router(common::offline_state(Arc::new(backend)));
    let response = app.oneshot(balance_request(Some(TOKEN))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "AuthorizationError");
    assert_eq!(body["message"], "Forbidden: address not owned by user");
}

#[tokio::test]
async fn ownership_lookup_failure_denies_rather_than_leaks() {
    let mut backend = MockBackend::new();
    backend
        .expect_get_user()
        .returning(|_| Ok(Some(common::sample_user())));
    backend
        .expect_scoped_client()
        .returning(common::scoped_client);
    backend.expect_owns_address().returning(|_, _, _| {
        Err(BackendError::Malformed {
            reason: "table read failed".to_string(),
        })
    });

    let app = router(common::offline_state(Arc::new(backend)));
    let response = app.oneshot(balance_request(Some(TOKEN))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_parameters_after_auth_are_a_400() {
    let app = router(common::offline_state(Arc::new(StubBackend::default())));

    let request = Request::builder()
        .method("POST")
        .uri("/balance")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("x-forwarded-for", "203.0.113.20")
        .body(Body::from(json!({ "blockchain": "bitcoin" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Missing required parameters");
}

#[tokio::test]
async fn owned_address_returns_the_upstream_balance() {
    let explorer = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/address/bc1qowned"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chain_stats": {
                "funded_txo_sum": 250_000_000u64,
                "spent_txo_sum": 50_000_000u64,
            }
        })))
        .mount(&explorer)
        .await;

    let mut state = common::offline_state(Arc::new(StubBackend::default()));
    state.balances = Arc::new(BalanceFetcher::with_endpoints(
        reqwest::Client::new(),
        ChainEndpoints {
            bitcoin: explorer.uri(),
            ..common::offline_endpoints()
        },
    ));

    let app = router(state);
    let response = app.oneshot(balance_request(Some(TOKEN))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["balance"], 2.0);
    assert_eq!(body["blockchain"], "bitcoin");
    assert_eq!(body["address"], "bc1qowned");
    assert_eq!(body["asset"], "native");
    assert!(body["error"].is_null());
}
