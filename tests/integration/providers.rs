//! Price and balance providers against local HTTP doubles, plus the
//! fallback behavior of the endpoints built on them.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tyt_edge::handlers::router;
use tyt_edge::providers::balance::{BalanceFetcher, ChainEndpoints};
use tyt_edge::providers::bitcoin::BitcoinDataService;
use tyt_edge::providers::token_price::{
    BirdeyeProvider, DexScreenerProvider, PumpFunProvider, TokenPriceService, TYT_TOKEN_MINT,
};
use tyt_edge::providers::TokenDataProvider;

use crate::common::{self, StubBackend};

fn http() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn pump_fun_wins_when_it_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/coins/{TYT_TOKEN_MINT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "usd_market_cap": 50_000_000.0,
            "total_supply": 1_000_000_000.0,
            "volume_24h": 1_500_000.0,
            "price_change_percentage_24h": 4.2,
            "holder_count": 12_345,
            "virtual_sol_reserves": 900_000.0,
        })))
        .mount(&server)
        .await;
    // DexScreener would also answer; preference must still pick pump.fun
    Mock::given(method("GET"))
        .and(path(format!("/latest/dex/tokens/{TYT_TOKEN_MINT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pairs": [{ "priceUsd": "0.99", "fdv": 1.0 }]
        })))
        .mount(&server)
        .await;

    let providers: Vec<Arc<dyn TokenDataProvider>> = vec![
        Arc::new(PumpFunProvider::new(http(), server.uri())),
        Arc::new(DexScreenerProvider::new(http(), server.uri())),
    ];
    let service = TokenPriceService::with_providers(http(), providers, common::OFFLINE);

    let data = service.fetch().await;
    assert_eq!(data.source, "pump.fun");
    assert!((data.price - 0.05).abs() < 1e-9);
    assert_eq!(data.market_cap, 50_000_000.0);
    assert_eq!(data.holders, 12_345);
}

#[tokio::test]
async fn chain_moves_past_failing_providers_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/coins/{TYT_TOKEN_MINT}")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/latest/dex/tokens/{TYT_TOKEN_MINT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pairs": [{
                "priceUsd": "0.048",
                "fdv": 48_000_000.0,
                "volume": { "h24": 2_000_000.0 },
                "priceChange": { "h24": -1.5 },
                "liquidity": { "usd": 750_000.0 },
            }]
        })))
        .mount(&server)
        .await;

    let providers: Vec<Arc<dyn TokenDataProvider>> = vec![
        Arc::new(PumpFunProvider::new(http(), server.uri())),
        Arc::new(DexScreenerProvider::new(http(), server.uri())),
        Arc::new(BirdeyeProvider::new(http(), common::OFFLINE)),
    ];
    let service = TokenPriceService::with_providers(http(), providers, common::OFFLINE);

    let data = service.fetch().await;
    assert_eq!(data.source, "dexscreener");
    assert!((data.price - 0.048).abs() < 1e-9);
    assert_eq!(data.volume_24h, 2_000_000.0);
    assert_eq!(data.liquidity, 750_000.0);
}

#[tokio::test]
async fn exhausted_chain_serves_the_supply_only_fallback() {
    let rpc = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "value": { "uiAmount": 987_654_321.0 } },
        })))
        .mount(&rpc)
        .await;

    let providers: Vec<Arc<dyn TokenDataProvider>> = vec![
        Arc::new(PumpFunProvider::new(http(), common::OFFLINE)),
        Arc::new(BirdeyeProvider::new(http(), common::OFFLINE)),
    ];
    let service = TokenPriceService::with_providers(http(), providers, rpc.uri());

    let data = service.fetch().await;
    assert_eq!(data.source, "fallback");
    assert_eq!(data.price, 0.0);
    assert_eq!(data.total_supply, 987_654_321.0);
}

#[tokio::test]
async fn token_price_endpoint_stays_200_with_everything_down() {
    let app = router(common::offline_state(Arc::new(StubBackend::default())));

    let response = app.oneshot(common::get("/token-price")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=10"
    );
    assert!(response.headers().contains_key("access-control-allow-origin"));

    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["source"], "fallback");
    assert_eq!(body["data"]["price"], 0.0);
    assert_eq!(body["data"]["totalSupply"], 1_000_000_000.0);
}

#[tokio::test]
async fn bitcoin_price_parses_the_coingecko_quote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": { "usd": 97_250.5, "eur": 89_900.0 }
        })))
        .mount(&server)
        .await;

    let service = BitcoinDataService::with_base_urls(http(), server.uri(), common::OFFLINE);
    let price = service.fetch_price().await.unwrap();
    assert_eq!(price.usd, 97_250.5);
    assert_eq!(price.eur, 89_900.0);
    assert!(price.timestamp > 0);
}

#[tokio::test]
async fn network_stats_parse_the_plain_text_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/q/getdifficulty"))
        .respond_with(ResponseTemplate::new(200).set_body_string("73197634206448"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/q/hashrate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("550000000000000000000"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/q/getblockcount"))
        .respond_with(ResponseTemplate::new(200).set_body_string("885000"))
        .mount(&server)
        .await;

    let service = BitcoinDataService::with_base_urls(http(), common::OFFLINE, server.uri());
    let stats = service.fetch_network_stats().await;
    assert_eq!(stats.difficulty, 73_197_634_206_448.0);
    assert_eq!(stats.hashrate, 550.0);
    assert_eq!(stats.block_height, 885_000);
    assert_eq!(stats.block_reward, 3.125);
}

#[tokio::test]
async fn bitcoin_endpoint_never_surfaces_a_500() {
    let app = router(common::offline_state(Arc::new(StubBackend::default())));

    let response = app.oneshot(common::get("/bitcoin-price")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["fallback"]["price"]["usd"], 43_500.0);
    assert_eq!(body["fallback"]["price"]["eur"], 40_000.0);
    assert_eq!(body["fallback"]["network"]["blockHeight"], 820_000);
    assert_eq!(body["fallback"]["network"]["blockReward"], 3.125);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn ethereum_balance_converts_wei_to_ether() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": "0xde0b6b3a7640000",
        })))
        .mount(&server)
        .await;

    let fetcher = BalanceFetcher::with_endpoints(
        http(),
        ChainEndpoints {
            ethereum: server.uri(),
            ..common::offline_endpoints()
        },
    );
    let balance = fetcher.fetch("ethereum", "0xabc").await.unwrap();
    assert_eq!(balance, 1.0);
}

#[tokio::test]
async fn solana_balance_converts_lamports() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "value": 2_500_000_000u64 },
        })))
        .mount(&server)
        .await;

    let fetcher = BalanceFetcher::with_endpoints(
        http(),
        ChainEndpoints {
            solana: server.uri(),
            ..common::offline_endpoints()
        },
    );
    let balance = fetcher.fetch("SOL", "an-address").await.unwrap();
    assert_eq!(balance, 2.5);
}

#[tokio::test]
async fn unsupported_chain_is_a_validation_error() {
    let fetcher = BalanceFetcher::with_endpoints(http(), common::offline_endpoints());
    let err = fetcher.fetch("dogecoin", "DAddr").await.unwrap_err();
    assert_eq!(err.status().as_u16(), 400);
    assert_eq!(err.public_message(), "Unsupported blockchain: dogecoin");
}
