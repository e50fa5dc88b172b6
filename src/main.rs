//! TYT Edge Gateway - main entry point.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use tyt_edge::auth::AuthVerifier;
use tyt_edge::backend::SupabaseBackend;
use tyt_edge::config::Config;
use tyt_edge::cors::CorsPolicy;
use tyt_edge::handlers::{router, AppState};
use tyt_edge::observability::{init_tracing, GatewayMetrics};
use tyt_edge::providers::balance::BalanceFetcher;
use tyt_edge::providers::bitcoin::BitcoinDataService;
use tyt_edge::providers::token_price::TokenPriceService;
use tyt_edge::rate_limiter::RateLimiters;
use tyt_edge::shutdown::{run_with_graceful_shutdown, ShutdownCoordinator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(std::env::var("LOG_FORMAT").as_deref() == Ok("json"));

    info!("starting TYT edge gateway");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let backend = Arc::new(SupabaseBackend::new(&config)?);
    let limiters = Arc::new(RateLimiters::default());

    let state = AppState {
        cors: CorsPolicy::default(),
        limiters: limiters.clone(),
        verifier: AuthVerifier::new(backend.clone()),
        backend,
        token_price: Arc::new(TokenPriceService::new(http.clone())),
        bitcoin: Arc::new(BitcoinDataService::new(http.clone())),
        balances: Arc::new(BalanceFetcher::new(http)),
        metrics: Arc::new(GatewayMetrics::new()?),
    };

    // Periodic sweep keeps the limiter maps bounded
    let mut coordinator = ShutdownCoordinator::new();
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let sweep_limiters = limiters.clone();
    coordinator.spawn("rate-limit-sweep", async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            sweep_limiters.sweep_all();
        }
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "TYT edge gateway listening");

    let server = axum::serve(listener, router(state));
    run_with_graceful_shutdown(
        server.into_future(),
        coordinator,
        Duration::from_secs(config.shutdown_timeout_secs),
    )
    .await;

    info!("TYT edge gateway stopped");
    Ok(())
}
