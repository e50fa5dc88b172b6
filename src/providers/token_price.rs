//! TYT token market-data providers.
//!
//! Preference order is fixed: Pump.fun, then DexScreener, then Birdeye,
//! with the Solana RPC supplying only the token supply for the fallback
//! payload. Provider base URLs are injectable so tests can point them at
//! local HTTP doubles.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::error::EdgeError;
use crate::providers::{fetch_with_preference, TokenData, TokenDataProvider};

/// Mint address of the platform token on Solana.
pub const TYT_TOKEN_MINT: &str = "8YuADotEATc86nEgPUZVs8fBRxdMMgEP4JL4xv7rpump";

/// Supply reported when even the Solana RPC is unreachable.
const DEFAULT_TOTAL_SUPPLY: f64 = 1_000_000_000.0;

fn upstream(provider: &str, reason: impl Into<String>) -> EdgeError {
    EdgeError::Upstream {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}

/// Pump.fun coin endpoint.
pub struct PumpFunProvider {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PumpFunCoin {
    #[serde(default)]
    usd_market_cap: f64,
    #[serde(default)]
    total_supply: f64,
    #[serde(default)]
    volume_24h: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    price_change_percentage_24h: f64,
    #[serde(default)]
    holder_count: u64,
    #[serde(default)]
    virtual_sol_reserves: Option<f64>,
    #[serde(default)]
    liquidity: Option<f64>,
}

impl PumpFunProvider {
    /// Creates the provider against the given API base URL.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TokenDataProvider for PumpFunProvider {
    fn name(&self) -> &'static str {
        "pump.fun"
    }

    async fn fetch(&self) -> Result<TokenData, EdgeError> {
        let url = format!("{}/coins/{TYT_TOKEN_MINT}", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", "TYT-Platform/1.0")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream(self.name(), format!("status {}", response.status())));
        }

        let coin: PumpFunCoin = response
            .json()
            .await
            .map_err(|e| upstream(self.name(), e.to_string()))?;

        let price = if coin.usd_market_cap > 0.0 && coin.total_supply > 0.0 {
            coin.usd_market_cap / coin.total_supply
        } else {
            0.0
        };

        Ok(TokenData {
            price,
            market_cap: coin.usd_market_cap,
            volume_24h: coin.volume_24h.or(coin.volume).unwrap_or(0.0),
            price_change_24h: coin.price_change_percentage_24h,
            holders: coin.holder_count,
            total_supply: if coin.total_supply > 0.0 {
                coin.total_supply
            } else {
                DEFAULT_TOTAL_SUPPLY
            },
            liquidity: coin.virtual_sol_reserves.or(coin.liquidity).unwrap_or(0.0),
            source: self.name().to_string(),
        })
    }
}

/// DexScreener token-pairs endpoint.
pub struct DexScreenerProvider {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DexScreenerResponse {
    #[serde(default)]
    pairs: Vec<DexScreenerPair>,
}

#[derive(Debug, Deserialize)]
struct DexScreenerPair {
    #[serde(default, rename = "priceUsd")]
    price_usd: Option<String>,
    #[serde(default)]
    fdv: Option<f64>,
    #[serde(default)]
    volume: Option<DexScreenerWindow>,
    #[serde(default, rename = "priceChange")]
    price_change: Option<DexScreenerWindow>,
    #[serde(default)]
    liquidity: Option<DexScreenerLiquidity>,
}

#[derive(Debug, Deserialize)]
struct DexScreenerWindow {
    #[serde(default)]
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DexScreenerLiquidity {
    #[serde(default)]
    usd: Option<f64>,
}

impl DexScreenerProvider {
    /// Creates the provider against the given API base URL.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TokenDataProvider for DexScreenerProvider {
    fn name(&self) -> &'static str {
        "dexscreener"
    }

    async fn fetch(&self) -> Result<TokenData, EdgeError> {
        let url = format!("{}/latest/dex/tokens/{TYT_TOKEN_MINT}", self.base_url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(upstream(self.name(), format!("status {}", response.status())));
        }

        let body: DexScreenerResponse = response
            .json()
            .await
            .map_err(|e| upstream(self.name(), e.to_string()))?;

        let pair = body
            .pairs
            .into_iter()
            .next()
            .ok_or_else(|| upstream(self.name(), "no pairs for token"))?;

        Ok(TokenData {
            price: pair
                .price_usd
                .as_deref()
                .and_then(|p| p.parse().ok())
                .unwrap_or(0.0),
            market_cap: pair.fdv.unwrap_or(0.0),
            volume_24h: pair.volume.and_then(|v| v.h24).unwrap_or(0.0),
            price_change_24h: pair.price_change.and_then(|v| v.h24).unwrap_or(0.0),
            holders: 0,
            total_supply: DEFAULT_TOTAL_SUPPLY,
            liquidity: pair.liquidity.and_then(|l| l.usd).unwrap_or(0.0),
            source: self.name().to_string(),
        })
    }
}

/// Birdeye public price endpoint.
pub struct BirdeyeProvider {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BirdeyeResponse {
    #[serde(default)]
    data: Option<BirdeyeData>,
}

#[derive(Debug, Deserialize)]
struct BirdeyeData {
    #[serde(default)]
    value: f64,
    #[serde(default)]
    liquidity: f64,
    #[serde(default, rename = "priceChange24h")]
    price_change_24h: f64,
}

impl BirdeyeProvider {
    /// Creates the provider against the given API base URL.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TokenDataProvider for BirdeyeProvider {
    fn name(&self) -> &'static str {
        "birdeye"
    }

    async fn fetch(&self) -> Result<TokenData, EdgeError> {
        let url = format!("{}/public/price?address={TYT_TOKEN_MINT}", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream(self.name(), format!("status {}", response.status())));
        }

        let body: BirdeyeResponse = response
            .json()
            .await
            .map_err(|e| upstream(self.name(), e.to_string()))?;
        let data = body
            .data
            .ok_or_else(|| upstream(self.name(), "empty data"))?;

        Ok(TokenData {
            price: data.value,
            market_cap: data.liquidity,
            volume_24h: 0.0,
            price_change_24h: data.price_change_24h,
            holders: 0,
            total_supply: DEFAULT_TOTAL_SUPPLY,
            liquidity: data.liquidity,
            source: self.name().to_string(),
        })
    }
}

/// Aggregates the provider chain and the supply fallback.
pub struct TokenPriceService {
    providers: Vec<Arc<dyn TokenDataProvider>>,
    http: reqwest::Client,
    solana_rpc_url: String,
}

#[derive(Debug, Deserialize)]
struct SupplyResponse {
    #[serde(default)]
    result: Option<SupplyResult>,
}

#[derive(Debug, Deserialize)]
struct SupplyResult {
    #[serde(default)]
    value: Option<SupplyValue>,
}

#[derive(Debug, Deserialize)]
struct SupplyValue {
    #[serde(default, rename = "uiAmount")]
    ui_amount: Option<f64>,
}

impl TokenPriceService {
    /// Production wiring: Pump.fun, DexScreener, Birdeye in that order.
    pub fn new(http: reqwest::Client) -> Self {
        let providers: Vec<Arc<dyn TokenDataProvider>> = vec![
            Arc::new(PumpFunProvider::new(
                http.clone(),
                "https://frontend-api.pump.fun",
            )),
            Arc::new(DexScreenerProvider::new(
                http.clone(),
                "https://api.dexscreener.com",
            )),
            Arc::new(BirdeyeProvider::new(
                http.clone(),
                "https://public-api.birdeye.so",
            )),
        ];
        Self {
            providers,
            http,
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
        }
    }

    /// Custom wiring, used by tests to substitute provider doubles.
    pub fn with_providers(
        http: reqwest::Client,
        providers: Vec<Arc<dyn TokenDataProvider>>,
        solana_rpc_url: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            http,
            solana_rpc_url: solana_rpc_url.into(),
        }
    }

    /// Fetches token data. Never fails: when every provider is down the
    /// result is the zero-price fallback payload tagged `source: "fallback"`.
    pub async fn fetch(&self) -> TokenData {
        if let Some(data) = fetch_with_preference(&self.providers).await {
            return data;
        }

        warn!("all token data providers failed, falling back to supply-only payload");
        TokenData::fallback(self.fetch_total_supply().await)
    }

    async fn fetch_total_supply(&self) -> f64 {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTokenSupply",
            "params": [TYT_TOKEN_MINT],
        });

        let supply = async {
            let response = self
                .http
                .post(&self.solana_rpc_url)
                .json(&body)
                .send()
                .await
                .ok()?;
            let parsed: SupplyResponse = response.json().await.ok()?;
            parsed.result?.value?.ui_amount
        }
        .await;

        supply.unwrap_or(DEFAULT_TOTAL_SUPPLY)
    }
}
