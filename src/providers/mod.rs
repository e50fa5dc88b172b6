//! Third-party data providers and fallback chains.
//!
//! Price endpoints prefer availability over strict correctness: providers
//! are tried as an ordered list with a static fallback payload at the end,
//! so a read-only price fetch never hard-fails toward the caller.

pub mod balance;
pub mod bitcoin;
pub mod token_price;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::EdgeError;

/// Market data for the platform token from one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    /// USD price
    pub price: f64,
    /// Market capitalization in USD
    #[serde(rename = "marketCap")]
    pub market_cap: f64,
    /// 24h trading volume
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
    /// 24h price change, percent
    #[serde(rename = "priceChange24h")]
    pub price_change_24h: f64,
    /// Holder count, when the provider reports it
    pub holders: u64,
    /// Total token supply
    #[serde(rename = "totalSupply")]
    pub total_supply: f64,
    /// Liquidity in USD (or provider-native units)
    pub liquidity: f64,
    /// Which provider produced this payload
    pub source: String,
}

impl TokenData {
    /// The zero-price payload used when every provider fails.
    pub fn fallback(total_supply: f64) -> Self {
        Self {
            price: 0.0,
            market_cap: 0.0,
            volume_24h: 0.0,
            price_change_24h: 0.0,
            holders: 0,
            total_supply,
            liquidity: 0.0,
            source: "fallback".to_string(),
        }
    }
}

/// One upstream market-data source.
#[async_trait]
pub trait TokenDataProvider: Send + Sync {
    /// Provider name, used for logging and the `source` tag
    fn name(&self) -> &'static str;

    /// Fetches token data; an `Err` moves the chain to the next provider.
    async fn fetch(&self) -> Result<TokenData, EdgeError>;
}

/// Queries all providers concurrently, then applies the fixed preference
/// order of the slice. Preference is decided after every fetch has settled,
/// not by arrival order.
pub async fn fetch_with_preference(
    providers: &[Arc<dyn TokenDataProvider>],
) -> Option<TokenData> {
    let results = join_all(providers.iter().map(|p| p.fetch())).await;

    for (provider, result) in providers.iter().zip(results) {
        match result {
            Ok(data) => {
                debug!(provider = provider.name(), "using provider data");
                return Some(data);
            }
            Err(err) => {
                warn!(provider = provider.name(), error = %err, "provider failed");
            }
        }
    }
    None
}
