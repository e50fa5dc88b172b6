//! Bitcoin price and network statistics.
//!
//! Price comes from CoinGecko; network stats from the blockchain.info
//! plain-text query endpoints, fetched concurrently with hardcoded
//! fallbacks. The endpoint built on this service returns 200 even when
//! everything upstream is down.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EdgeError;

/// Block subsidy after the 2024 halving.
pub const BLOCK_REWARD: f64 = 3.125;

/// Fallback network stats when the providers fail.
pub const FALLBACK_DIFFICULTY: f64 = 73_197_634_206_448.0;
/// Fallback hashrate in EH/s.
pub const FALLBACK_HASHRATE: f64 = 550.0;
/// Fallback block height.
pub const FALLBACK_BLOCK_HEIGHT: u64 = 820_000;

/// Fallback prices when CoinGecko is down.
pub const FALLBACK_PRICE_USD: f64 = 43_500.0;
/// EUR counterpart of the fallback price.
pub const FALLBACK_PRICE_EUR: f64 = 40_000.0;

/// Spot price snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BitcoinPrice {
    /// USD price
    pub usd: f64,
    /// EUR price
    pub eur: f64,
    /// Epoch-millis timestamp of the snapshot
    pub timestamp: i64,
}

/// Network statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStats {
    /// Current difficulty
    pub difficulty: f64,
    /// Hashrate in EH/s
    pub hashrate: f64,
    /// Tip height
    #[serde(rename = "blockHeight")]
    pub block_height: u64,
    /// Current block subsidy
    #[serde(rename = "blockReward")]
    pub block_reward: f64,
}

impl NetworkStats {
    /// Zeroed stats used when network data was not requested.
    pub fn empty() -> Self {
        Self {
            difficulty: 0.0,
            hashrate: 0.0,
            block_height: 0,
            block_reward: BLOCK_REWARD,
        }
    }

    /// Hardcoded stats used when the providers fail.
    pub fn fallback() -> Self {
        Self {
            difficulty: FALLBACK_DIFFICULTY,
            hashrate: FALLBACK_HASHRATE,
            block_height: FALLBACK_BLOCK_HEIGHT,
            block_reward: BLOCK_REWARD,
        }
    }
}

/// Combined payload for the bitcoin-price endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BitcoinData {
    /// Spot price
    pub price: BitcoinPrice,
    /// Network statistics (zeroed unless requested)
    pub network: NetworkStats,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoPrice {
    bitcoin: CoinGeckoQuote,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoQuote {
    usd: f64,
    eur: f64,
}

/// Fetches bitcoin price and network stats with injectable base URLs.
pub struct BitcoinDataService {
    http: reqwest::Client,
    coingecko_base: String,
    blockchain_info_base: String,
}

impl BitcoinDataService {
    /// Production wiring.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            coingecko_base: "https://api.coingecko.com".to_string(),
            blockchain_info_base: "https://blockchain.info".to_string(),
        }
    }

    /// Custom base URLs, used by tests.
    pub fn with_base_urls(
        http: reqwest::Client,
        coingecko_base: impl Into<String>,
        blockchain_info_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            coingecko_base: coingecko_base.into(),
            blockchain_info_base: blockchain_info_base.into(),
        }
    }

    /// Fetches the spot price from CoinGecko.
    pub async fn fetch_price(&self) -> Result<BitcoinPrice, EdgeError> {
        let url = format!(
            "{}/api/v3/simple/price?ids=bitcoin&vs_currencies=usd,eur&include_last_updated_at=true",
            self.coingecko_base
        );
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(EdgeError::Upstream {
                provider: "coingecko".to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        let parsed: CoinGeckoPrice = response.json().await.map_err(|e| EdgeError::Upstream {
            provider: "coingecko".to_string(),
            reason: e.to_string(),
        })?;

        Ok(BitcoinPrice {
            usd: parsed.bitcoin.usd,
            eur: parsed.bitcoin.eur,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// Fetches difficulty, hashrate and block height concurrently, falling
    /// back to hardcoded constants when any of them fails.
    pub async fn fetch_network_stats(&self) -> NetworkStats {
        let (difficulty, hashrate, block_height) = tokio::join!(
            self.fetch_plain_number("q/getdifficulty"),
            self.fetch_plain_number("q/hashrate"),
            self.fetch_plain_number("q/getblockcount"),
        );

        match (difficulty, hashrate, block_height) {
            (Some(difficulty), Some(hashrate), Some(block_height)) => NetworkStats {
                difficulty,
                // blockchain.info reports GH/s-scale values; normalize to EH/s
                hashrate: hashrate / 1e18,
                block_height: block_height as u64,
                block_reward: BLOCK_REWARD,
            },
            _ => {
                warn!("network stats providers failed, using fallback values");
                NetworkStats::fallback()
            }
        }
    }

    async fn fetch_plain_number(&self, path: &str) -> Option<f64> {
        let url = format!("{}/{path}", self.blockchain_info_base);
        let response = self.http.get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()?.trim().parse().ok()
    }
}
