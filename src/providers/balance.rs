//! On-chain balance lookups through public explorers and RPC nodes.
//!
//! One fetcher per supported chain, all behind [`BalanceFetcher::fetch`].
//! Base URLs are injectable so tests can substitute HTTP doubles.

use serde::Deserialize;
use serde_json::json;

use crate::error::EdgeError;

/// Explorer / RPC endpoints per chain.
#[derive(Debug, Clone)]
pub struct ChainEndpoints {
    /// Blockstream-compatible REST API
    pub bitcoin: String,
    /// Ethereum JSON-RPC node
    pub ethereum: String,
    /// Solana JSON-RPC node
    pub solana: String,
    /// TronGrid REST API
    pub tron: String,
    /// Rippled JSON-RPC node
    pub xrp: String,
}

impl Default for ChainEndpoints {
    fn default() -> Self {
        Self {
            bitcoin: "https://blockstream.info/api".to_string(),
            ethereum: "https://eth.llamarpc.com".to_string(),
            solana: "https://api.mainnet-beta.solana.com".to_string(),
            tron: "https://api.trongrid.io".to_string(),
            xrp: "https://s1.ripple.com:51234".to_string(),
        }
    }
}

/// Queries native-asset balances across the supported chains.
pub struct BalanceFetcher {
    http: reqwest::Client,
    endpoints: ChainEndpoints,
}

fn upstream(provider: &str, reason: impl Into<String>) -> EdgeError {
    EdgeError::Upstream {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}

impl BalanceFetcher {
    /// Production wiring.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoints: ChainEndpoints::default(),
        }
    }

    /// Custom endpoints, used by tests.
    pub fn with_endpoints(http: reqwest::Client, endpoints: ChainEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Fetches the native balance for `address` on `blockchain`.
    ///
    /// An unknown chain is a validation error; upstream failures surface as
    /// [`EdgeError::Upstream`] for the handler to translate.
    pub async fn fetch(&self, blockchain: &str, address: &str) -> Result<f64, EdgeError> {
        match blockchain.to_lowercase().as_str() {
            "bitcoin" | "btc" => self.bitcoin(address).await,
            "ethereum" | "eth" => self.ethereum(address).await,
            "solana" | "sol" => self.solana(address).await,
            "tron" | "trx" => self.tron(address).await,
            "xrp" => self.xrp(address).await,
            other => Err(EdgeError::Validation {
                reason: format!("Unsupported blockchain: {other}"),
            }),
        }
    }

    async fn bitcoin(&self, address: &str) -> Result<f64, EdgeError> {
        #[derive(Deserialize)]
        struct AddressInfo {
            chain_stats: ChainStats,
        }
        #[derive(Deserialize)]
        struct ChainStats {
            funded_txo_sum: u64,
            spent_txo_sum: u64,
        }

        let url = format!("{}/address/{address}", self.endpoints.bitcoin);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(upstream("blockstream", format!("status {}", response.status())));
        }

        let info: AddressInfo = response
            .json()
            .await
            .map_err(|e| upstream("blockstream", e.to_string()))?;
        let sats = info
            .chain_stats
            .funded_txo_sum
            .saturating_sub(info.chain_stats.spent_txo_sum);
        Ok(sats as f64 / 1e8)
    }

    async fn ethereum(&self, address: &str) -> Result<f64, EdgeError> {
        #[derive(Deserialize)]
        struct RpcResponse {
            #[serde(default)]
            result: Option<String>,
            #[serde(default)]
            error: Option<serde_json::Value>,
        }

        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_getBalance",
            "params": [address, "latest"],
            "id": 1,
        });
        let response = self.http.post(&self.endpoints.ethereum).json(&body).send().await?;
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| upstream("ethereum-rpc", e.to_string()))?;

        if parsed.error.is_some() {
            return Err(upstream("ethereum-rpc", "rpc error"));
        }
        let hex = parsed
            .result
            .ok_or_else(|| upstream("ethereum-rpc", "missing result"))?;
        let wei = u128::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| upstream("ethereum-rpc", e.to_string()))?;
        Ok(wei as f64 / 1e18)
    }

    async fn solana(&self, address: &str) -> Result<f64, EdgeError> {
        #[derive(Deserialize)]
        struct RpcResponse {
            #[serde(default)]
            result: Option<RpcResult>,
            #[serde(default)]
            error: Option<serde_json::Value>,
        }
        #[derive(Deserialize)]
        struct RpcResult {
            value: u64,
        }

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [address],
        });
        let response = self.http.post(&self.endpoints.solana).json(&body).send().await?;
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| upstream("solana-rpc", e.to_string()))?;

        if parsed.error.is_some() {
            return Err(upstream("solana-rpc", "rpc error"));
        }
        let lamports = parsed
            .result
            .ok_or_else(|| upstream("solana-rpc", "missing result"))?
            .value;
        Ok(lamports as f64 / 1e9)
    }

    async fn tron(&self, address: &str) -> Result<f64, EdgeError> {
        #[derive(Deserialize)]
        struct AccountsResponse {
            #[serde(default)]
            data: Vec<Account>,
        }
        #[derive(Deserialize)]
        struct Account {
            #[serde(default)]
            balance: u64,
        }

        let url = format!("{}/v1/accounts/{address}", self.endpoints.tron);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(upstream("trongrid", format!("status {}", response.status())));
        }

        let parsed: AccountsResponse = response
            .json()
            .await
            .map_err(|e| upstream("trongrid", e.to_string()))?;
        let sun = parsed.data.first().map(|a| a.balance).unwrap_or(0);
        Ok(sun as f64 / 1e6)
    }

    async fn xrp(&self, address: &str) -> Result<f64, EdgeError> {
        #[derive(Deserialize)]
        struct RpcResponse {
            result: RpcResult,
        }
        #[derive(Deserialize)]
        struct RpcResult {
            #[serde(default)]
            account_data: Option<AccountData>,
            #[serde(default)]
            error: Option<String>,
        }
        #[derive(Deserialize)]
        struct AccountData {
            #[serde(rename = "Balance")]
            balance: String,
        }

        let body = json!({
            "method": "account_info",
            "params": [{
                "account": address,
                "ledger_index": "validated",
            }],
        });
        let response = self.http.post(&self.endpoints.xrp).json(&body).send().await?;
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| upstream("rippled", e.to_string()))?;

        if let Some(error) = parsed.result.error {
            return Err(upstream("rippled", error));
        }
        let drops: f64 = parsed
            .result
            .account_data
            .ok_or_else(|| upstream("rippled", "missing account data"))?
            .balance
            .parse()
            .map_err(|_| upstream("rippled", "non-numeric balance"))?;
        Ok(drops / 1e6)
    }
}
