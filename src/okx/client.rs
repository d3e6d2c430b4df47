use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::config::Config;
use crate::error::{DexError, Result};
use crate::okx::models::{
    ChainInfo, DexToken, LiquiditySource, Listing, Quote, QuoteData, QuoteParams, SwapData,
    SwapExecution, SwapParams,
};
use crate::okx::DexApi;
use crate::rpc::TransactionSigner;

type HmacSha256 = Hmac<Sha256>;

const QUOTE_PATH: &str = "/api/v5/dex/aggregator/quote";
const SWAP_PATH: &str = "/api/v5/dex/aggregator/swap";
const TOKENS_PATH: &str = "/api/v5/dex/aggregator/all-tokens";
const LIQUIDITY_PATH: &str = "/api/v5/dex/aggregator/get-liquidity";
const CHAINS_PATH: &str = "/api/v5/dex/aggregator/supported/chain";

struct Credentials {
    api_key: String,
    secret_key: String,
    passphrase: String,
    project_id: String,
}

/// Signed HTTP client for the OKX DEX aggregator API
#[derive(Clone)]
pub struct OkxClient {
    inner: Arc<OkxClientInner>,
}

struct OkxClientInner {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    signer: Option<Arc<dyn TransactionSigner>>,
}

impl OkxClient {
    /// Create a new client. Without a signer, quotes and listings work but swaps fail.
    pub fn new(config: &Config, signer: Option<Arc<dyn TransactionSigner>>) -> Result<Self> {
        let base_url = config
            .okx_base_url
            .parse::<Url>()
            .map_err(|_| DexError::ConfigError("Invalid OKX base URL format".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        debug!("OKX DEX client targeting {}", base_url);

        Ok(OkxClient {
            inner: Arc::new(OkxClientInner {
                http,
                base_url,
                credentials: Credentials {
                    api_key: config.api_key.clone(),
                    secret_key: config.secret_key.clone(),
                    passphrase: config.api_passphrase.clone(),
                    project_id: config.project_id.clone(),
                },
                signer,
            }),
        })
    }

    /// base64(HMAC-SHA256(timestamp + method + request_path))
    fn sign(&self, timestamp: &str, method: &str, request_path: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.inner.credentials.secret_key.as_bytes())
            .map_err(|e| DexError::ConfigError(format!("Invalid OKX secret key: {}", e)))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(request_path.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| DexError::ConfigError(format!("Invalid request path {}: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Signed GET returning the full response body once `code` is checked.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.build_url(path, query)?;
        let request_path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };
        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let signature = self.sign(&timestamp, "GET", &request_path)?;

        debug!("GET {}", request_path);

        let credentials = &self.inner.credentials;
        let response = self
            .inner
            .http
            .get(url)
            .header("OK-ACCESS-KEY", &credentials.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", timestamp)
            .header("OK-ACCESS-PASSPHRASE", &credentials.passphrase)
            .header("OK-ACCESS-PROJECT", &credentials.project_id)
            .send()
            .await
            .map_err(|e| {
                error!("OKX DEX request failed: {}", e);
                DexError::NetworkError(format!("OKX DEX request failed: {}", e))
            })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("OKX DEX returned HTTP {} for {}", status, path);
            return Err(DexError::Upstream {
                message: format!("OKX DEX request failed with status {}", status),
                details: serde_json::from_str(&text).ok().or(Some(Value::String(text))),
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| DexError::Upstream {
            message: format!("Malformed OKX DEX response: {}", e),
            details: Some(Value::String(text.clone())),
        })?;

        let code = match body.get("code") {
            Some(Value::String(code)) => code.clone(),
            Some(Value::Number(code)) => code.to_string(),
            _ => String::new(),
        };
        if code != "0" {
            let message = body
                .get("msg")
                .and_then(Value::as_str)
                .filter(|msg| !msg.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("OKX DEX error code {}", code));
            error!("OKX DEX error on {}: {}", path, message);
            return Err(DexError::Upstream {
                message,
                details: Some(body),
            });
        }

        Ok(body)
    }
}

fn data_list<T: DeserializeOwned>(body: &Value) -> Result<Vec<T>> {
    let data = body.get("data").cloned().unwrap_or(Value::Array(vec![]));
    serde_json::from_value(data)
        .map_err(|e| DexError::upstream(format!("Malformed OKX DEX response data: {}", e)))
}

fn first_data<T: DeserializeOwned>(body: &Value) -> Result<T> {
    data_list::<T>(body)?
        .into_iter()
        .next()
        .ok_or_else(|| DexError::upstream("OKX DEX returned no data"))
}

#[async_trait]
impl DexApi for OkxClient {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote> {
        let mut query = vec![
            ("chainId", params.chain_id.clone()),
            ("amount", params.amount.clone()),
            ("fromTokenAddress", params.from_token_address.clone()),
            ("toTokenAddress", params.to_token_address.clone()),
        ];
        if let Some(slippage) = &params.slippage {
            query.push(("slippage", slippage.clone()));
        }

        let raw = self.get(QUOTE_PATH, &query).await?;
        let data: QuoteData = first_data(&raw)?;
        Ok(Quote { data, raw })
    }

    async fn execute_swap(&self, params: &SwapParams) -> Result<SwapExecution> {
        let signer = self.inner.signer.as_ref().ok_or_else(|| {
            DexError::WalletError("SOLANA_PRIVATE_KEY is not configured".to_string())
        })?;

        let query = vec![
            ("chainId", params.chain_id.clone()),
            ("amount", params.amount.clone()),
            ("fromTokenAddress", params.from_token_address.clone()),
            ("toTokenAddress", params.to_token_address.clone()),
            ("slippage", params.slippage.clone()),
            ("autoSlippage", params.auto_slippage.to_string()),
            ("maxAutoSlippage", params.max_auto_slippage.clone()),
            ("userWalletAddress", params.user_wallet_address.clone()),
        ];

        let body = self.get(SWAP_PATH, &query).await?;
        let swap: SwapData = first_data(&body)?;

        let transaction_id = signer.sign_and_send(&swap.tx.data).await?;
        info!("Swap transaction submitted: {}", transaction_id);

        Ok(SwapExecution {
            raw: json!({
                "success": true,
                "transactionId": transaction_id,
                "details": swap.router_result,
            }),
            transaction_id,
            explorer_url: None,
        })
    }

    async fn get_tokens(&self, chain_id: &str) -> Result<Listing<DexToken>> {
        let raw = self
            .get(TOKENS_PATH, &[("chainId", chain_id.to_string())])
            .await?;
        Ok(Listing {
            items: data_list(&raw)?,
            raw,
        })
    }

    async fn get_liquidity(&self, chain_id: &str) -> Result<Listing<LiquiditySource>> {
        let raw = self
            .get(LIQUIDITY_PATH, &[("chainId", chain_id.to_string())])
            .await?;
        Ok(Listing {
            items: data_list(&raw)?,
            raw,
        })
    }

    async fn get_supported_chains(&self, chain_id: &str) -> Result<Listing<ChainInfo>> {
        let raw = self
            .get(CHAINS_PATH, &[("chainId", chain_id.to_string())])
            .await?;
        Ok(Listing {
            items: data_list(&raw)?,
            raw,
        })
    }
}
