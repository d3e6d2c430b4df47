use crate::error::{DexError, Result};
use std::env;
use std::fmt;

pub const DEFAULT_OKX_BASE_URL: &str = "https://www.okx.com";
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
/// OKX chain id for Solana
pub const SOLANA_CHAIN_ID: &str = "501";

#[derive(Clone)]
pub struct Config {
    pub okx_base_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub api_passphrase: String,
    pub project_id: String,
    pub rpc_url: String,
    pub wallet_address: String,
    pub private_key: Option<String>,
    pub chain_id: String,
    pub listen_addr: String,
    /// 0 keeps prepared quotes until they are confirmed or replaced
    pub quote_ttl_secs: i64,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("okx_base_url", &self.okx_base_url)
            .field("api_key", &self.api_key)
            .field("secret_key", &REDACTED)
            .field("api_passphrase", &REDACTED)
            .field("project_id", &self.project_id)
            .field("rpc_url", &self.rpc_url)
            .field("wallet_address", &self.wallet_address)
            .field("private_key", &self.private_key.as_ref().map(|_| REDACTED))
            .field("chain_id", &self.chain_id)
            .field("listen_addr", &self.listen_addr)
            .field("quote_ttl_secs", &self.quote_ttl_secs)
            .finish()
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| DexError::ConfigError(format!("{} not set", name)))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let okx_base_url =
            env::var("OKX_BASE_URL").unwrap_or_else(|_| DEFAULT_OKX_BASE_URL.to_string());
        okx_base_url
            .parse::<url::Url>()
            .map_err(|e| DexError::ConfigError(format!("Invalid OKX_BASE_URL: {}", e)))?;

        let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_SOLANA_RPC_URL.to_string());
        rpc_url
            .parse::<url::Url>()
            .map_err(|e| DexError::ConfigError(format!("Invalid RPC_URL: {}", e)))?;

        let quote_ttl_secs = env::var("QUOTE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<i64>()
            .map_err(|e| DexError::ConfigError(format!("Invalid QUOTE_TTL_SECS: {}", e)))?;

        Ok(Config {
            okx_base_url,
            api_key: required("OKX_API_KEY")?,
            secret_key: required("OKX_SECRET_KEY")?,
            api_passphrase: required("OKX_API_PASSPHRASE")?,
            project_id: required("OKX_PROJECT_ID")?,
            rpc_url,
            wallet_address: required("SOLANA_WALLET_ADDRESS")?,
            private_key: env::var("SOLANA_PRIVATE_KEY").ok(),
            chain_id: env::var("CHAIN_ID").unwrap_or_else(|_| SOLANA_CHAIN_ID.to_string()),
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            quote_ttl_secs: quote_ttl_secs.max(0),
        })
    }

    /// Configuration with placeholder credentials, pointed at `okx_base_url`.
    pub fn from_base_url(okx_base_url: String) -> Self {
        Config {
            okx_base_url,
            api_key: "test-api-key".to_string(),
            secret_key: "test-secret-key".to_string(),
            api_passphrase: "test-passphrase".to_string(),
            project_id: "test-project".to_string(),
            rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
            wallet_address: "11111111111111111111111111111111".to_string(),
            private_key: None,
            chain_id: SOLANA_CHAIN_ID.to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
            quote_ttl_secs: 300,
        }
    }
}
