pub mod client;
pub mod models;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::error::Result;

pub use client::OkxClient;
pub use models::{
    ChainInfo, DexToken, LiquiditySource, Listing, Quote, QuoteData, QuoteParams, SwapExecution,
    SwapParams,
};

/// Operations consumed from the DEX aggregation service.
#[async_trait]
pub trait DexApi: Send + Sync {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote>;

    /// Builds, signs and submits the swap transaction.
    async fn execute_swap(&self, params: &SwapParams) -> Result<SwapExecution>;

    async fn get_tokens(&self, chain_id: &str) -> Result<Listing<DexToken>>;

    async fn get_liquidity(&self, chain_id: &str) -> Result<Listing<LiquiditySource>>;

    async fn get_supported_chains(&self, chain_id: &str) -> Result<Listing<ChainInfo>>;
}
