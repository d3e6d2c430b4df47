//! In-memory `DexApi` used by handler and server tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

use crate::error::{DexError, Result};
use crate::okx::models::{
    ChainInfo, DexToken, LiquiditySource, Listing, Quote, QuoteData, QuoteParams, SwapExecution,
    SwapParams, TokenMeta,
};
use crate::okx::DexApi;

#[derive(Default)]
pub struct MockDexApi {
    /// Every upstream operation invoked, in order
    pub calls: Mutex<Vec<&'static str>>,
    pub quotes: Mutex<Vec<QuoteParams>>,
    pub swaps: Mutex<Vec<SwapParams>>,
    pub token_count: usize,
    pub fail: bool,
    /// Only `execute_swap` fails; quotes still succeed
    pub fail_swaps: bool,
    /// Yield to the executor before submitting a swap, letting concurrent calls interleave
    pub yield_on_swap: bool,
}

impl MockDexApi {
    pub fn new() -> Self {
        Self {
            token_count: 3,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn rejecting_swaps() -> Self {
        Self {
            fail_swaps: true,
            ..Self::new()
        }
    }

    pub fn yielding() -> Self {
        Self {
            yield_on_swap: true,
            ..Self::new()
        }
    }

    pub fn with_tokens(token_count: usize) -> Self {
        Self {
            token_count,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(DexError::Upstream {
                message: "simulated network failure".to_string(),
                details: Some(json!({"code": "50001"})),
            });
        }
        Ok(())
    }
}

pub fn sample_quote_data(amount: &str) -> QuoteData {
    QuoteData {
        from_token: TokenMeta {
            token_symbol: "SOL".to_string(),
            decimal: "9".to_string(),
            token_contract_address: Some("11111111111111111111111111111111".to_string()),
        },
        to_token: TokenMeta {
            token_symbol: "USDC".to_string(),
            decimal: "6".to_string(),
            token_contract_address: Some(
                "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            ),
        },
        from_token_amount: amount.to_string(),
        to_token_amount: "150000".to_string(),
        price_impact_percentage: Some("0.02".to_string()),
    }
}

#[async_trait]
impl DexApi for MockDexApi {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote> {
        self.record("get_quote")?;
        self.quotes.lock().unwrap().push(params.clone());
        let data = sample_quote_data(&params.amount);
        Ok(Quote {
            raw: json!({"code": "0", "msg": "", "data": [data.clone()]}),
            data,
        })
    }

    async fn execute_swap(&self, params: &SwapParams) -> Result<SwapExecution> {
        if self.yield_on_swap {
            tokio::task::yield_now().await;
        }
        self.record("execute_swap")?;
        if self.fail_swaps {
            return Err(DexError::Upstream {
                message: "swap rejected".to_string(),
                details: Some(json!({"code": "82000"})),
            });
        }
        self.swaps.lock().unwrap().push(params.clone());
        Ok(SwapExecution {
            transaction_id: "5sigMockTx".to_string(),
            explorer_url: None,
            raw: json!({"success": true, "transactionId": "5sigMockTx"}),
        })
    }

    async fn get_tokens(&self, _chain_id: &str) -> Result<Listing<DexToken>> {
        self.record("get_tokens")?;
        let items: Vec<DexToken> = (0..self.token_count)
            .map(|i| DexToken {
                symbol: format!("TK{}", i),
                name: format!("Token {}", i),
                address: format!("Addr{}", i),
                decimals: "6".to_string(),
            })
            .collect();
        Ok(Listing {
            raw: json!({"code": "0", "msg": "", "data": items.clone()}),
            items,
        })
    }

    async fn get_liquidity(&self, _chain_id: &str) -> Result<Listing<LiquiditySource>> {
        self.record("get_liquidity")?;
        let items = vec![
            LiquiditySource {
                id: "277".to_string(),
                name: "Raydium".to_string(),
            },
            LiquiditySource {
                id: "278".to_string(),
                name: "Orca".to_string(),
            },
        ];
        Ok(Listing {
            raw: Value::Null,
            items,
        })
    }

    async fn get_supported_chains(&self, _chain_id: &str) -> Result<Listing<ChainInfo>> {
        self.record("get_supported_chains")?;
        Ok(Listing {
            raw: Value::Null,
            items: vec![ChainInfo {
                name: "Solana".to_string(),
                id: "501".to_string(),
                native_currency: Some(json!("SOL")),
            }],
        })
    }
}
