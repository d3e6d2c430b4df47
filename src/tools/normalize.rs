use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{DexError, Result};
use crate::okx::{ChainInfo, DexToken, LiquiditySource, Listing, QuoteData, SwapExecution};
use crate::precision;
use crate::tools::envelope::ResponseEnvelope;

/// Only the first entries of a token listing are repeated in `tokens`
pub const TOKEN_SUMMARY_LIMIT: usize = 10;

const EXPLORER_TX_URL: &str = "https://www.okx.com/web3/explorer/sol/tx/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSide {
    pub symbol: String,
    pub decimals: u32,
}

/// A quote with amounts converted out of base units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub from_token: TokenSide,
    pub to_token: TokenSide,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub exchange_rate: Option<Decimal>,
    pub price_impact: String,
}

fn parse_decimals(raw: &str, symbol: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| {
        DexError::upstream(format!(
            "Malformed upstream response: invalid decimals '{}' for {}",
            raw, symbol
        ))
    })
}

fn number(value: Decimal) -> Value {
    value.to_f64().map(Value::from).unwrap_or(Value::Null)
}

impl QuoteResult {
    pub fn from_quote(data: &QuoteData) -> Result<Self> {
        let from_token = TokenSide {
            symbol: data.from_token.token_symbol.clone(),
            decimals: parse_decimals(&data.from_token.decimal, &data.from_token.token_symbol)?,
        };
        let to_token = TokenSide {
            symbol: data.to_token.token_symbol.clone(),
            decimals: parse_decimals(&data.to_token.decimal, &data.to_token.token_symbol)?,
        };

        let from_amount = precision::from_base_units(&data.from_token_amount, from_token.decimals)?;
        let to_amount = precision::from_base_units(&data.to_token_amount, to_token.decimals)?;

        let price_impact = data
            .price_impact_percentage
            .clone()
            .filter(|impact| !impact.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(QuoteResult {
            exchange_rate: precision::exchange_rate(from_amount, to_amount),
            from_token,
            to_token,
            from_amount,
            to_amount,
            price_impact,
        })
    }

    pub fn summary(&self) -> Value {
        json!({
            "fromToken": self.from_token.symbol,
            "toToken": self.to_token.symbol,
            "fromAmount": number(self.from_amount),
            "toAmount": number(self.to_amount),
            "exchangeRate": self.exchange_rate.map(number).unwrap_or(Value::Null),
            "priceImpact": self.price_impact,
        })
    }
}

pub fn swap_summary(quote: &QuoteResult, execution: &SwapExecution) -> Value {
    let explorer_url = execution
        .explorer_url
        .clone()
        .unwrap_or_else(|| format!("{}{}", EXPLORER_TX_URL, execution.transaction_id));

    json!({
        "fromToken": quote.from_token.symbol,
        "toToken": quote.to_token.symbol,
        "fromAmount": number(quote.from_amount),
        "toAmount": number(quote.to_amount),
        "exchangeRate": quote.exchange_rate.map(number).unwrap_or(Value::Null),
        "txId": execution.transaction_id,
        "explorerUrl": explorer_url,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSummary {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySummary {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub name: String,
    pub id: String,
    pub native_currency: Option<Value>,
}

pub fn tokens_envelope(listing: Listing<DexToken>) -> ResponseEnvelope {
    let tokens: Vec<TokenSummary> = listing
        .items
        .iter()
        .map(|token| TokenSummary {
            symbol: token.symbol.clone(),
            name: token.name.clone(),
            address: token.address.clone(),
            decimals: token.decimals.clone(),
        })
        .collect();

    let shown = &tokens[..tokens.len().min(TOKEN_SUMMARY_LIMIT)];

    ResponseEnvelope::success(
        json!(format!("Found {} tokens on Solana via OKX DEX", tokens.len())),
        listing.raw,
    )
    .with_tokens(json!(shown))
}

pub fn liquidity_envelope(listing: Listing<LiquiditySource>) -> ResponseEnvelope {
    let sources: Vec<LiquiditySummary> = listing
        .items
        .into_iter()
        .map(|source| LiquiditySummary {
            name: source.name,
            id: source.id,
        })
        .collect();

    let names = sources
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    ResponseEnvelope::success(
        json!(format!(
            "OKX DEX aggregates {} liquidity sources on Solana: {}",
            sources.len(),
            names
        )),
        json!(sources),
    )
}

pub fn chains_envelope(listing: Listing<ChainInfo>) -> ResponseEnvelope {
    let chains: Vec<ChainSummary> = listing
        .items
        .into_iter()
        .map(|chain| ChainSummary {
            name: chain.name,
            id: chain.id,
            native_currency: chain.native_currency,
        })
        .collect();

    let names = chains
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    ResponseEnvelope::success(
        json!(format!(
            "OKX DEX supports {} chains, including: {}",
            chains.len(),
            names
        )),
        json!(chains),
    )
}
