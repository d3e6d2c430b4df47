use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// OKX returns numeric fields as strings on some endpoints and as numbers on others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub chain_id: String,
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    pub chain_id: String,
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: String,
    pub auto_slippage: bool,
    pub max_auto_slippage: String,
    pub user_wallet_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMeta {
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub decimal: String,
    #[serde(default)]
    pub token_contract_address: Option<String>,
}

/// First element of the quote endpoint's `data` array (also the swap `routerResult`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub from_token: TokenMeta,
    pub to_token: TokenMeta,
    #[serde(deserialize_with = "string_or_number")]
    pub from_token_amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub to_token_amount: String,
    #[serde(default)]
    pub price_impact_percentage: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Quote {
    pub data: QuoteData,
    /// Full upstream response body
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapTx {
    /// base58-encoded serialized transaction
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapData {
    #[serde(default)]
    pub router_result: Option<Value>,
    pub tx: SwapTx,
}

#[derive(Debug, Clone)]
pub struct SwapExecution {
    pub transaction_id: String,
    pub explorer_url: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexToken {
    #[serde(rename = "tokenSymbol", alias = "symbol", default)]
    pub symbol: String,
    #[serde(rename = "tokenName", alias = "name", default)]
    pub name: String,
    #[serde(rename = "tokenContractAddress", alias = "address", default)]
    pub address: String,
    #[serde(
        alias = "decimal",
        default,
        deserialize_with = "string_or_number"
    )]
    pub decimals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySource {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    #[serde(rename = "chainName", alias = "name", default)]
    pub name: String,
    #[serde(
        rename = "chainId",
        alias = "id",
        default,
        deserialize_with = "string_or_number"
    )]
    pub id: String,
    #[serde(rename = "nativeCurrency", default)]
    pub native_currency: Option<Value>,
}

/// A list endpoint's items plus the body they were read from.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub raw: Value,
}
