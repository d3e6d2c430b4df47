use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{DexError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetQuote,
    GetAllTokens,
    GetLiquidity,
    GetSupportedChains,
    ExecuteSwap,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::GetQuote,
        Operation::GetAllTokens,
        Operation::GetLiquidity,
        Operation::GetSupportedChains,
        Operation::ExecuteSwap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetQuote => "getQuote",
            Operation::GetAllTokens => "getAllTokens",
            Operation::GetLiquidity => "getLiquidity",
            Operation::GetSupportedChains => "getSupportedChains",
            Operation::ExecuteSwap => "executeSwap",
        }
    }

    /// "getQuote, getAllTokens, getLiquidity, getSupportedChains, executeSwap"
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(Operation::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DexError::UnknownOperation {
                operation: s.to_string(),
                available: Self::available(),
            })
    }
}

/// `{"operation": ..., "params": ...}` as submitted by the agent
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub operation: Option<String>,
    pub params: Option<Value>,
}

impl StructuredRequest {
    /// `None` unless `input` is a JSON object; everything else is natural language.
    pub fn parse(input: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(input.trim()).ok()?;
        let object = value.as_object()?;

        let operation = match object.get("operation") {
            None | Some(Value::Null) => None,
            Some(Value::String(op)) => Some(op.clone()),
            Some(other) => Some(other.to_string()),
        };
        let params = object.get("params").filter(|p| !p.is_null()).cloned();

        Some(StructuredRequest { operation, params })
    }

    pub fn operation(&self) -> Result<Operation> {
        match self.operation.as_deref() {
            None | Some("") => Err(DexError::MissingOperation(Operation::available())),
            Some(op) => op.parse(),
        }
    }
}

/// Swap or quote parameters; `amount` is in base units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_slippage: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_auto_slippage_bps: Option<String>,
}

fn text_field(params: &Value, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn bool_field(params: &Value, key: &str) -> Option<bool> {
    match params.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl SwapRequest {
    /// Lenient read of agent-supplied params; numbers are accepted where strings are expected.
    pub fn from_params(params: Option<&Value>) -> Self {
        let Some(params) = params else {
            return SwapRequest::default();
        };

        SwapRequest {
            from_token_address: text_field(params, "fromTokenAddress").unwrap_or_default(),
            to_token_address: text_field(params, "toTokenAddress").unwrap_or_default(),
            amount: text_field(params, "amount").unwrap_or_default(),
            slippage: text_field(params, "slippage"),
            auto_slippage: bool_field(params, "autoSlippage"),
            max_auto_slippage_bps: text_field(params, "maxAutoSlippageBps"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.from_token_address.is_empty()
            || self.to_token_address.is_empty()
            || self.amount.is_empty()
        {
            return Err(DexError::MissingParameters);
        }
        // amount 是最小单位的整数
        if !self.amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DexError::InvalidAmount(format!(
                "'{}' is not a whole number of base units",
                self.amount
            )));
        }
        Ok(())
    }
}
