use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DexError {
    #[error("Missing operation parameter. Available operations: {0}.")]
    MissingOperation(String),

    #[error("Unknown operation: {operation}. Available operations: {available}.")]
    UnknownOperation { operation: String, available: String },

    #[error("Required parameters missing. Please provide fromTokenAddress, toTokenAddress, and amount.")]
    MissingParameters,

    #[error("Could not find address for one of the tokens: {requested}. Available tokens: {available}")]
    TokenNotFound { requested: String, available: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("I couldn't understand your request. You can ask about tokens, liquidity, chains, get a quote for swapping tokens, or execute a swap.")]
    Unrecognized,

    #[error("No quote has been prepared. Please get a quote first.")]
    NoPendingQuote,

    #[error("The prepared quote expired after {0} seconds. Please get a new quote.")]
    QuoteExpired(i64),

    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<Value>,
    },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Wallet error: {0}")]
    WalletError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Precision error: {0}")]
    PrecisionError(String),
}

impl DexError {
    pub fn upstream(message: impl Into<String>) -> Self {
        DexError::Upstream {
            message: message.into(),
            details: None,
        }
    }

    /// Upstream detail payload, if the failure carried one.
    pub fn details(&self) -> Option<&Value> {
        match self {
            DexError::Upstream { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DexError {
    fn from(e: reqwest::Error) -> Self {
        DexError::NetworkError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DexError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upstream_error_keeps_details() {
        let err = DexError::Upstream {
            message: "Insufficient liquidity".to_string(),
            details: Some(json!({"code": "82000"})),
        };
        assert_eq!(err.to_string(), "Insufficient liquidity");
        assert_eq!(err.details(), Some(&json!({"code": "82000"})));
    }

    #[test]
    fn test_non_upstream_error_has_no_details() {
        assert!(DexError::NoPendingQuote.details().is_none());
    }
}
