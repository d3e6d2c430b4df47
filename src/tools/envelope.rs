use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::DexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
    QuoteReady,
}

/// The only shape the calling agent ever sees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    fn empty(status: Status) -> Self {
        ResponseEnvelope {
            status,
            message: None,
            summary: None,
            tokens: None,
            details: None,
            data: None,
        }
    }

    pub fn success(summary: Value, data: Value) -> Self {
        ResponseEnvelope {
            summary: Some(summary),
            data: Some(data),
            ..Self::empty(Status::Success)
        }
    }

    pub fn quote_ready(message: impl Into<String>, summary: Value, data: Value) -> Self {
        ResponseEnvelope {
            message: Some(message.into()),
            summary: Some(summary),
            data: Some(data),
            ..Self::empty(Status::QuoteReady)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ResponseEnvelope {
            message: Some(message.into()),
            ..Self::empty(Status::Error)
        }
    }

    pub fn with_tokens(mut self, tokens: Value) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({"status": "error", "message": format!("Failed to serialize response: {}", e)})
        })
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl From<DexError> for ResponseEnvelope {
    fn from(err: DexError) -> Self {
        ResponseEnvelope {
            details: err.details().cloned(),
            ..Self::error(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ready_status_serialization() {
        let envelope = ResponseEnvelope::quote_ready("ok", json!({}), json!({}));
        let value = envelope.to_value();
        assert_eq!(value["status"], "quote_ready");
    }

    #[test]
    fn test_error_envelope_omits_empty_fields() {
        let json = ResponseEnvelope::error("boom").to_json();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, json!({"status": "error", "message": "boom"}));
    }

    #[test]
    fn test_upstream_error_carries_details() {
        let envelope = ResponseEnvelope::from(DexError::Upstream {
            message: "Insufficient liquidity".to_string(),
            details: Some(json!({"code": "82000"})),
        });
        assert!(envelope.is_error());
        assert_eq!(envelope.message.as_deref(), Some("Insufficient liquidity"));
        assert_eq!(envelope.details, Some(json!({"code": "82000"})));
    }
}
