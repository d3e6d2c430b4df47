//! Natural-language command classification.
//!
//! Rules are evaluated in the order of [`RULES`]; the first one that matches
//! decides the intent.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Amount and token words pulled out of a swap or quote phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPhrase {
    pub amount: String,
    pub from_token: String,
    pub to_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ConfirmSwap,
    ListTokens,
    ListLiquidity,
    ListChains,
    ExecuteSwap(SwapPhrase),
    GetQuote(SwapPhrase),
    Unrecognized,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::ConfirmSwap => "confirm_swap",
            Intent::ListTokens => "list_tokens",
            Intent::ListLiquidity => "list_liquidity",
            Intent::ListChains => "list_chains",
            Intent::ExecuteSwap(_) => "execute_swap",
            Intent::GetQuote(_) => "get_quote",
            Intent::Unrecognized => "unrecognized",
        }
    }
}

pub struct IntentRule {
    pub name: &'static str,
    matcher: fn(&str) -> Option<Intent>,
}

lazy_static! {
    static ref EXECUTE_RE: Regex = Regex::new(
        r"(?i)(?:swap|exchange|execute\s+swap|send|transfer)\s+(?:for\s+)?(\d+(?:\.\d+)?)\s+([a-z]+)\s+(?:to|into|for)\s+([a-z]+)"
    )
    .unwrap();
    static ref QUOTE_RE: Regex = Regex::new(
        r"(?i)(?:quote|price)\s+(?:for\s+)?(?:(?:swapping|swap|exchanging)\s+)?(\d+(?:\.\d+)?)\s+([a-z]+)\s+(?:to|into|for)\s+([a-z]+)"
    )
    .unwrap();
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

fn swap_phrase(caps: Captures<'_>) -> SwapPhrase {
    SwapPhrase {
        amount: caps[1].to_string(),
        from_token: caps[2].to_lowercase(),
        to_token: caps[3].to_lowercase(),
    }
}

fn confirm(text: &str) -> Option<Intent> {
    (text.contains("confirm") && contains_any(text, &["swap", "transaction"]))
        .then_some(Intent::ConfirmSwap)
}

fn list_tokens(text: &str) -> Option<Intent> {
    text.contains("token").then_some(Intent::ListTokens)
}

fn list_liquidity(text: &str) -> Option<Intent> {
    contains_any(text, &["liquidity", "sources"]).then_some(Intent::ListLiquidity)
}

fn list_chains(text: &str) -> Option<Intent> {
    contains_any(text, &["chain", "network"]).then_some(Intent::ListChains)
}

fn execute_swap(text: &str) -> Option<Intent> {
    if !contains_any(text, &["execute", "swap", "send", "transfer"]) {
        return None;
    }
    EXECUTE_RE
        .captures(text)
        .map(|caps| Intent::ExecuteSwap(swap_phrase(caps)))
}

fn get_quote(text: &str) -> Option<Intent> {
    QUOTE_RE
        .captures(text)
        .map(|caps| Intent::GetQuote(swap_phrase(caps)))
}

/// Execute is checked before quote so "swap 1 sol to usdc" is never just a quote.
pub const RULES: &[IntentRule] = &[
    IntentRule {
        name: "confirm_swap",
        matcher: confirm,
    },
    IntentRule {
        name: "list_tokens",
        matcher: list_tokens,
    },
    IntentRule {
        name: "list_liquidity",
        matcher: list_liquidity,
    },
    IntentRule {
        name: "list_chains",
        matcher: list_chains,
    },
    IntentRule {
        name: "execute_swap",
        matcher: execute_swap,
    },
    IntentRule {
        name: "get_quote",
        matcher: get_quote,
    },
];

pub fn parse(text: &str) -> Intent {
    let text = text.to_lowercase();
    RULES
        .iter()
        .find_map(|rule| (rule.matcher)(&text))
        .unwrap_or(Intent::Unrecognized)
}
