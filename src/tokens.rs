use std::collections::HashMap;

use crate::error::{DexError, Result};
use crate::precision;

/// Solana 上的常见代币：(符号, 地址, 小数位数)
const KNOWN_TOKENS: &[(&str, &str, u32)] = &[
    // 原生 SOL
    ("sol", "11111111111111111111111111111111", 9),
    ("usdc", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownToken {
    pub symbol: &'static str,
    pub address: &'static str,
    pub decimals: u32,
}

/// 代币符号到地址的静态映射
pub struct TokenRegistry {
    by_symbol: HashMap<&'static str, KnownToken>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        let by_symbol = KNOWN_TOKENS
            .iter()
            .map(|&(symbol, address, decimals)| {
                (
                    symbol,
                    KnownToken {
                        symbol,
                        address,
                        decimals,
                    },
                )
            })
            .collect();

        TokenRegistry { by_symbol }
    }

    /// 从符号获取代币（不区分大小写）
    pub fn lookup(&self, symbol: &str) -> Option<KnownToken> {
        self.by_symbol.get(symbol.to_lowercase().as_str()).copied()
    }

    /// 从符号获取地址
    pub fn resolve(&self, symbol: &str) -> Option<&'static str> {
        self.lookup(symbol).map(|token| token.address)
    }

    /// Resolves both sides of a pair, reporting every unknown symbol at once.
    pub fn resolve_pair(&self, from: &str, to: &str) -> Result<(KnownToken, KnownToken)> {
        match (self.lookup(from), self.lookup(to)) {
            (Some(from_token), Some(to_token)) => Ok((from_token, to_token)),
            (from_token, to_token) => {
                let requested = [(from, from_token), (to, to_token)]
                    .iter()
                    .filter(|(_, token)| token.is_none())
                    .map(|(symbol, _)| symbol.to_lowercase())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(self.not_found(requested))
            }
        }
    }

    /// 将十进制金额转换为该代币的最小单位
    pub fn to_base_units(&self, amount: &str, symbol: &str) -> Result<String> {
        let token = self
            .lookup(symbol)
            .ok_or_else(|| self.not_found(symbol.to_lowercase()))?;
        precision::to_base_units(amount, token.decimals)
    }

    /// 获取所有已注册的符号（按注册顺序）
    pub fn symbols(&self) -> Vec<&'static str> {
        KNOWN_TOKENS.iter().map(|(symbol, _, _)| *symbol).collect()
    }

    fn not_found(&self, requested: String) -> DexError {
        DexError::TokenNotFound {
            requested,
            available: self.symbols().join(", "),
        }
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}
