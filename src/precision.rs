use rust_decimal::prelude::*;

use crate::error::{DexError, Result};

fn pow10(decimals: u32) -> Result<Decimal> {
    let mut factor = Decimal::ONE;
    for _ in 0..decimals {
        factor = factor
            .checked_mul(Decimal::TEN)
            .ok_or_else(|| DexError::PrecisionError(format!("不支持的小数位数: {}", decimals)))?;
    }
    Ok(factor)
}

/// 将人类可读的十进制金额转换为最小单位的整数字符串
///
/// # 参数
/// * `amount` - 十进制金额，例如 "0.001"
/// * `decimals` - 代币的小数位数（SOL 为 9，USDC 为 6）
///
/// # 示例
/// ```ignore
/// let raw = to_base_units("0.001", 9)?; // 返回 "1000000"
/// ```
pub fn to_base_units(amount: &str, decimals: u32) -> Result<String> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|_| DexError::InvalidAmount(format!("'{}' is not a decimal number", amount)))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(DexError::InvalidAmount(format!(
            "'{}' must not be negative",
            amount
        )));
    }

    let raw = value
        .checked_mul(pow10(decimals)?)
        .ok_or_else(|| DexError::PrecisionError("Multiplication overflow".to_string()))?;

    if !raw.fract().is_zero() {
        return Err(DexError::InvalidAmount(format!(
            "'{}' has more than {} decimal places",
            amount, decimals
        )));
    }

    let raw_u128 = raw
        .to_u128()
        .ok_or_else(|| DexError::PrecisionError("金额过大".to_string()))?;

    Ok(raw_u128.to_string())
}

/// 将最小单位的原始金额转换为十进制金额
pub fn from_base_units(raw_amount: &str, decimals: u32) -> Result<Decimal> {
    let raw = Decimal::from_str(raw_amount.trim()).map_err(|e| {
        DexError::PrecisionError(format!("Failed to parse amount '{}': {}", raw_amount, e))
    })?;

    raw.checked_div(pow10(decimals)?)
        .ok_or_else(|| DexError::PrecisionError("Division overflow".to_string()))
}

/// 兑换率 = 目标金额 / 源金额；源金额为零时返回 None
pub fn exchange_rate(from_amount: Decimal, to_amount: Decimal) -> Option<Decimal> {
    if from_amount.is_zero() {
        return None;
    }
    to_amount.checked_div(from_amount)
}
