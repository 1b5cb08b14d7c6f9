use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};

use crate::Error;

// Digits of `u128::MAX`
const MAX_BASE_UNITS_DIGITS: i64 = 39;

/// Parses a human decimal amount, rejecting anything that is not a finite non-negative number.
pub fn parse_amount(amount: &str) -> Result<BigDecimal, Error> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with(['-', '+']) {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    // `.5` and `5.` are accepted by the amount input
    let normalized = match (trimmed.starts_with('.'), trimmed.ends_with('.')) {
        (true, _) => format!("0{}", trimmed),
        (_, true) => trimmed.trim_end_matches('.').to_string(),
        _ => trimmed.to_string(),
    };

    if !normalized.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+')) {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    // Signs were refused above, the value is non-negative
    BigDecimal::from_str(&normalized).map_err(|_| Error::InvalidAmount(amount.to_string()))
}

/// Returns true if the amount parses to a strictly positive number.
pub fn is_positive_amount(amount: &str) -> bool {
    parse_amount(amount).is_ok_and(|x| !x.is_zero())
}

/// Converts a human decimal amount into base units, truncating toward zero.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<u128, Error> {
    let value = parse_amount(amount)?;

    let (digits, scale) = value.into_bigint_and_exponent();
    if digits.is_zero() {
        return Ok(0);
    }

    // Bound the power of ten before rescaling, `1e100000000` would otherwise build a huge integer
    let shift = i64::from(decimals).saturating_sub(scale);
    if shift > MAX_BASE_UNITS_DIGITS {
        return Err(Error::InvalidAmount(amount.to_string()));
    }
    if shift < -(digits.to_string().len() as i64) {
        return Ok(0);
    }

    BigDecimal::new(digits, -shift)
        .with_scale(0)
        .to_u128()
        .ok_or_else(|| Error::InvalidAmount(amount.to_string()))
}

/// Converts base units back into a decimal string without trailing zeros.
pub fn from_base_units(amount: u128, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (integer, fraction) = padded.split_at(padded.len() - decimals);

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

/// Converts base units into a floating point amount, used only for display.
pub fn to_ui_amount(amount: u128, decimals: u32) -> f64 {
    amount as f64 / 10_f64.powi(decimals as i32)
}
