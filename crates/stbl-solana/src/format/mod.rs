/// Shown in place of a value that is not available yet
pub const PLACEHOLDER: &str = "···";

/// Price impact above which the widget warns the user, as a fraction
pub const PRICE_IMPACT_WARNING: f64 = 0.01;

fn round_half_away(value: f64, digits: usize) -> f64 {
    let factor = 10_f64.powi(digits as i32);
    (value * factor).round() / factor
}

fn trim_fraction(value: String) -> String {
    if !value.contains('.') {
        return value;
    }

    value.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group_thousands(integer: &str) -> String {
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}", sign, grouped)
}

/// Formats with at most `digits` fraction digits, dropping trailing zeros.
pub fn format_amount(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let formatted = trim_fraction(format!("{:.*}", digits, value));
    match formatted.as_str() {
        "-0" => "0".to_string(),
        _ => formatted,
    }
}

/// Formats with thousands separators and at most `max_fraction_digits` fraction digits.
pub fn format_grouped(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let rounded = round_half_away(value, max_fraction_digits);
    let formatted = format_amount(rounded, max_fraction_digits);

    match formatted.split_once('.') {
        Some((integer, fraction)) => format!("{}.{}", group_thousands(integer), fraction),
        None => group_thousands(&formatted),
    }
}

/// Formats a USD price with a precision that depends on its magnitude.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let formatted = match value {
        x if x >= 1000.0 => format_grouped(x, 0),
        x if x >= 1.0 => format_amount(x, 2),
        x if x >= 0.01 => format_amount(x, 4),
        x => format_amount(x, 6),
    };

    format!("${}", formatted)
}

/// Formats a 24h change, always carrying a sign.
pub fn format_percent(change: f64) -> String {
    if change >= 0.0 {
        format!("+{:.2}%", change)
    } else {
        format!("{:.2}%", change)
    }
}

/// Formats a price impact given as a fraction (0.01 is 1%).
pub fn format_price_impact(fraction: f64) -> String {
    format!("{:.3}%", fraction * 100.0)
}

pub fn is_high_price_impact(fraction: f64) -> bool {
    fraction > PRICE_IMPACT_WARNING
}

/// Shortens a base58 address to its first and last four characters.
pub fn truncate_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();

    format!("{}...{}", head, tail)
}
