//! Conversion between integer minor units and human-readable decimal strings.
//!
//! Every view (game list, detail view, summary image, metadata document) goes
//! through [`format_amount`], so the same raw amount always renders the same.
//! Display values are rounded to [`MAX_FRACTION_DIGITS`]; logic that needs
//! exactness keeps working on the raw `u128`.

use std::fmt;

pub const MAX_FRACTION_DIGITS: u32 = 6;

const DISPLAY_SCALE: u128 = 10u128.pow(MAX_FRACTION_DIGITS);

/// Format `amount` minor units of a token with `decimals` precision as an
/// en-US grouped decimal with at most six fractional digits, rounding half up.
pub fn format_amount(amount: u128, decimals: u8) -> String {
    let (whole, micros) = split_display_units(amount, u32::from(decimals));

    let mut out = group_thousands(whole);
    if micros > 0 {
        let digits = format!("{micros:06}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

// (whole units, millionths) of amount / 10^decimals, rounded half up
fn split_display_units(amount: u128, decimals: u32) -> (u128, u128) {
    if decimals <= MAX_FRACTION_DIGITS {
        let scale = 10u128.pow(decimals);
        let up = 10u128.pow(MAX_FRACTION_DIGITS - decimals);
        return (amount / scale, (amount % scale) * up);
    }
    let Some(scale) = 10u128.checked_pow(decimals - MAX_FRACTION_DIGITS) else {
        return (0, 0);
    };
    let quotient = amount / scale;
    let remainder = amount % scale;
    let rounded = if remainder >= scale - remainder {
        quotient + 1
    } else {
        quotient
    };
    (rounded / DISPLAY_SCALE, rounded % DISPLAY_SCALE)
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    Malformed,
    NotPositive,
    TooManyFractionDigits { decimals: u8 },
    Overflow,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "amount is empty"),
            AmountError::Malformed => write!(f, "amount is not a decimal number"),
            AmountError::NotPositive => write!(f, "amount must be greater than zero"),
            AmountError::TooManyFractionDigits { decimals } => {
                write!(f, "amount has more than {decimals} fractional digits")
            }
            AmountError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for AmountError {}

/// Parse a human amount such as `"100.5"` into minor units.
pub fn parse_amount(input: &str, decimals: u8) -> Result<u128, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !all_digits(whole)
        || !all_digits(fraction)
    {
        return Err(AmountError::Malformed);
    }
    if fraction.len() > usize::from(decimals) {
        return Err(AmountError::TooManyFractionDigits { decimals });
    }

    let scale = 10u128
        .checked_pow(u32::from(decimals))
        .ok_or(AmountError::Overflow)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| AmountError::Overflow)?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let pad = 10u128.pow(u32::from(decimals) - fraction.len() as u32);
        fraction.parse::<u128>().map_err(|_| AmountError::Overflow)? * pad
    };
    let raw = whole_units
        .checked_mul(scale)
        .and_then(|units| units.checked_add(fraction_units))
        .ok_or(AmountError::Overflow)?;
    if raw == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(raw)
}
