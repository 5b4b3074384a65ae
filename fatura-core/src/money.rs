//! pt-BR currency codec.
//!
//! Statements print amounts as `1.234,56` (dot thousands, comma decimal) with
//! an optional leading sign. Values are carried as [`Decimal`] and never as
//! binary floating point.

use rust_decimal::Decimal;

use crate::error::MoneyError;

/// Parse a pt-BR amount such as `"9.139,39"`, `"-12,34"` or `"- 0,02"`.
pub fn parse_brl(raw: &str) -> Result<Decimal, MoneyError> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();

    let (negative, digits) = match compact.as_bytes().first() {
        Some(b'-') => (true, &compact[1..]),
        Some(b'+') => (false, &compact[1..]),
        _ => (false, compact.as_str()),
    };

    let (int_part, frac_part) = digits
        .split_once(',')
        .ok_or_else(|| MoneyError::Invalid(raw.to_string()))?;

    if frac_part.len() != 2 || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::Invalid(raw.to_string()));
    }
    if !valid_grouping(int_part) {
        return Err(MoneyError::Invalid(raw.to_string()));
    }

    let plain = format!("{}.{}", int_part.replace('.', ""), frac_part);
    let value = Decimal::from_str_exact(&plain).map_err(|_| MoneyError::Invalid(raw.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// `1`, `12`, `123`, `1.234`, `12.345.678`; bare digit runs are accepted too.
fn valid_grouping(int_part: &str) -> bool {
    if int_part.is_empty() {
        return false;
    }
    let groups: Vec<&str> = int_part.split('.').collect();
    if groups.len() == 1 {
        return groups[0].bytes().all(|b| b.is_ascii_digit());
    }
    let head_ok = (1..=3).contains(&groups[0].len()) && groups[0].bytes().all(|b| b.is_ascii_digit());
    head_ok
        && groups[1..]
            .iter()
            .all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Format as pt-BR with two fractional digits: `9139.39` -> `"9.139,39"`.
pub fn format_brl(value: Decimal) -> String {
    let fixed = format_plain(value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{frac_part}")
}

/// Fixed-point with a dot decimal: `9139.39` -> `"9139.39"`.
pub fn format_plain(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    // -0.00 prints as 0.00
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{rounded:.2}")
}
