//! Numeric coercion for `greater_than` / `less_than`.
//!
//! Both sides arrive as text. They are parsed with `rust_decimal` so that
//! "0.1" and "0.10" compare equal and no `f64` rounding leaks into a
//! visibility decision. Anything that does not parse makes the comparison
//! false rather than an error.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse user-entered text as a decimal number.
///
/// Leading/trailing whitespace is ignored and scientific notation
/// ("1.5e3") is accepted. Empty text is not a number.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if let Ok(d) = Decimal::from_str(s) {
        return Some(d);
    }
    if s.contains(['e', 'E']) {
        return Decimal::from_scientific(&s.to_ascii_lowercase()).ok();
    }
    None
}

/// Order two texts numerically, or `None` if either is not a number.
pub fn compare_numeric(left: &str, right: &str) -> Option<Ordering> {
    let l = parse_number(left)?;
    let r = parse_number(right)?;
    Some(l.cmp(&r))
}
