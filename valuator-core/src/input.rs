//! Form-to-number coercion.
//!
//! Raw text typed by a user becomes a validated figure here, before any
//! calculator sees it.

use crate::error::{ensure_finite, Result, ValuationError};

/// Parse a single monetary amount.
///
/// Accepts surrounding whitespace, a leading `$`, and `,` or `_` as
/// thousands separators. Rejects empty text, non-numeric text, NaN and
/// infinities.
pub fn parse_amount(field: &str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValuationError::input(field, "a number is required"));
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let body = body.strip_prefix('$').unwrap_or(body);

    let cleaned: String = body.chars().filter(|c| *c != ',' && *c != '_').collect();
    // "inf"/"nan" parse as f64 but are never amounts
    if cleaned.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return Err(ValuationError::input(
            field,
            format!("'{trimmed}' is not a number"),
        ));
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| ValuationError::input(field, format!("'{trimmed}' is not a number")))?;
    let value = if negative { -value } else { value };

    ensure_finite(field, value)?;
    Ok(value)
}

/// Parse an EBIT/Revenue pair as entered in a form.
///
/// Revenue must be non-zero because the EBIT percentage is undefined
/// otherwise.
pub fn parse_input(ebit_raw: &str, revenue_raw: &str) -> Result<(f64, f64)> {
    let ebit = parse_amount("EBIT", ebit_raw)?;
    let revenue = parse_amount("Revenue", revenue_raw)?;

    if revenue == 0.0 {
        return Err(ValuationError::input(
            "Revenue",
            "must not be zero (EBIT percentage is undefined)",
        ));
    }

    Ok((ebit, revenue))
}
