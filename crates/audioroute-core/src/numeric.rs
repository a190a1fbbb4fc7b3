//! Integer literals as they appear in config attributes.
//!
//! Accepted forms: decimal, `0x`/`0X` hexadecimal and leading-`0` octal, with
//! an optional sign and optional leading whitespace. Anything after the digits
//! makes the literal invalid.

use crate::error::{Error, Result};

/// Parse an unsigned 32-bit literal. Negative values are rejected.
pub fn parse_u32(s: &str) -> Result<u32> {
    let (negative, magnitude) = parse_literal(s)?;
    if negative && magnitude != 0 {
        return Err(invalid(s));
    }
    u32::try_from(magnitude).map_err(|_| invalid(s))
}

/// Parse a signed 32-bit literal.
pub fn parse_i32(s: &str) -> Result<i32> {
    let (negative, magnitude) = parse_literal(s)?;
    let value = i64::try_from(magnitude).map_err(|_| invalid(s))?;
    let value = if negative { -value } else { value };
    i32::try_from(value).map_err(|_| invalid(s))
}

fn parse_literal(s: &str) -> Result<(bool, u64)> {
    let body = s.trim_start();
    let (negative, body) = match body.as_bytes().first() {
        Some(b'-') => (true, &body[1..]),
        Some(b'+') => (false, &body[1..]),
        _ => (false, body),
    };

    let (radix, digits) = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid(s));
    }

    u64::from_str_radix(digits, radix)
        .map(|v| (negative, v))
        .map_err(|_| invalid(s))
}

fn invalid(s: &str) -> Error {
    Error::InvalidValue(format!("'{s}' is not a valid number"))
}
