//! Integer parsing with an explicit base.

mod integer;

pub use integer::Integer;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseIntError {
    #[error("Base must be between 2 and 36")]
    InvalidBase,
    #[error("Illegal character for the requested base")]
    IllegalChar,
}

/// Parse `text` in `base` (2..=36).
///
/// Signed targets accept one leading `+` or `-`. Letters are
/// case-insensitive. Overflow wraps modulo the width of `T`; empty input is 0.
pub fn parse_int<T: Integer>(text: &str, base: u8) -> Result<T, ParseIntError> {
    parse_int_bytes(text.as_bytes(), base)
}

pub fn parse_int_bytes<T: Integer>(text: &[u8], base: u8) -> Result<T, ParseIntError> {
    if !(2..=36).contains(&base) {
        return Err(ParseIntError::InvalidBase);
    }

    let digits = base.min(10);
    let letters = base.saturating_sub(10);

    let mut negative = false;
    let mut value = T::ZERO;

    for (i, &ch) in text.iter().enumerate() {
        if T::SIGNED && i == 0 && (ch == b'+' || ch == b'-') {
            negative = ch == b'-';
            continue;
        }

        let digit = match ch {
            b'0'..=b'9' if ch - b'0' < digits => ch - b'0',
            b'A'..=b'Z' if ch - b'A' < letters => ch - b'A' + 10,
            b'a'..=b'z' if ch - b'a' < letters => ch - b'a' + 10,
            _ => return Err(ParseIntError::IllegalChar),
        };
        value = value.wrapping_mul(T::from_u8(base)).wrapping_add(T::from_u8(digit));
    }

    Ok(if negative { value.wrapping_neg() } else { value })
}
