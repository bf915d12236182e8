//! Pairing PIN parsing.

use hknest_domain::error::ValidationError;

use crate::error::HapError;

/// Parse a pairing PIN written `XXXXXXXX` or `XXX-XX-XXX` into its digits.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPin`] unless the input holds exactly
/// eight digits, optionally grouped 3-2-3 by dashes.
pub fn parse_digits(raw: &str) -> Result<[u8; 8], ValidationError> {
    let invalid = || ValidationError::InvalidPin(raw.to_string());

    let compact: String = match raw.len() {
        8 => raw.to_string(),
        10 if raw.as_bytes()[3] == b'-' && raw.as_bytes()[6] == b'-' => raw.replace('-', ""),
        _ => return Err(invalid()),
    };

    let mut digits = [0u8; 8];
    let mut chars = compact.chars();
    for slot in &mut digits {
        let digit = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)?;
        *slot = u8::try_from(digit).map_err(|_| invalid())?;
    }
    if chars.next().is_some() {
        return Err(invalid());
    }
    Ok(digits)
}

/// Parse and validate a pairing PIN for the HAP library.
///
/// # Errors
///
/// Returns [`HapError::Domain`] for a malformed PIN and [`HapError::Hap`]
/// for a PIN the library refuses (`12345678`, repeated digits, …).
pub fn parse(raw: &str) -> Result<hap::Pin, HapError> {
    let digits = parse_digits(raw)?;
    Ok(hap::Pin::new(digits)?)
}
