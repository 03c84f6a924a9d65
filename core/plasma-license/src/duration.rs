//! Duration grammar for license key generation.
//!
//! Accepts `<amount><unit>` descriptors such as `30mins`, `2h`, `7d`, `1w`,
//! `3mo`, `1y`, and the literals `permanent` / `perm` / `lifetime`.
//!
//! Each descriptor also yields the type code that prefixes the key string.
//! Codes are cut to 3 characters, so `100d` and `1000d` both encode as
//! `100`. Existing key strings depend on this, so it is kept as is.

use crate::error::{LicenseError, LicenseResult};
use chrono::TimeDelta;

/// Maximum length of the type code segment of a key string.
pub const TYPE_CODE_LEN: usize = 3;

/// Type code used for keys without an expiry.
pub const PERMANENT_CODE: &str = "PM";

/// A parsed duration descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDuration {
    /// Offset from creation to expiry, or `None` for permanent keys.
    pub offset: Option<TimeDelta>,
    /// Key string prefix (at most [`TYPE_CODE_LEN`] characters).
    pub type_code: String,
}

impl ParsedDuration {
    /// Returns true if keys with this duration never expire.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.offset.is_none()
    }
}

#[derive(Clone, Copy)]
enum Unit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "min" | "mins" | "minute" | "minutes" | "m" => Some(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Self::Hours),
            "d" | "day" | "days" => Some(Self::Days),
            "w" | "week" | "weeks" => Some(Self::Weeks),
            "month" | "months" | "mo" => Some(Self::Months),
            "y" | "year" | "years" => Some(Self::Years),
            _ => None,
        }
    }

    fn letters(self) -> &'static str {
        match self {
            Self::Minutes => "M",
            Self::Hours => "H",
            Self::Days => "D",
            Self::Weeks => "W",
            Self::Months => "MO",
            Self::Years => "Y",
        }
    }

    fn offset(self, amount: i64) -> Option<TimeDelta> {
        match self {
            Self::Minutes => TimeDelta::try_minutes(amount),
            Self::Hours => TimeDelta::try_hours(amount),
            Self::Days => TimeDelta::try_days(amount),
            Self::Weeks => TimeDelta::try_weeks(amount),
            // Months and years are approximated as 30 and 365 days.
            Self::Months => amount.checked_mul(30).and_then(TimeDelta::try_days),
            Self::Years => amount.checked_mul(365).and_then(TimeDelta::try_days),
        }
    }
}

/// Parses a duration descriptor into an expiry offset and a type code.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidFormat`] if the descriptor is not
/// `<digits><unit>`, names an unknown unit, or overflows.
pub fn parse_duration(spec: &str) -> LicenseResult<ParsedDuration> {
    let normalized = spec.trim().to_lowercase();

    match normalized.as_str() {
        "permanent" | "perm" | "lifetime" => {
            return Ok(ParsedDuration {
                offset: None,
                type_code: PERMANENT_CODE.to_string(),
            });
        }
        // Legacy descriptors with fixed codes.
        "7d" => {
            return Ok(ParsedDuration {
                offset: Some(TimeDelta::days(7)),
                type_code: "7D".to_string(),
            });
        }
        "30d" => {
            return Ok(ParsedDuration {
                offset: Some(TimeDelta::days(30)),
                type_code: "30".to_string(),
            });
        }
        _ => {}
    }

    let split = normalized
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(normalized.len());
    let (digits, suffix) = normalized.split_at(split);

    let well_formed = !digits.is_empty()
        && !suffix.is_empty()
        && suffix.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !well_formed {
        return Err(LicenseError::InvalidFormat(format!(
            "invalid duration format: {spec}. Use formats like '30mins', '2h', '7d', '1w', 'permanent'"
        )));
    }

    let unit = Unit::from_suffix(suffix).ok_or_else(|| {
        LicenseError::InvalidFormat(format!(
            "unknown time unit: {suffix}. Use: mins, h, d, w, month, y, or permanent"
        ))
    })?;

    let amount: i64 = digits
        .parse()
        .map_err(|_| LicenseError::InvalidFormat(format!("duration amount out of range: {digits}")))?;

    let offset = unit
        .offset(amount)
        .ok_or_else(|| LicenseError::InvalidFormat(format!("duration out of range: {spec}")))?;

    let type_code = format!("{amount}{}", unit.letters())
        .chars()
        .take(TYPE_CODE_LEN)
        .collect();

    Ok(ParsedDuration {
        offset: Some(offset),
        type_code,
    })
}
