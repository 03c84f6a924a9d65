//! Operator commands run directly against the store, outside the HTTP API.

use chrono::{DateTime, Utc};
use plasma_license::{
    BanList, BanRecord, CodeBook, CustomCode, KeyString, KeySummary, LicenseError, LicenseResult,
    LicenseStore,
};
use std::fmt::Write;

/// Upper bound on keys minted by one `generate` command.
pub const MAX_KEYS_PER_REQUEST: u32 = 10;

/// Most recent redemptions shown by [`render_code_info`].
const RECENT_REDEMPTIONS: usize = 5;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Mints `count` keys of the same duration.
pub fn generate_keys(
    store: &mut LicenseStore,
    duration: &str,
    count: u32,
) -> LicenseResult<Vec<KeyString>> {
    if count == 0 || count > MAX_KEYS_PER_REQUEST {
        return Err(LicenseError::InvalidFormat(format!(
            "count must be between 1 and {MAX_KEYS_PER_REQUEST}"
        )));
    }
    (0..count)
        .map(|_| store.generate(duration, None))
        .collect()
}

/// One line per key: key, type, expiry and redemption count.
pub fn render_key_list(keys: &[KeySummary], now: DateTime<Utc>) -> String {
    if keys.is_empty() {
        return "No license keys issued yet.".to_string();
    }

    let mut out = String::new();
    for summary in keys {
        let expiry = match summary.expiry {
            None => "never".to_string(),
            Some(expiry) if now > expiry => format!("expired {}", expiry.format(DATE_FORMAT)),
            Some(expiry) => expiry.format(DATE_FORMAT).to_string(),
        };
        let _ = writeln!(
            out,
            "{}  {:<10}  expires: {:<24}  used by {}",
            summary.key, summary.key_type, expiry, summary.used_count
        );
    }
    out
}

pub fn render_code_list(codes: &[(String, CustomCode)], now: DateTime<Utc>) -> String {
    if codes.is_empty() {
        return "No custom codes created yet.".to_string();
    }

    let mut out = String::new();
    for (name, code) in codes {
        let mut line = format!("{name} - {}", code.duration);
        if code.expiry.is_some_and(|expiry| now > expiry) {
            line.push_str(" (EXPIRED)");
        }
        match code.redemptions.len() {
            0 => {}
            1 => line.push_str(" (used by 1 user)"),
            n => {
                let _ = write!(line, " (used by {n} users)");
            }
        }
        let _ = writeln!(out, "{line}");
    }
    out
}

pub fn render_code_info(name: &str, code: &CustomCode) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Code: {}", CodeBook::normalize(name));
    let _ = writeln!(out, "License key: {}", code.license_key);
    let _ = writeln!(out, "Duration: {}", code.duration);
    let _ = writeln!(out, "Created: {}", code.created.format(DATE_FORMAT));
    match code.expiry {
        Some(expiry) => {
            let _ = writeln!(out, "Code expires: {}", expiry.format(DATE_FORMAT));
        }
        None => {
            let _ = writeln!(out, "Never expires");
        }
    }

    let total = code.redemptions.len();
    if total == 0 {
        let _ = writeln!(out, "Available (no redemptions yet)");
        return out;
    }

    let _ = writeln!(out, "Redemptions ({total}):");
    for redemption in code.redemptions.iter().skip(total.saturating_sub(RECENT_REDEMPTIONS)) {
        let _ = writeln!(
            out,
            "  {} ({}) - {}",
            redemption.label,
            redemption.identity.short(),
            redemption.redeemed_at.format(DATE_FORMAT)
        );
    }
    if total > RECENT_REDEMPTIONS {
        let _ = writeln!(out, "  ... and {} more", total - RECENT_REDEMPTIONS);
    }
    out
}

/// Bans `user` with the reason words joined by spaces.
pub fn ban_user(bans: &mut BanList, user: u64, reason: &[String]) -> LicenseResult<BanRecord> {
    bans.ban(user, &reason.join(" "))
}

pub fn render_ban_list(bans: &[(u64, BanRecord)]) -> String {
    if bans.is_empty() {
        return "No banned users.".to_string();
    }

    let mut out = String::new();
    for (user, ban) in bans {
        let _ = writeln!(
            out,
            "{user}  banned {}  {}",
            ban.banned_at.format(DATE_FORMAT),
            ban.reason
        );
    }
    out
}
