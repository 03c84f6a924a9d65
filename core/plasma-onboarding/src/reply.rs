//! Messages sent back to the user.
//!
//! Replies are plain values; a transport renders them with `Display` or
//! matches on them to attach its own buttons and markup.

use chrono::{DateTime, TimeDelta, Utc};
use plasma_license::ValidationReason;
use std::fmt;

/// Example shown when a key is rejected.
pub const KEY_FORMAT_HINT: &str = "30M-XXXXXXXX-XXXXXXXX-XXXXXXXX";

/// Renders a remaining time as days, hours and minutes.
///
/// `None` means the license never expires.
#[must_use]
pub fn format_time_remaining(remaining: Option<TimeDelta>) -> String {
    let Some(remaining) = remaining else {
        return "Permanent license - no expiration".to_string();
    };
    let secs = remaining.num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{days} days, {hours} hours, {minutes} minutes")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Greeting for a user without a license.
    Welcome { label: String },
    /// Greeting for a user whose license is still active.
    WelcomeBack {
        label: String,
        key_type: String,
        time_remaining: Option<TimeDelta>,
    },
    LicenseActivated {
        time_remaining: Option<TimeDelta>,
        identity_prefix: String,
    },
    LicenseRejected { reason: ValidationReason },
    CodeRedeemed {
        code: String,
        duration: String,
        time_remaining: Option<TimeDelta>,
    },
    CodeAlreadyRedeemed {
        code: String,
        redeemed_at: DateTime<Utc>,
    },
    CodeExpired {
        code: String,
        expired_at: DateTime<Utc>,
    },
    CodeRejected {
        code: String,
        reason: ValidationReason,
    },
    CredentialRejected,
    /// Credential accepted; the client is starting.
    Launching,
    /// The user already finished onboarding.
    AlreadyRunning,
    /// A message arrived without a prior `/start`.
    NoSession,
    /// The user is on the ban list.
    Banned { reason: String },
}

impl Reply {
    /// Returns true for replies that move the user forward.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::WelcomeBack { .. }
                | Self::LicenseActivated { .. }
                | Self::CodeRedeemed { .. }
                | Self::Launching
        )
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcome { label } => write!(
                f,
                "Hello {label}! Welcome to Plasma.\n\n\
                 License verification required.\n\
                 Each license works only once per device.\n\n\
                 Please enter your license key or a redeem code:"
            ),
            Self::WelcomeBack {
                label,
                key_type,
                time_remaining,
            } => write!(
                f,
                "Welcome back, {label}!\n\n\
                 Your {key_type} license is active.\n\
                 Time remaining: {}\n\n\
                 Please enter your client token to continue:",
                format_time_remaining(*time_remaining)
            ),
            Self::LicenseActivated {
                time_remaining,
                identity_prefix,
            } => write!(
                f,
                "License activated.\n\n\
                 Expiration: {}\n\
                 Hardware ID: {identity_prefix}...\n\n\
                 Next step: please enter your client token:",
                format_time_remaining(*time_remaining)
            ),
            Self::LicenseRejected { reason } => write!(
                f,
                "That key was not accepted.\n\n\
                 What went wrong: {reason}\n\n\
                 Valid key format: {KEY_FORMAT_HINT}"
            ),
            Self::CodeRedeemed {
                code,
                duration,
                time_remaining,
            } => write!(
                f,
                "Code {code} redeemed.\n\n\
                 Your {duration} license is now active.\n\
                 Time remaining: {}\n\n\
                 Please enter your client token to continue:",
                format_time_remaining(*time_remaining)
            ),
            Self::CodeAlreadyRedeemed { code, redeemed_at } => write!(
                f,
                "You already used code {code} on {}.\n\
                 Each user can only use a code once.",
                redeemed_at.format("%Y-%m-%d %H:%M")
            ),
            Self::CodeExpired { code, expired_at } => write!(
                f,
                "Code {code} expired on {}.\n\
                 Contact an admin for a new code.",
                expired_at.format("%Y-%m-%d %H:%M")
            ),
            Self::CodeRejected { code, reason } => write!(
                f,
                "Code {code} could not be redeemed.\n\
                 Error: {reason}"
            ),
            Self::CredentialRejected => write!(
                f,
                "That token looks wrong.\n\
                 A client token is about 70 characters of letters and numbers.\n\n\
                 Please try again:"
            ),
            Self::Launching => write!(
                f,
                "Configuration complete.\n\n\
                 License validated and token received. Your client is starting..."
            ),
            Self::AlreadyRunning => write!(
                f,
                "Your client is already set up. I'm not expecting any input right now.\n\
                 Use /start to begin again."
            ),
            Self::NoSession => write!(f, "No active session. Please use /start to begin."),
            Self::Banned { reason } => write!(
                f,
                "Access denied.\n\n\
                 You have been banned from using this bot.\n\
                 Reason: {reason}\n\n\
                 Contact an admin if you believe this is an error."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_days_hours_minutes() {
        let remaining = TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::seconds(4 * 60 + 59);
        assert_eq!(
            format_time_remaining(Some(remaining)),
            "2 days, 3 hours, 4 minutes"
        );
    }

    #[test]
    fn banned_reply_names_the_reason() {
        let reply = Reply::Banned {
            reason: "chargeback".into(),
        };
        assert!(!reply.is_success());
        assert!(reply.to_string().contains("Reason: chargeback"));
    }

    #[test]
    fn none_is_permanent() {
        assert_eq!(
            format_time_remaining(None),
            "Permanent license - no expiration"
        );
    }

    #[test]
    fn zero_is_not_permanent() {
        assert_eq!(
            format_time_remaining(Some(TimeDelta::zero())),
            "0 days, 0 hours, 0 minutes"
        );
    }
}
