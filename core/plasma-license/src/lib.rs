//! License keys for Plasma.
//!
//! This module handles:
//! - Minting time-limited and permanent license keys
//! - Redeeming keys against hashed caller identities
//! - Access checks based on an identity's most recent redemption
//! - Custom codes that alias a generated key under a memorable name
//! - A ban list of chat users refused onboarding
//! - Local and remote validator strategies for license consumers
//!
//! # Design Principles
//!
//! - **Encrypted at rest**: keys, usage records and codes are sealed with a
//!   single master key stored beside them
//! - **No raw identities**: only SHA-256 digests of identities are persisted
//! - **Fail closed**: an unreadable store or unreachable server denies access
//! - **Disk is the source of truth**: every operation re-reads its files
//!
//! # License Key Format
//!
//! Keys are formatted as `TYPE-XXXXXXXX-XXXXXXXX-XXXXXXXX`, where `TYPE` is
//! the duration code (`7D`, `30`, `1W`, `PM`, ...) and the rest is
//! uppercase hex taken from a random key id.

pub mod api;
mod bans;
mod codes;
mod duration;
mod error;
mod identity;
mod key;
mod sealed;
mod store;
mod validator;

#[cfg(feature = "online")]
mod remote;

pub use bans::{BanList, BanRecord, DEFAULT_BAN_REASON};
pub use codes::{CodeBook, CodeRedemption, CodeUse, CustomCode};
pub use duration::{PERMANENT_CODE, ParsedDuration, TYPE_CODE_LEN, parse_duration};
pub use error::{LicenseError, LicenseResult};
pub use identity::{DeviceFingerprint, IdentityHash};
pub use key::{KeyId, KeyString, KeySummary, LicenseKey, MAX_USES_PER_IDENTITY};
pub use store::{
    Access, KeyRedeemer, LicenseStore, RedeemStore, StorePaths, UsageRecord, Validation,
    ValidationReason,
};
pub use validator::{DenyAllValidator, LicenseValidator, LocalValidator, ValidatorConfig};

#[cfg(feature = "online")]
pub use remote::{REQUEST_TIMEOUT, RemoteValidator};
