//! License key records and the public key string format.
//!
//! Key strings use the format `TYPE-XXXXXXXX-XXXXXXXX-XXXXXXXX`:
//! - `TYPE`: the duration type code (at most 3 characters, e.g. `7D`, `30M`, `PM`)
//! - three 8-character uppercase hex segments sliced from the key's random id

use crate::identity::IdentityHash;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Per-identity redemption cap. Each identity may redeem a key once.
pub const MAX_USES_PER_IDENTITY: u32 = 1;

const SEGMENT_LEN: usize = 8;
const SEGMENTS: usize = 3;

/// Opaque random identifier of a license key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(Uuid);

impl KeyId {
    /// Creates a new random key id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the 32-character lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.simple().to_string()
    }
}

impl Default for KeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The public, shareable license key string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyString(String);

impl KeyString {
    /// Builds the key string for a type code and key id.
    #[must_use]
    pub fn mint(type_code: &str, id: &KeyId) -> Self {
        let hex = id.to_hex().to_uppercase();
        let segments: Vec<&str> = (0..SEGMENTS)
            .map(|i| &hex[i * SEGMENT_LEN..(i + 1) * SEGMENT_LEN])
            .collect();
        Self(format!("{type_code}-{}", segments.join("-")))
    }

    /// Returns the key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the type code segment.
    #[must_use]
    pub fn type_code(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }

    /// Checks the `TYPE-XXXXXXXX-XXXXXXXX-XXXXXXXX` shape without a lookup.
    #[must_use]
    pub fn is_well_formed(candidate: &str) -> bool {
        let parts: Vec<&str> = candidate.split('-').collect();
        if parts.len() != SEGMENTS + 1 {
            return false;
        }

        let type_ok = (1..=crate::duration::TYPE_CODE_LEN).contains(&parts[0].len())
            && parts[0]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

        type_ok
            && parts[1..].iter().all(|segment| {
                segment.len() == SEGMENT_LEN
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            })
    }
}

impl Borrow<str> for KeyString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted license key.
///
/// Only the set of redeeming identities changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseKey {
    id: KeyId,
    #[serde(rename = "type")]
    key_type: String,
    created: DateTime<Utc>,
    expiry: Option<DateTime<Utc>>,
    used_by: Vec<IdentityHash>,
    max_uses: u32,
    #[serde(default)]
    custom_data: Option<serde_json::Value>,
}

impl LicenseKey {
    pub(crate) fn new(
        id: KeyId,
        key_type: String,
        created: DateTime<Utc>,
        expiry: Option<DateTime<Utc>>,
        custom_data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id,
            key_type,
            created,
            expiry,
            used_by: Vec::new(),
            max_uses: MAX_USES_PER_IDENTITY,
            custom_data,
        }
    }

    /// Returns the key id.
    #[must_use]
    pub fn id(&self) -> KeyId {
        self.id
    }

    /// Returns the duration descriptor the key was generated with.
    #[must_use]
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Returns the expiry, or `None` for permanent keys.
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// Identities that have redeemed this key, in redemption order.
    #[must_use]
    pub fn used_by(&self) -> &[IdentityHash] {
        &self.used_by
    }

    /// Returns the per-identity redemption cap.
    #[must_use]
    pub fn max_uses(&self) -> u32 {
        self.max_uses
    }

    /// Returns the caller-supplied payload.
    #[must_use]
    pub fn custom_data(&self) -> Option<&serde_json::Value> {
        self.custom_data.as_ref()
    }

    /// A key is expired strictly after its expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiry, Some(expiry) if now > expiry)
    }

    /// Time left until expiry, or `None` for permanent keys.
    #[must_use]
    pub fn time_remaining_at(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.expiry.map(|expiry| expiry - now)
    }

    /// Returns true if this identity already redeemed the key.
    #[must_use]
    pub fn is_used_by(&self, identity: &IdentityHash) -> bool {
        self.used_by.contains(identity)
    }

    pub(crate) fn record_use(&mut self, identity: IdentityHash) {
        if !self.is_used_by(&identity) {
            self.used_by.push(identity);
        }
    }

    /// Read-only projection used by listings.
    #[must_use]
    pub fn summary(&self, key: &KeyString) -> KeySummary {
        KeySummary {
            key: key.clone(),
            key_type: self.key_type.clone(),
            created: self.created,
            expiry: self.expiry,
            used_count: self.used_by.len(),
            max_uses: self.max_uses,
        }
    }
}

/// Listing entry for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySummary {
    pub key: KeyString,
    #[serde(rename = "type")]
    pub key_type: String,
    pub created: DateTime<Utc>,
    pub expiry: Option<DateTime<Utc>>,
    pub used_count: usize,
    pub max_uses: u32,
}
