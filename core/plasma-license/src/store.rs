//! File-backed license store.
//!
//! Two mappings are persisted as independently encrypted files under one
//! master key:
//! - issued keys: `KeyString -> LicenseKey`
//! - usage records: `IdentityHash -> UsageRecord`
//!
//! Every operation reads what it needs from disk, and every mutation writes
//! the full mapping back. There is no cross-process locking; the store
//! assumes a single owning process.

use crate::duration::parse_duration;
use crate::error::{LicenseError, LicenseResult};
use crate::identity::IdentityHash;
use crate::key::{KeyId, KeyString, KeySummary, LicenseKey};
use crate::sealed::SealedFile;
use chrono::{DateTime, TimeDelta, Utc};
use plasma_crypto::MasterKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type KeyMap = BTreeMap<KeyString, LicenseKey>;
type UsageMap = BTreeMap<IdentityHash, UsageRecord>;

/// Locations of the store's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub master_key: PathBuf,
    pub valid_keys: PathBuf,
    pub usage: PathBuf,
    pub custom_codes: PathBuf,
    pub banned_users: PathBuf,
}

impl StorePaths {
    /// Standard layout under a data directory.
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            master_key: root.join("licenses").join("master.key"),
            valid_keys: root.join("licenses").join("valid_keys.json"),
            usage: root.join("users").join("used_keys.json"),
            custom_codes: root.join("licenses").join("custom_codes.json"),
            banned_users: root.join("licenses").join("banned_users.json"),
        }
    }
}

/// The identity's most recent redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub key_used: KeyString,
    pub last_used: DateTime<Utc>,
    pub key_type: String,
}

/// Why a validation passed or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    Valid,
    UnknownKey,
    Expired,
    AlreadyUsed,
    /// The local store could not be read.
    Unavailable,
    /// The remote authority could not be reached.
    ServerUnreachable,
    /// Any other reason reported by a remote authority.
    Remote(String),
}

impl ValidationReason {
    /// The user-facing message for this reason.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Valid => "Valid license key",
            Self::UnknownKey => "Invalid or unknown license key",
            Self::Expired => "License key has expired",
            Self::AlreadyUsed => "This key has already been used by this user",
            Self::Unavailable => "License system unavailable",
            Self::ServerUnreachable => "Unable to verify license - server unavailable",
            Self::Remote(message) => message,
        }
    }

    /// Maps a message received over the wire back to a reason.
    #[must_use]
    pub fn from_message(valid: bool, message: &str) -> Self {
        if valid {
            return Self::Valid;
        }
        [Self::UnknownKey, Self::Expired, Self::AlreadyUsed, Self::Unavailable]
            .into_iter()
            .find(|known| known.message() == message)
            .unwrap_or_else(|| Self::Remote(message.to_string()))
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of [`LicenseStore::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: ValidationReason,
    /// Time until expiry; `None` for permanent keys and for failures.
    pub time_remaining: Option<TimeDelta>,
}

impl Validation {
    pub fn accepted(time_remaining: Option<TimeDelta>) -> Self {
        Self {
            reason: ValidationReason::Valid,
            time_remaining,
        }
    }

    pub fn rejected(reason: ValidationReason) -> Self {
        Self {
            reason,
            time_remaining: None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.reason == ValidationReason::Valid
    }
}

/// Outcome of [`LicenseStore::check_access`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Access {
    pub has_access: bool,
    pub key_type: Option<String>,
    /// Time until expiry; `None` when permanent or when denied.
    pub time_remaining: Option<TimeDelta>,
}

impl Access {
    pub fn denied() -> Self {
        Self::default()
    }

    pub fn granted(key_type: impl Into<String>, time_remaining: Option<TimeDelta>) -> Self {
        Self {
            has_access: true,
            key_type: Some(key_type.into()),
            time_remaining,
        }
    }
}

/// Full-authority store: mints, validates, checks, revokes and lists keys.
#[derive(Debug)]
pub struct LicenseStore {
    master_key: MasterKey,
    keys_file: SealedFile,
    usage_file: SealedFile,
    paths: StorePaths,
}

impl LicenseStore {
    /// Opens the store, generating a master key if none exists yet.
    ///
    /// # Errors
    ///
    /// Fails with [`LicenseError::Corrupt`] if either data file exists but
    /// cannot be decrypted with the master key.
    pub fn open(paths: StorePaths) -> LicenseResult<Self> {
        let (master_key, _) = MasterKey::load_or_create(&paths.master_key)?;
        let store = Self {
            master_key,
            keys_file: SealedFile::new(&paths.valid_keys),
            usage_file: SealedFile::new(&paths.usage),
            paths,
        };

        let keys = store.load_keys()?;
        let usage = store.load_usage()?;
        debug!(
            "Opened license store at {:?} ({} keys, {} usage records)",
            store.keys_file.path(),
            keys.len(),
            usage.len()
        );
        Ok(store)
    }

    /// Opens the standard layout under `dir`.
    pub fn open_dir(dir: impl AsRef<Path>) -> LicenseResult<Self> {
        Self::open(StorePaths::in_dir(dir))
    }

    /// Returns the store's file locations.
    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Mints a new key for `duration_spec` and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidFormat`] if the duration does not parse.
    pub fn generate(
        &mut self,
        duration_spec: &str,
        custom_data: Option<serde_json::Value>,
    ) -> LicenseResult<KeyString> {
        self.generate_at(duration_spec, custom_data, Utc::now())
    }

    pub fn generate_at(
        &mut self,
        duration_spec: &str,
        custom_data: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> LicenseResult<KeyString> {
        let parsed = parse_duration(duration_spec)?;
        let expiry = parsed
            .offset
            .map(|offset| {
                now.checked_add_signed(offset).ok_or_else(|| {
                    LicenseError::InvalidFormat(format!("duration out of range: {duration_spec}"))
                })
            })
            .transpose()?;

        let id = KeyId::new();
        let key = KeyString::mint(&parsed.type_code, &id);

        let mut keys = self.load_keys()?;
        keys.insert(
            key.clone(),
            LicenseKey::new(id, duration_spec.to_string(), now, expiry, custom_data),
        );
        self.save_keys(&keys)?;

        info!("Generated {:?} key {}", duration_spec, key);
        Ok(key)
    }

    /// Validates a key, redeeming it for `identity` when one is given.
    ///
    /// Without an identity this is a dry check and never writes.
    pub fn validate(&mut self, key: &str, identity: Option<&str>) -> LicenseResult<Validation> {
        self.validate_at(key, identity, Utc::now())
    }

    pub fn validate_at(
        &mut self,
        key: &str,
        identity: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<Validation> {
        let mut keys = self.load_keys()?;

        let Some((stored_key, record)) = keys.get_key_value(key) else {
            return Ok(Validation::rejected(ValidationReason::UnknownKey));
        };
        let stored_key = stored_key.clone();

        if record.is_expired_at(now) {
            return Ok(Validation::rejected(ValidationReason::Expired));
        }

        let identity = identity.filter(|raw| !raw.is_empty()).map(IdentityHash::of);
        let time_remaining = record.time_remaining_at(now);

        let Some(identity) = identity else {
            debug!("Dry validation of {} succeeded", stored_key);
            return Ok(Validation::accepted(time_remaining));
        };

        if record.is_used_by(&identity) {
            return Ok(Validation::rejected(ValidationReason::AlreadyUsed));
        }

        let Some(record) = keys.get_mut(key) else {
            return Ok(Validation::rejected(ValidationReason::UnknownKey));
        };
        record.record_use(identity.clone());
        let key_type = record.key_type().to_string();

        let mut usage = self.load_usage()?;
        let previous = usage.insert(
            identity.clone(),
            UsageRecord {
                key_used: stored_key.clone(),
                last_used: now,
                key_type,
            },
        );

        // Usage before keys: a key must never list an identity that has no
        // usage record.
        self.save_usage(&usage)?;
        if let Err(e) = self.save_keys(&keys) {
            match previous {
                Some(record) => usage.insert(identity.clone(), record),
                None => usage.remove(&identity),
            };
            if let Err(restore) = self.save_usage(&usage) {
                warn!("Failed to restore usage record after aborted redemption: {}", restore);
            }
            return Err(e);
        }

        info!("Key {} redeemed by identity {}", stored_key, identity.short());
        Ok(Validation::accepted(time_remaining))
    }

    /// Reports whether `identity`'s most recently redeemed key still grants
    /// access. Never writes.
    pub fn check_access(&self, identity: Option<&str>) -> LicenseResult<Access> {
        self.check_access_at(identity, Utc::now())
    }

    pub fn check_access_at(
        &self,
        identity: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<Access> {
        let Some(raw) = identity.filter(|raw| !raw.is_empty()) else {
            return Ok(Access::denied());
        };

        let usage = self.load_usage()?;
        let Some(record) = usage.get(IdentityHash::of(raw).as_str()) else {
            return Ok(Access::denied());
        };

        let keys = self.load_keys()?;
        // A revoked key leaves its usage record behind; the lookup fails here.
        let Some(key) = keys.get(record.key_used.as_str()) else {
            return Ok(Access::denied());
        };

        if key.is_expired_at(now) {
            return Ok(Access::denied());
        }

        Ok(Access::granted(key.key_type(), key.time_remaining_at(now)))
    }

    /// Deletes a key. Returns whether it existed. Usage records are kept.
    pub fn revoke(&mut self, key: &str) -> LicenseResult<bool> {
        let mut keys = self.load_keys()?;
        if keys.remove(key).is_none() {
            return Ok(false);
        }
        self.save_keys(&keys)?;
        info!("Revoked key {}", key);
        Ok(true)
    }

    /// Lists every issued key, oldest first.
    pub fn list(&self) -> LicenseResult<Vec<KeySummary>> {
        let keys = self.load_keys()?;
        let mut summaries: Vec<KeySummary> = keys
            .iter()
            .map(|(key, record)| record.summary(key))
            .collect();
        summaries.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.key.cmp(&b.key)));
        Ok(summaries)
    }

    /// Looks up a single key record.
    pub fn key(&self, key: &str) -> LicenseResult<Option<LicenseKey>> {
        Ok(self.load_keys()?.remove(key))
    }

    /// Looks up the usage record for a raw identity.
    pub fn usage_record(&self, identity: &str) -> LicenseResult<Option<UsageRecord>> {
        Ok(self.load_usage()?.remove(IdentityHash::of(identity).as_str()))
    }

    fn load_keys(&self) -> LicenseResult<KeyMap> {
        self.keys_file.load(&self.master_key)
    }

    fn save_keys(&self, keys: &KeyMap) -> LicenseResult<()> {
        self.keys_file.save(&self.master_key, keys)
    }

    fn load_usage(&self) -> LicenseResult<UsageMap> {
        self.usage_file.load(&self.master_key)
    }

    fn save_usage(&self, usage: &UsageMap) -> LicenseResult<()> {
        self.usage_file.save(&self.master_key, usage)
    }
}

/// Redeem-only view of the store: validates and checks, never mints,
/// revokes or lists.
#[derive(Debug)]
pub struct RedeemStore {
    inner: LicenseStore,
}

impl RedeemStore {
    pub fn open(paths: StorePaths) -> LicenseResult<Self> {
        Ok(Self {
            inner: LicenseStore::open(paths)?,
        })
    }

    pub fn open_dir(dir: impl AsRef<Path>) -> LicenseResult<Self> {
        Self::open(StorePaths::in_dir(dir))
    }

    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        self.inner.paths()
    }

    pub fn validate(&mut self, key: &str, identity: Option<&str>) -> LicenseResult<Validation> {
        self.inner.validate(key, identity)
    }

    pub fn validate_at(
        &mut self,
        key: &str,
        identity: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<Validation> {
        self.inner.validate_at(key, identity, now)
    }

    pub fn check_access(&self, identity: Option<&str>) -> LicenseResult<Access> {
        self.inner.check_access(identity)
    }

    pub fn check_access_at(
        &self,
        identity: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<Access> {
        self.inner.check_access_at(identity, now)
    }
}

impl From<LicenseStore> for RedeemStore {
    fn from(inner: LicenseStore) -> Self {
        Self { inner }
    }
}

/// Anything that can redeem a key for an identity.
pub trait KeyRedeemer {
    fn redeem_at(
        &mut self,
        key: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<Validation>;
}

impl KeyRedeemer for LicenseStore {
    fn redeem_at(
        &mut self,
        key: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<Validation> {
        self.validate_at(key, Some(identity), now)
    }
}

impl KeyRedeemer for RedeemStore {
    fn redeem_at(
        &mut self,
        key: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<Validation> {
        self.inner.validate_at(key, Some(identity), now)
    }
}
