//! Custom codes: human-chosen aliases over generated license keys.
//!
//! A code such as `WELCOME30` points at one key string. Each code keeps
//! its own per-identity redemption list and an optional expiry of its own,
//! separate from the key's.

use crate::error::{LicenseError, LicenseResult};
use crate::identity::IdentityHash;
use crate::key::KeyString;
use crate::sealed::SealedFile;
use crate::store::{KeyRedeemer, LicenseStore, StorePaths, ValidationReason};
use chrono::{DateTime, TimeDelta, Utc};
use plasma_crypto::MasterKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

type CodeMap = BTreeMap<String, CustomCode>;

/// One redemption of a custom code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUse {
    pub identity: IdentityHash,
    /// Display label of whoever redeemed the code (e.g. a chat first name).
    pub label: String,
    pub redeemed_at: DateTime<Utc>,
}

/// A named alias over one generated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCode {
    pub license_key: KeyString,
    pub duration: String,
    pub created: DateTime<Utc>,
    /// When the code itself stops being redeemable.
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub redemptions: Vec<CodeUse>,
}

impl CustomCode {
    fn redemption_by(&self, identity: &IdentityHash) -> Option<&CodeUse> {
        self.redemptions.iter().find(|u| &u.identity == identity)
    }
}

/// Result of trying to redeem a code that exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRedemption {
    Redeemed {
        duration: String,
        time_remaining: Option<TimeDelta>,
    },
    AlreadyRedeemed {
        redeemed_at: DateTime<Utc>,
    },
    CodeExpired {
        expired_at: DateTime<Utc>,
    },
    KeyRejected {
        reason: ValidationReason,
    },
}

impl CodeRedemption {
    #[must_use]
    pub fn is_redeemed(&self) -> bool {
        matches!(self, Self::Redeemed { .. })
    }
}

/// Encrypted file of custom codes, sealed with the store's master key.
#[derive(Debug)]
pub struct CodeBook {
    master_key: MasterKey,
    file: SealedFile,
}

impl CodeBook {
    /// Opens the code book next to a store.
    pub fn open(paths: &StorePaths) -> LicenseResult<Self> {
        let (master_key, _) = MasterKey::load_or_create(&paths.master_key)?;
        let book = Self {
            master_key,
            file: SealedFile::new(&paths.custom_codes),
        };
        book.load()?;
        Ok(book)
    }

    /// Canonical form of a code name: trimmed and upper-cased.
    #[must_use]
    pub fn normalize(name: &str) -> String {
        name.trim().to_uppercase()
    }

    /// Generates a key for `duration` and publishes it under `name`.
    ///
    /// `validity_days` bounds how long the code itself can be redeemed.
    pub fn create_code(
        &mut self,
        store: &mut LicenseStore,
        name: &str,
        duration: &str,
        validity_days: Option<u32>,
    ) -> LicenseResult<CustomCode> {
        self.create_code_at(store, name, duration, validity_days, Utc::now())
    }

    pub fn create_code_at(
        &mut self,
        store: &mut LicenseStore,
        name: &str,
        duration: &str,
        validity_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> LicenseResult<CustomCode> {
        let name = Self::normalize(name);
        if name.is_empty() {
            return Err(LicenseError::InvalidFormat("code name is empty".to_string()));
        }
        if validity_days == Some(0) {
            return Err(LicenseError::InvalidFormat(
                "validity days must be a positive number".to_string(),
            ));
        }

        let mut codes = self.load()?;
        if codes.contains_key(&name) {
            return Err(LicenseError::CodeExists(name));
        }

        let expiry = validity_days.map(|days| now + TimeDelta::days(i64::from(days)));
        let duration = duration.trim().to_lowercase();
        let license_key = store.generate_at(&duration, None, now)?;

        let code = CustomCode {
            license_key,
            duration,
            created: now,
            expiry,
            redemptions: Vec::new(),
        };
        codes.insert(name.clone(), code.clone());
        self.save(&codes)?;

        info!("Created custom code {} ({})", name, code.duration);
        Ok(code)
    }

    /// Redeems a code for `identity`.
    ///
    /// Returns `None` if `name` is not a known code, so callers can fall
    /// back to treating the input as a plain key string.
    pub fn redeem_code(
        &mut self,
        redeemer: &mut impl KeyRedeemer,
        name: &str,
        identity: &str,
        label: &str,
    ) -> LicenseResult<Option<CodeRedemption>> {
        self.redeem_code_at(redeemer, name, identity, label, Utc::now())
    }

    pub fn redeem_code_at(
        &mut self,
        redeemer: &mut impl KeyRedeemer,
        name: &str,
        identity: &str,
        label: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<Option<CodeRedemption>> {
        let name = Self::normalize(name);
        let mut codes = self.load()?;
        let Some(code) = codes.get_mut(&name) else {
            return Ok(None);
        };

        let hash = IdentityHash::of(identity);
        if let Some(previous) = code.redemption_by(&hash) {
            return Ok(Some(CodeRedemption::AlreadyRedeemed {
                redeemed_at: previous.redeemed_at,
            }));
        }

        if let Some(expiry) = code.expiry {
            if now > expiry {
                return Ok(Some(CodeRedemption::CodeExpired { expired_at: expiry }));
            }
        }

        let validation = redeemer.redeem_at(code.license_key.as_str(), identity, now)?;
        if !validation.is_valid() {
            return Ok(Some(CodeRedemption::KeyRejected {
                reason: validation.reason,
            }));
        }

        code.redemptions.push(CodeUse {
            identity: hash.clone(),
            label: label.to_string(),
            redeemed_at: now,
        });
        let duration = code.duration.clone();
        self.save(&codes)?;

        info!("Custom code {} redeemed by identity {}", name, hash.short());
        Ok(Some(CodeRedemption::Redeemed {
            duration,
            time_remaining: validation.time_remaining,
        }))
    }

    /// Removes a code, returning what it held. The underlying key stays.
    pub fn remove_code(&mut self, name: &str) -> LicenseResult<Option<CustomCode>> {
        let name = Self::normalize(name);
        let mut codes = self.load()?;
        let removed = codes.remove(&name);
        if removed.is_some() {
            self.save(&codes)?;
            info!("Removed custom code {}", name);
        }
        Ok(removed)
    }

    pub fn code_info(&self, name: &str) -> LicenseResult<Option<CustomCode>> {
        Ok(self.load()?.remove(&Self::normalize(name)))
    }

    /// All codes, ordered by name.
    pub fn list_codes(&self) -> LicenseResult<Vec<(String, CustomCode)>> {
        Ok(self.load()?.into_iter().collect())
    }

    fn load(&self) -> LicenseResult<CodeMap> {
        self.file.load(&self.master_key)
    }

    fn save(&self, codes: &CodeMap) -> LicenseResult<()> {
        self.file.save(&self.master_key, codes)
    }
}
