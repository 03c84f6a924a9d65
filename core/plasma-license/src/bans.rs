//! Users barred from onboarding, sealed next to the custom codes.

use crate::error::LicenseResult;
use crate::sealed::SealedFile;
use crate::store::StorePaths;
use chrono::{DateTime, Utc};
use plasma_crypto::MasterKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Reason recorded when none is given.
pub const DEFAULT_BAN_REASON: &str = "No reason provided";

type BanMap = BTreeMap<u64, BanRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub reason: String,
    pub banned_at: DateTime<Utc>,
}

/// Encrypted map of banned chat user ids.
#[derive(Debug)]
pub struct BanList {
    master_key: MasterKey,
    file: SealedFile,
}

impl BanList {
    pub fn open(paths: &StorePaths) -> LicenseResult<Self> {
        let (master_key, _) = MasterKey::load_or_create(&paths.master_key)?;
        let list = Self {
            master_key,
            file: SealedFile::new(&paths.banned_users),
        };
        list.load()?;
        Ok(list)
    }

    /// Bans `user`, replacing any earlier record. A blank reason is stored
    /// as [`DEFAULT_BAN_REASON`].
    pub fn ban(&mut self, user: u64, reason: &str) -> LicenseResult<BanRecord> {
        self.ban_at(user, reason, Utc::now())
    }

    pub fn ban_at(
        &mut self,
        user: u64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<BanRecord> {
        let reason = match reason.trim() {
            "" => DEFAULT_BAN_REASON.to_string(),
            given => given.to_string(),
        };
        let record = BanRecord {
            reason,
            banned_at: now,
        };

        let mut bans = self.load()?;
        bans.insert(user, record.clone());
        self.save(&bans)?;
        info!("Banned user {}: {}", user, record.reason);
        Ok(record)
    }

    /// Lifts a ban. Returns whether one existed.
    pub fn unban(&mut self, user: u64) -> LicenseResult<bool> {
        let mut bans = self.load()?;
        if bans.remove(&user).is_none() {
            return Ok(false);
        }
        self.save(&bans)?;
        info!("Unbanned user {}", user);
        Ok(true)
    }

    pub fn ban_info(&self, user: u64) -> LicenseResult<Option<BanRecord>> {
        Ok(self.load()?.remove(&user))
    }

    /// All bans, ordered by user id.
    pub fn list(&self) -> LicenseResult<Vec<(u64, BanRecord)>> {
        Ok(self.load()?.into_iter().collect())
    }

    fn load(&self) -> LicenseResult<BanMap> {
        self.file.load(&self.master_key)
    }

    fn save(&self, bans: &BanMap) -> LicenseResult<()> {
        self.file.save(&self.master_key, bans)
    }
}
