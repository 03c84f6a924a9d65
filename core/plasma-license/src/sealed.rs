//! Encrypted JSON files.
//!
//! A missing file reads as an empty mapping. A file that exists but cannot
//! be decrypted or parsed is reported as [`LicenseError::Corrupt`] instead of
//! being treated as empty.

use crate::error::{LicenseError, LicenseResult};
use plasma_crypto::{MasterKey, seal_str, unseal_str, write_private};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub(crate) struct SealedFile {
    path: PathBuf,
}

impl SealedFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn load<T>(&self, key: &MasterKey) -> LicenseResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let encoded = match fs::read_to_string(&self.path) {
            Ok(encoded) => encoded,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };

        let json = unseal_str(key, &encoded).map_err(|e| self.corrupt(e))?;
        serde_json::from_str(&json).map_err(|e| self.corrupt(e))
    }

    pub(crate) fn save<T: Serialize>(&self, key: &MasterKey, value: &T) -> LicenseResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        let sealed = seal_str(key, &json)?;
        write_private(&self.path, sealed.as_bytes())?;
        Ok(())
    }

    fn corrupt(&self, reason: impl ToString) -> LicenseError {
        LicenseError::Corrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
