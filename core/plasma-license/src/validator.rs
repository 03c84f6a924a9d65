//! Validator strategies for license consumers.
//!
//! A consumer (the onboarding flow, a client launcher) only needs to
//! validate keys and check access. Which backend answers is chosen once at
//! startup from a [`ValidatorConfig`]. Every failure inside a validator
//! becomes a deny, never an error or an implicit grant.

use crate::codes::{CodeBook, CodeRedemption};
use crate::error::LicenseResult;
use crate::store::{Access, RedeemStore, Validation, ValidationReason};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Answers validation and access questions. Infallible by contract.
#[async_trait]
pub trait LicenseValidator: Send + Sync {
    /// Validates `key`, redeeming it for `identity` when given.
    async fn validate(&self, key: &str, identity: Option<&str>) -> Validation;

    /// Reports whether `identity` currently has access.
    async fn check_access(&self, identity: Option<&str>) -> Access;

    /// Redeems a custom code. `None` means `name` is not a code this
    /// validator knows about.
    async fn redeem_code(&self, _name: &str, _identity: &str, _label: &str) -> Option<CodeRedemption> {
        None
    }
}

/// Validator backed by the local encrypted store.
pub struct LocalValidator {
    store: Mutex<RedeemStore>,
    codes: Option<Mutex<CodeBook>>,
}

impl LocalValidator {
    pub fn new(store: RedeemStore) -> Self {
        Self {
            store: Mutex::new(store),
            codes: None,
        }
    }

    /// Enables custom code redemption.
    #[must_use]
    pub fn with_codes(mut self, codes: CodeBook) -> Self {
        self.codes = Some(Mutex::new(codes));
        self
    }

    /// Opens the store and code book under `data_dir`.
    pub fn open_dir(data_dir: impl AsRef<Path>) -> LicenseResult<Self> {
        let store = RedeemStore::open_dir(data_dir)?;
        let codes = CodeBook::open(store.paths())?;
        Ok(Self::new(store).with_codes(codes))
    }
}

#[async_trait]
impl LicenseValidator for LocalValidator {
    async fn validate(&self, key: &str, identity: Option<&str>) -> Validation {
        let mut store = self.store.lock().await;
        store.validate(key.trim(), identity).unwrap_or_else(|e| {
            error!("License store validation failed: {}", e);
            Validation::rejected(ValidationReason::Unavailable)
        })
    }

    async fn check_access(&self, identity: Option<&str>) -> Access {
        let store = self.store.lock().await;
        store.check_access(identity).unwrap_or_else(|e| {
            error!("License store access check failed: {}", e);
            Access::denied()
        })
    }

    async fn redeem_code(&self, name: &str, identity: &str, label: &str) -> Option<CodeRedemption> {
        let codes = self.codes.as_ref()?;
        let mut codes = codes.lock().await;
        let mut store = self.store.lock().await;
        match codes.redeem_code(&mut *store, name, identity, label) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Custom code redemption failed: {}", e);
                Some(CodeRedemption::KeyRejected {
                    reason: ValidationReason::Unavailable,
                })
            }
        }
    }
}

/// Validator that denies everything. Used when no usable backend exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAllValidator;

#[async_trait]
impl LicenseValidator for DenyAllValidator {
    async fn validate(&self, _key: &str, _identity: Option<&str>) -> Validation {
        Validation::rejected(ValidationReason::Unavailable)
    }

    async fn check_access(&self, _identity: Option<&str>) -> Access {
        Access::denied()
    }
}

/// Which validator backs a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ValidatorConfig {
    /// Read and redeem against the encrypted files under `data_dir`.
    Local { data_dir: PathBuf },
    /// Forward to a full-authority license server.
    Remote { url: String, token: String },
}

impl ValidatorConfig {
    /// Builds the configured validator.
    ///
    /// A backend that cannot be set up yields a [`DenyAllValidator`].
    pub fn build(&self) -> Arc<dyn LicenseValidator> {
        match self {
            Self::Local { data_dir } => match LocalValidator::open_dir(data_dir) {
                Ok(validator) => {
                    info!("Using local license validation at {:?}", data_dir);
                    Arc::new(validator)
                }
                Err(e) => {
                    error!("Local license store unusable, denying all access: {}", e);
                    Arc::new(DenyAllValidator)
                }
            },
            Self::Remote { url, token } => Self::build_remote(url, token),
        }
    }

    #[cfg(feature = "online")]
    fn build_remote(url: &str, token: &str) -> Arc<dyn LicenseValidator> {
        match crate::remote::RemoteValidator::new(url, token) {
            Ok(validator) => {
                info!("Using remote license validation at {}", url);
                Arc::new(validator)
            }
            Err(e) => {
                error!("Remote validator misconfigured, denying all access: {}", e);
                Arc::new(DenyAllValidator)
            }
        }
    }

    #[cfg(not(feature = "online"))]
    fn build_remote(url: &str, _token: &str) -> Arc<dyn LicenseValidator> {
        warn!(
            "Remote validation for {} requested but the `online` feature is disabled; denying all access",
            url
        );
        Arc::new(DenyAllValidator)
    }
}
