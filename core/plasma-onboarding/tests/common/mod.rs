//! Shared test helpers for onboarding tests.

#![allow(dead_code)]

use async_trait::async_trait;
use plasma_license::{BanList, LicenseStore, LocalValidator};
use plasma_onboarding::{
    ClientLauncher, LaunchError, LaunchResult, OnboardingFlow, UserId, UserIdIdentity,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// A credential that passes the plausibility check.
pub const GOOD_CREDENTIAL: &str =
    "MTExMjU4NzQ0ODg2MzQ1NjM4Nw.GabcDe.abcdefghijklmnopqrstuvwxyz0123456789";

/// Launcher that reports each launch on a channel.
pub struct RecordingLauncher {
    tx: mpsc::UnboundedSender<(UserId, String)>,
    fail: bool,
}

#[async_trait]
impl ClientLauncher for RecordingLauncher {
    async fn launch(&self, user: UserId, credential: String) -> LaunchResult<()> {
        let _ = self.tx.send((user, credential));
        if self.fail {
            return Err(LaunchError::Rejected("test launcher".into()));
        }
        Ok(())
    }
}

/// A flow over a temporary license store, with the admin store and ban
/// list beside it.
pub struct Harness {
    pub dir: TempDir,
    pub admin: LicenseStore,
    pub bans: BanList,
    pub flow: OnboardingFlow,
    pub launches: mpsc::UnboundedReceiver<(UserId, String)>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn with_failing_launcher() -> Self {
        Self::build(true)
    }

    fn build(fail: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let admin = LicenseStore::open_dir(dir.path()).unwrap();
        let validator = LocalValidator::open_dir(dir.path()).unwrap();
        let bans = BanList::open(admin.paths()).unwrap();
        let (tx, launches) = mpsc::unbounded_channel();
        let flow = OnboardingFlow::new(
            Arc::new(validator),
            Arc::new(RecordingLauncher { tx, fail }),
            Arc::new(UserIdIdentity),
        )
        .with_bans(BanList::open(admin.paths()).unwrap());
        Self {
            dir,
            admin,
            bans,
            flow,
            launches,
        }
    }

    /// Waits for the next launch, failing after a second.
    pub async fn next_launch(&mut self) -> (UserId, String) {
        tokio::time::timeout(Duration::from_secs(1), self.launches.recv())
            .await
            .expect("launcher was not called")
            .expect("launcher channel closed")
    }

    /// Returns true if no launch arrives within a short grace period.
    pub async fn no_launch(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(100), self.launches.recv())
            .await
            .is_err()
    }
}
