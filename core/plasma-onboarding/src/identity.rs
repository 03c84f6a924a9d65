//! Which identity string a user's license checks are made against.

use crate::session::UserId;
use plasma_license::DeviceFingerprint;

/// Maps a chat user to the identity their license is bound to.
pub trait IdentitySource: Send + Sync {
    fn identity_for(&self, user: UserId) -> String;
}

/// Binds every user to this machine's fingerprint.
///
/// Suits a single-operator deployment where the licensed client runs on
/// the same host as the onboarding flow.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    fingerprint: DeviceFingerprint,
}

impl DeviceIdentity {
    #[must_use]
    pub fn current() -> Self {
        Self {
            fingerprint: DeviceFingerprint::generate(),
        }
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::current()
    }
}

impl IdentitySource for DeviceIdentity {
    fn identity_for(&self, _user: UserId) -> String {
        self.fingerprint.id().to_string()
    }
}

/// Binds each user to their own chat user id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserIdIdentity;

impl IdentitySource for UserIdIdentity {
    fn identity_for(&self, user: UserId) -> String {
        format!("user:{user}")
    }
}
