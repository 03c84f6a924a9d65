//! Transport-agnostic onboarding for Plasma clients.
//!
//! A messaging front end forwards `/start` and text messages to an
//! [`OnboardingFlow`] and sends back the [`Reply`] it gets. The flow
//! validates licenses through a [`plasma_license::LicenseValidator`] and,
//! once a user supplies their client credential, hands it to a
//! [`ClientLauncher`].
//!
//! Sessions live in a bounded cache with idle expiry, so abandoned
//! conversations do not accumulate.

mod error;
mod flow;
mod identity;
mod launcher;
mod reply;
mod session;

pub use error::{LaunchError, LaunchResult};
pub use flow::{MIN_CREDENTIAL_LEN, OnboardingFlow, is_plausible_credential};
pub use identity::{DeviceIdentity, IdentitySource, UserIdIdentity};
pub use launcher::{ClientLauncher, CommandLauncher};
pub use reply::{KEY_FORMAT_HINT, Reply, format_time_remaining};
pub use session::{
    DEFAULT_CAPACITY, DEFAULT_IDLE_TIMEOUT, RECENT_MESSAGES, Session, SessionHandle,
    SessionState, SessionStore, UserId,
};
