//! The onboarding state machine.
//!
//! `/start` opens a session. The user then sends a license key (or a
//! custom code), then the client credential, after which the client is
//! launched in the background:
//!
//! ```text
//! AwaitingLicense --key/code--> AwaitingCredential --credential--> Authenticated
//! ```
//!
//! With a [`BanList`] attached, banned users are turned away at `/start`
//! and on every message, and their session is dropped.

use crate::identity::IdentitySource;
use crate::launcher::ClientLauncher;
use crate::reply::Reply;
use crate::session::{Session, SessionState, SessionStore, UserId};
use plasma_license::{
    BanList, BanRecord, CodeBook, CodeRedemption, LicenseError, LicenseResult, LicenseValidator,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Minimum length of an acceptable client credential.
pub const MIN_CREDENTIAL_LEN: usize = 50;

/// Number of identity characters echoed back after activation.
const IDENTITY_PREFIX_LEN: usize = 8;

/// Drives users from `/start` to a launched client.
pub struct OnboardingFlow {
    validator: Arc<dyn LicenseValidator>,
    launcher: Arc<dyn ClientLauncher>,
    identities: Arc<dyn IdentitySource>,
    sessions: SessionStore,
    bans: Option<Mutex<BanList>>,
}

impl OnboardingFlow {
    pub fn new(
        validator: Arc<dyn LicenseValidator>,
        launcher: Arc<dyn ClientLauncher>,
        identities: Arc<dyn IdentitySource>,
    ) -> Self {
        Self {
            validator,
            launcher,
            identities,
            sessions: SessionStore::default(),
            bans: None,
        }
    }

    /// Turns away users on `bans`.
    #[must_use]
    pub fn with_bans(mut self, bans: BanList) -> Self {
        self.bans = Some(Mutex::new(bans));
        self
    }

    /// Replaces the default session store.
    #[must_use]
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles `/start`: opens or resets the session and greets the user.
    ///
    /// Returns `None` if this `/start` message was already handled.
    pub async fn start(&self, user: UserId, message_id: i64, label: &str) -> Option<Reply> {
        let existing = self.sessions.get(user).await;
        if let Some(handle) = &existing {
            if !handle.lock().await.mark_seen(message_id) {
                debug!("Ignoring duplicate /start {} from user {}", message_id, user);
                return None;
            }
        }

        if let Some(reason) = self.ban_reason(user).await {
            self.sessions.remove(user).await;
            return Some(Reply::Banned { reason });
        }

        let identity = self.identities.identity_for(user);
        let access = self.validator.check_access(Some(&identity)).await;

        let (state, reply) = match access.key_type {
            Some(key_type) if access.has_access => (
                SessionState::AwaitingCredential,
                Reply::WelcomeBack {
                    label: label.to_string(),
                    key_type,
                    time_remaining: access.time_remaining,
                },
            ),
            _ => (
                SessionState::AwaitingLicense,
                Reply::Welcome {
                    label: label.to_string(),
                },
            ),
        };

        info!("Onboarding started for user {} ({:?})", user, state);
        match existing {
            Some(handle) => {
                let mut session = handle.lock().await;
                session.identity = identity;
                session.state = state;
            }
            None => {
                let mut session = Session::new(user, identity, state);
                session.mark_seen(message_id);
                self.sessions.insert(session).await;
            }
        }
        Some(reply)
    }

    /// Bans `user` and drops their session.
    ///
    /// # Errors
    ///
    /// [`LicenseError::Config`] if no ban list is attached, or the ban list's
    /// own storage error.
    pub async fn ban(&self, user: UserId, reason: &str) -> LicenseResult<BanRecord> {
        let Some(bans) = &self.bans else {
            return Err(LicenseError::Config("no ban list attached".to_string()));
        };
        let record = bans.lock().await.ban(user, reason)?;
        self.sessions.remove(user).await;
        Ok(record)
    }

    /// A ban list that cannot be read lets users through.
    async fn ban_reason(&self, user: UserId) -> Option<String> {
        let bans = self.bans.as_ref()?.lock().await;
        match bans.ban_info(user) {
            Ok(record) => record.map(|ban| ban.reason),
            Err(e) => {
                warn!("Failed to read ban list: {}", e);
                None
            }
        }
    }

    /// Handles a text message.
    ///
    /// Returns `None` for empty text and for message ids already handled.
    pub async fn handle_text(
        &self,
        user: UserId,
        message_id: i64,
        label: &str,
        text: &str,
    ) -> Option<Reply> {
        let Some(handle) = self.sessions.get(user).await else {
            return Some(Reply::NoSession);
        };

        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut session = handle.lock().await;
        if !session.mark_seen(message_id) {
            debug!("Ignoring duplicate message {} from user {}", message_id, user);
            return None;
        }

        if let Some(reason) = self.ban_reason(user).await {
            drop(session);
            self.sessions.remove(user).await;
            return Some(Reply::Banned { reason });
        }

        let state = session.state;
        let reply = match state {
            SessionState::AwaitingLicense => match self.try_code(&mut session, label, text).await {
                Some(reply) => reply,
                None => self.redeem_key(&mut session, text).await,
            },
            SessionState::AwaitingCredential => self.accept_credential(&mut session, text),
            SessionState::Authenticated => self
                .try_code(&mut session, label, text)
                .await
                .unwrap_or(Reply::AlreadyRunning),
        };
        Some(reply)
    }

    async fn try_code(&self, session: &mut Session, label: &str, text: &str) -> Option<Reply> {
        let outcome = self
            .validator
            .redeem_code(text, &session.identity, label)
            .await?;
        let code = CodeBook::normalize(text);

        let reply = match outcome {
            CodeRedemption::Redeemed {
                duration,
                time_remaining,
            } => {
                info!("User {} redeemed code {}", session.user, code);
                session.state = SessionState::AwaitingCredential;
                Reply::CodeRedeemed {
                    code,
                    duration,
                    time_remaining,
                }
            }
            CodeRedemption::AlreadyRedeemed { redeemed_at } => {
                Reply::CodeAlreadyRedeemed { code, redeemed_at }
            }
            CodeRedemption::CodeExpired { expired_at } => Reply::CodeExpired { code, expired_at },
            CodeRedemption::KeyRejected { reason } => Reply::CodeRejected { code, reason },
        };
        Some(reply)
    }

    async fn redeem_key(&self, session: &mut Session, key: &str) -> Reply {
        let validation = self.validator.validate(key, Some(&session.identity)).await;
        if !validation.is_valid() {
            info!(
                "User {} license rejected: {}",
                session.user, validation.reason
            );
            return Reply::LicenseRejected {
                reason: validation.reason,
            };
        }

        session.state = SessionState::AwaitingCredential;
        info!("User {} activated a license", session.user);
        Reply::LicenseActivated {
            time_remaining: validation.time_remaining,
            identity_prefix: session.identity.chars().take(IDENTITY_PREFIX_LEN).collect(),
        }
    }

    fn accept_credential(&self, session: &mut Session, credential: &str) -> Reply {
        if !is_plausible_credential(credential) {
            return Reply::CredentialRejected;
        }

        session.state = SessionState::Authenticated;

        let launcher = Arc::clone(&self.launcher);
        let user = session.user;
        let credential = credential.to_string();
        tokio::spawn(async move {
            if let Err(e) = launcher.launch(user, credential).await {
                error!("Failed to launch client for user {}: {}", user, e);
            }
        });

        Reply::Launching
    }
}

/// A credential must be long enough and contain at least one digit.
#[must_use]
pub fn is_plausible_credential(credential: &str) -> bool {
    credential.chars().count() >= MIN_CREDENTIAL_LEN && credential.chars().any(|c| c.is_ascii_digit())
}
