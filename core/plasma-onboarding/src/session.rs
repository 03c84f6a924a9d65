//! Per-user onboarding sessions.

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Chat platform user id.
pub type UserId = u64;

/// Default number of sessions kept at once.
pub const DEFAULT_CAPACITY: u64 = 10_000;

/// Default idle time after which a session is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Number of recent message ids remembered for duplicate suppression.
pub const RECENT_MESSAGES: usize = 50;

/// Where a user is in the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a license key or custom code.
    AwaitingLicense,
    /// License accepted; waiting for the client credential.
    AwaitingCredential,
    /// Credential accepted and the client launched.
    Authenticated,
}

/// One user's onboarding session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserId,
    /// Identity string license checks are made against.
    pub identity: String,
    pub state: SessionState,
    recent: VecDeque<i64>,
}

impl Session {
    pub fn new(user: UserId, identity: impl Into<String>, state: SessionState) -> Self {
        Self {
            user,
            identity: identity.into(),
            state,
            recent: VecDeque::with_capacity(RECENT_MESSAGES),
        }
    }

    /// Records a message id. Returns false if it was already seen.
    pub fn mark_seen(&mut self, message_id: i64) -> bool {
        if self.recent.contains(&message_id) {
            return false;
        }
        if self.recent.len() == RECENT_MESSAGES {
            self.recent.pop_front();
        }
        self.recent.push_back(message_id);
        true
    }
}

/// Shared handle to a session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Bounded session map with idle expiry.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<UserId, SessionHandle>,
}

impl SessionStore {
    /// Creates a store holding at most `capacity` sessions, each dropped
    /// after `idle_timeout` without access.
    pub fn new(capacity: u64, idle_timeout: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .time_to_idle(idle_timeout)
            .build();
        Self { sessions }
    }

    pub async fn get(&self, user: UserId) -> Option<SessionHandle> {
        self.sessions.get(&user).await
    }

    /// Stores a session, replacing any existing one for the same user.
    pub async fn insert(&self, session: Session) -> SessionHandle {
        let user = session.user;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(user, Arc::clone(&handle)).await;
        handle
    }

    pub async fn remove(&self, user: UserId) -> Option<SessionHandle> {
        self.sessions.remove(&user).await
    }

    /// Approximate number of live sessions. Call
    /// [`SessionStore::run_pending_tasks`] first for an exact figure.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies pending evictions and expirations.
    pub async fn run_pending_tasks(&self) {
        self.sessions.run_pending_tasks().await;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_IDLE_TIMEOUT)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.entry_count())
            .finish()
    }
}
