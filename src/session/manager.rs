//! The session context owned by the authentication boundary.

use super::clock::{Clock, SystemClock};
use super::phase::{SessionPhase, SessionPolicy};
use super::store::{SessionRecord, SessionStore, StoreError};
#[cfg(feature = "client")]
use crate::api::ApiError;
use std::sync::Arc;

/// Owns the session record and decides when it ends.
///
/// Lifecycle: [`login`](Self::login) creates the record,
/// [`extend`](Self::extend) moves its timestamp forward, and
/// [`logout`](Self::logout) or expiry (observed by [`check`](Self::check))
/// removes it. Cloning shares the same store and clock.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    policy: SessionPolicy,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Create a manager using the system clock.
    pub fn new(store: Arc<dyn SessionStore>, policy: SessionPolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn SessionStore>,
        policy: SessionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Start a session for a freshly issued token.
    pub fn login(
        &self,
        access_token: impl Into<String>,
        username: impl Into<String>,
    ) -> Result<SessionRecord, StoreError> {
        let record = SessionRecord {
            access_token: access_token.into(),
            username: username.into(),
            login_timestamp_ms: self.clock.now_ms(),
        };
        self.store.save(&record)?;
        tracing::info!(username = %record.username, "session started");
        Ok(record)
    }

    /// The stored record, without judging whether it is still valid.
    ///
    /// An unreadable store is treated as no session.
    pub fn current(&self) -> Option<SessionRecord> {
        match self.store.load() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Could not read session: {}", e);
                None
            }
        }
    }

    /// Evaluate the current session, ending it if it has expired.
    ///
    /// Returns `None` when nobody is logged in. Checking an active session
    /// has no side effects.
    pub fn check(&self) -> Option<SessionPhase> {
        let record = self.current()?;
        let phase = self
            .policy
            .evaluate(record.login_timestamp_ms, self.clock.now_ms());

        if phase == SessionPhase::Expired {
            tracing::info!(username = %record.username, "session expired");
            self.clear();
        }

        Some(phase)
    }

    /// The bearer token of a session that has not expired.
    pub fn token(&self) -> Option<String> {
        match self.check()? {
            SessionPhase::Expired => None,
            _ => self.current().map(|r| r.access_token),
        }
    }

    /// Restart the session clock from now.
    ///
    /// Returns `false` if there was no live session to extend. The stored
    /// timestamp never moves backward.
    pub fn extend(&self) -> Result<bool, StoreError> {
        let mut record = match self.current() {
            Some(r) => r,
            None => return Ok(false),
        };

        let now = self.clock.now_ms();
        if self.policy.evaluate(record.login_timestamp_ms, now) == SessionPhase::Expired {
            self.clear();
            return Ok(false);
        }

        record.login_timestamp_ms = record.login_timestamp_ms.max(now);
        self.store.save(&record)?;
        tracing::info!(username = %record.username, "session extended");
        Ok(true)
    }

    /// End the session at the user's request.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// End the session because the backend rejected its token.
    pub fn force_logout(&self, reason: &str) {
        tracing::warn!("Forcing logout: {}", reason);
        self.clear();
    }

    /// Pass a backend result through, ending the session if the backend
    /// rejected the token.
    #[cfg(feature = "client")]
    pub fn guard<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.force_logout(&e.to_string());
            }
        }
        result
    }

    fn clear(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Could not clear session: {}", e);
        }
    }
}
