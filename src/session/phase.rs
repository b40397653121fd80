//! Session phases and the timing policy that drives them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing thresholds for a login session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Elapsed time after which the expiry warning is shown
    #[serde(with = "crate::config::duration_serde")]
    pub warn_after: Duration,

    /// Elapsed time after which the session is forcibly ended
    #[serde(with = "crate::config::duration_serde")]
    pub expire_after: Duration,

    /// Countdown refresh cadence while in the warning phase
    #[serde(with = "crate::config::duration_serde")]
    pub countdown_tick: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            warn_after: Duration::from_secs(25 * 60),
            expire_after: Duration::from_secs(30 * 60),
            countdown_tick: Duration::from_secs(1),
        }
    }
}

/// Where a session stands relative to its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Warning { remaining: Duration },
    Expired,
}

impl SessionPolicy {
    /// Elapsed time between login and now. A clock that reads earlier than
    /// the login timestamp counts as no time elapsed.
    pub fn elapsed(&self, login_ms: i64, now_ms: i64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(login_ms).max(0) as u64)
    }

    /// Phase of a session that started at `login_ms`.
    pub fn evaluate(&self, login_ms: i64, now_ms: i64) -> SessionPhase {
        let elapsed = self.elapsed(login_ms, now_ms);

        if elapsed >= self.expire_after {
            SessionPhase::Expired
        } else if elapsed >= self.warn_after {
            SessionPhase::Warning {
                remaining: self.expire_after - elapsed,
            }
        } else {
            SessionPhase::Active
        }
    }

    /// Time until the phase (or the displayed countdown) next changes.
    ///
    /// `None` once the session has expired.
    pub fn next_wake(&self, login_ms: i64, now_ms: i64) -> Option<Duration> {
        let elapsed = self.elapsed(login_ms, now_ms);

        match self.evaluate(login_ms, now_ms) {
            SessionPhase::Active => Some(self.warn_after - elapsed),
            SessionPhase::Warning { remaining } => Some(remaining.min(self.countdown_tick)),
            SessionPhase::Expired => None,
        }
    }
}

/// Format a countdown as `M:SS`, truncating partial seconds.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
