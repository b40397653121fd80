//! Background worker that enforces session expiry.
//!
//! The worker sleeps until the next moment the session phase (or the
//! warning countdown) can change, and recomputes that deadline whenever
//! it is told the session changed. With no session it blocks on its
//! command channel and does nothing.

use super::manager::SessionManager;
use super::phase::SessionPhase;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Notifications sent to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session is (again) in good standing
    Active,
    /// The session will expire soon; sent on every countdown tick
    Warning { remaining: Duration },
    /// The session ran out and its keys were cleared
    Expired,
    /// The user ended the session
    LoggedOut,
}

enum Command {
    Refresh,
    Extend,
    Logout,
    Stop,
}

/// Handle to the expiry worker. Dropping it stops the worker.
pub struct SessionTimer {
    commands: Sender<Command>,
    events: Receiver<SessionEvent>,
    handle: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// Start watching the session held by `manager`.
    pub fn spawn(manager: SessionManager) -> Self {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("session-timer".to_string())
            .spawn(move || run(manager, command_rx, event_tx))
            .ok();

        if handle.is_none() {
            tracing::error!("Could not start session timer thread");
        }

        Self {
            commands: command_tx,
            events: event_rx,
            handle,
        }
    }

    /// Receiver for session events.
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Re-read the session, e.g. after a login elsewhere in the process.
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    /// Restart the session clock from now.
    pub fn extend(&self) {
        let _ = self.commands.send(Command::Extend);
    }

    /// End the session immediately.
    pub fn logout(&self) {
        let _ = self.commands.send(Command::Logout);
    }

    /// Cancel the pending wake-up and wait for the worker to exit.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::Stop);
            if handle.join().is_err() {
                tracing::error!("Session timer thread panicked");
            }
        }
    }

    /// Whether the worker is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(manager: SessionManager, commands: Receiver<Command>, events: Sender<SessionEvent>) {
    // Last phase reported, so steady states are announced once.
    let mut reported: Option<SessionPhase> = None;

    loop {
        let wait = match manager.check() {
            None => {
                reported = None;
                None
            }
            Some(SessionPhase::Expired) => {
                let _ = events.send(SessionEvent::Expired);
                reported = None;
                None
            }
            Some(phase) => {
                if reported != Some(phase) {
                    let event = match phase {
                        SessionPhase::Warning { remaining } => SessionEvent::Warning { remaining },
                        _ => SessionEvent::Active,
                    };
                    let _ = events.send(event);
                    reported = Some(phase);
                }
                manager.current().and_then(|record| {
                    manager
                        .policy()
                        .next_wake(record.login_timestamp_ms, manager.now_ms())
                })
            }
        };

        let command = match wait {
            Some(delay) => {
                tracing::debug!("session timer sleeping for {:?}", delay);
                match commands.recv_timeout(delay) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => {
                tracing::debug!("session timer idle");
                match commands.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                }
            }
        };

        match command {
            Command::Refresh => {}
            Command::Extend => {
                if let Err(e) = manager.extend() {
                    tracing::warn!("Could not extend session: {}", e);
                }
            }
            Command::Logout => {
                if let Err(e) = manager.logout() {
                    tracing::warn!("Could not clear session on logout: {}", e);
                }
                reported = None;
                let _ = events.send(SessionEvent::LoggedOut);
            }
            Command::Stop => break,
        }
    }

    tracing::debug!("session timer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::phase::SessionPolicy;
    use crate::session::store::{MemorySessionStore, SessionStore};
    use std::sync::Arc;
    use std::time::Instant;

    fn fast_policy() -> SessionPolicy {
        SessionPolicy {
            warn_after: Duration::from_millis(150),
            expire_after: Duration::from_millis(400),
            countdown_tick: Duration::from_millis(50),
        }
    }

    fn wait_for(
        timer: &SessionTimer,
        wanted: impl Fn(&SessionEvent) -> bool,
    ) -> Option<SessionEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Ok(event) = timer.events().recv_timeout(Duration::from_millis(50)) {
                if wanted(&event) {
                    return Some(event);
                }
            }
        }
        None
    }

    #[test]
    fn test_runs_through_to_expiry() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), fast_policy());
        manager.login("tok", "alice").unwrap();

        let timer = SessionTimer::spawn(manager);

        let warning = wait_for(&timer, |e| matches!(e, SessionEvent::Warning { .. }));
        match warning {
            Some(SessionEvent::Warning { remaining }) => {
                assert!(remaining <= Duration::from_millis(250))
            }
            other => panic!("expected warning, got {other:?}"),
        }
        assert_eq!(
            wait_for(&timer, |e| *e == SessionEvent::Expired),
            Some(SessionEvent::Expired)
        );
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_idle_without_session_until_refresh() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(
            store,
            SessionPolicy {
                warn_after: Duration::from_secs(10),
                ..fast_policy()
            },
        );
        let timer = SessionTimer::spawn(manager.clone());

        assert!(timer
            .events()
            .recv_timeout(Duration::from_millis(100))
            .is_err());

        manager.login("tok", "alice").unwrap();
        timer.refresh();
        assert_eq!(
            wait_for(&timer, |_| true),
            Some(SessionEvent::Active)
        );
    }

    #[test]
    fn test_extend_returns_to_active() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(
            store.clone(),
            SessionPolicy {
                warn_after: Duration::from_millis(100),
                expire_after: Duration::from_secs(3),
                countdown_tick: Duration::from_millis(50),
            },
        );
        manager.login("tok", "alice").unwrap();
        let timer = SessionTimer::spawn(manager);

        assert!(wait_for(&timer, |e| matches!(e, SessionEvent::Warning { .. })).is_some());
        timer.extend();
        assert_eq!(
            wait_for(&timer, |e| *e == SessionEvent::Active),
            Some(SessionEvent::Active)
        );
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_logout_clears_session() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), fast_policy());
        manager.login("tok", "alice").unwrap();
        let timer = SessionTimer::spawn(manager);

        timer.logout();
        assert_eq!(
            wait_for(&timer, |e| *e == SessionEvent::LoggedOut),
            Some(SessionEvent::LoggedOut)
        );
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_stop_cancels_pending_wake() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(
            store,
            SessionPolicy {
                warn_after: Duration::from_secs(600),
                expire_after: Duration::from_secs(900),
                countdown_tick: Duration::from_secs(1),
            },
        );
        manager.login("tok", "alice").unwrap();
        let mut timer = SessionTimer::spawn(manager);
        assert!(timer.is_running());

        let started = Instant::now();
        timer.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!timer.is_running());
    }
}
