//! Login session lifecycle.
//!
//! This module contains:
//! - The phase policy (active, warning after 25 minutes, expired at 30)
//! - Session persistence behind the `SessionStore` trait
//! - `SessionManager`, the explicit session context
//! - `SessionTimer`, a cancellable worker that enforces expiry

pub mod clock;
pub mod manager;
pub mod phase;
pub mod store;
pub mod timer;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::SessionManager;
pub use phase::{format_countdown, SessionPhase, SessionPolicy};
pub use store::{FileSessionStore, MemorySessionStore, SessionRecord, SessionStore, StoreError};
pub use timer::{SessionEvent, SessionTimer};
