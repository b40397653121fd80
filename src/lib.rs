//! FMECA Review - terminal client for the FMECA-HWATM data-review service.
//!
//! This library provides the client-side logic for browsing board FMECA
//! (Failure Mode, Effects, and Criticality Analysis) data: risk banding of
//! RPN values, ATM coverage classification, login session expiry, and a
//! typed client for the review backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        FMECA Review                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  ApiClient  │──▶│  Analysis   │──▶│    Risk     │         │
//! │  │  (reqwest)  │   │ (view rows) │   │ (classify)  │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         │ 401                                                │
//! │         ▼                                                    │
//! │  ┌─────────────┐   ┌─────────────┐                           │
//! │  │  Session    │◀──│   Session   │                           │
//! │  │  Manager    │   │   Timer     │                           │
//! │  └─────────────┘   └─────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use fmeca_review::risk::{CoverageStatus, RiskBand, RpnLevel};
//!
//! assert_eq!(RpnLevel::classify("72"), RpnLevel::High);
//! assert_eq!(RiskBand::classify("65"), RiskBand::Orange);
//! assert_eq!(RpnLevel::classify("not a number"), RpnLevel::Low);
//! assert_eq!(
//!     CoverageStatus::classify(Some("Partially Tested")),
//!     CoverageStatus::Partial
//! );
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod risk;
pub mod session;

// Re-export key types at crate root for convenience
pub use analysis::{analyze, AdminStats, AnalysisRow, AnalysisSummary, BoardDataStatus};
pub use config::{Config, ConfigError};
pub use risk::{BandFilter, CoverageStatus, RiskBand, RiskRecord, RpnLevel};
pub use session::{
    FileSessionStore, SessionEvent, SessionManager, SessionPhase, SessionPolicy, SessionRecord,
    SessionStore, SessionTimer,
};

// Client re-exports (when enabled)
#[cfg(feature = "client")]
pub use api::{ApiClient, ApiConfig, ApiError, BlockingApiClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
