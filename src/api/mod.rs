//! Typed access to the FMECA review backend.
//!
//! The response models in [`types`] are always available; the HTTP client
//! itself requires the `client` feature.

pub mod types;

#[cfg(feature = "client")]
pub mod client;

// Re-export commonly used types
pub use types::{
    AtmReport, Board, BoardFiles, DatasetInfo, DbStatus, FilterRequest, FmecaResponse, FmecaRow,
    MessageResponse, MissingComponent, NewUser, PasswordChange, ProfileUpdate, RegisterRequest,
    TokenResponse, UploadKind, UploadReceipt, UserProfile, UserQuery, UserUpdate,
};

#[cfg(feature = "client")]
pub use client::{ApiClient, ApiConfig, ApiError, BlockingApiClient};
