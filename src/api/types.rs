//! Request and response models for the review backend.
//!
//! Every endpoint gets an explicit type so that a response of the wrong
//! shape fails at deserialization instead of rendering as empty data.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::risk::BandFilter;

/// Response from `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// A user account as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(deserialize_with = "timestamp")]
    pub updated_at: NaiveDateTime,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub last_login: Option<NaiveDateTime>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

fn default_role() -> String {
    "user".to_string()
}

/// Body of `POST /register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Body of `POST /change-password`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Body of `PUT /users/{username}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Body of `POST /admin/users`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: String,
    pub disabled: bool,
}

/// Body of `PUT /admin/users/{username}`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.disabled.is_none()
            && self.role.is_none()
    }
}

/// Query string of `GET /admin/users`.
#[derive(Debug, Clone, Serialize)]
pub struct UserQuery {
    pub skip: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
            search: None,
            role: None,
        }
    }
}

/// Response of `GET /admin/roles`.
#[derive(Debug, Clone, Deserialize)]
pub struct RolesResponse {
    pub roles: Vec<String>,
}

/// Plain `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// A board in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: u32,
    pub name: String,
    /// Image as a data URL, when one has been uploaded
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub has_fmeca: bool,
    #[serde(default)]
    pub has_coverage: bool,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub has_fmeca_db: bool,
    #[serde(default)]
    pub has_coverage_db: bool,
}

/// Response of `GET /board/{id}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardFiles {
    pub board_id: u32,
    pub board_name: String,
    pub fmeca_exists: bool,
    pub coverage_exists: bool,
    pub image_exists: bool,
    pub fmeca_db_exists: bool,
    pub coverage_db_exists: bool,
}

/// Body of `POST /fmeca-data/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterRequest {
    pub board_id: u32,
    pub filter_type: BandFilter,
}

/// One FMECA risk row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmecaRow {
    #[serde(rename = "ID", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "Component")]
    pub component: String,
    #[serde(rename = "Reference_Designator")]
    pub reference_designator: String,
    /// Kept as text; see [`crate::risk::parse_rpn`]
    #[serde(rename = "RPN", deserialize_with = "string_or_number")]
    pub rpn: String,
    #[serde(rename = "ATM_Coverage", default)]
    pub atm_coverage: Option<String>,
}

/// Response of `POST /fmeca-data/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FmecaResponse {
    #[serde(default)]
    pub data: Vec<FmecaRow>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub message: Option<String>,
    /// Set when the backend failed but still answered 200
    #[serde(default)]
    pub error: Option<String>,
}

/// A component present in the coverage report but absent from FMECA.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MissingComponent {
    pub component: String,
    #[serde(default)]
    pub atm_coverage: Option<String>,
}

/// Response of `GET /atm-check/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AtmReport {
    pub missing_components: Vec<MissingComponent>,
    pub message: String,
}

/// Which dataset an uploaded file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    Fmeca,
    Coverage,
    Image,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Fmeca => "fmeca",
            UploadKind::Coverage => "coverage",
            UploadKind::Image => "image",
        }
    }

    /// Accepted file extensions, lowercase with the leading dot.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Fmeca | UploadKind::Coverage => &[".xlsx", ".xls"],
            UploadKind::Image => &[".png", ".jpg", ".jpeg", ".gif", ".bmp"],
        }
    }

    /// Whether `path` has an extension this kind accepts.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .map(|ext| self.allowed_extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fmeca" => Ok(UploadKind::Fmeca),
            "coverage" => Ok(UploadKind::Coverage),
            "image" => Ok(UploadKind::Image),
            other => Err(format!(
                "unknown file type '{other}' (expected fmeca, coverage or image)"
            )),
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `POST /upload/board/{id}/excel-to-db`.
///
/// Image uploads leave the dataset fields out.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub record_count: Option<usize>,
    #[serde(default)]
    pub stored_size: Option<u64>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub board_id: Option<u32>,
    #[serde(default)]
    pub board_name: Option<String>,
}

/// Latest stored version of one dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInfo {
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub upload_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub record_count: Option<usize>,
}

/// Response of `GET /board/{id}/db-status`.
#[derive(Debug, Clone, Deserialize)]
pub struct DbStatus {
    pub board_id: u32,
    pub board_name: String,
    pub fmeca_in_db: bool,
    pub coverage_in_db: bool,
    #[serde(default)]
    pub fmeca_info: Option<DatasetInfo>,
    #[serde(default)]
    pub coverage_info: Option<DatasetInfo>,
}

/// FastAPI-style error body. `detail` is a string for handled errors and a
/// list of objects for validation failures.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Accept a JSON string or number, keeping it as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Parse a backend timestamp, with or without a UTC offset.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
}

fn timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_timestamp(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'")))
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
    }
}
