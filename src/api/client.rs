//! HTTP client for the FMECA review backend.

use super::types::{
    AtmReport, Board, BoardFiles, DbStatus, ErrorBody, FilterRequest, FmecaResponse,
    MessageResponse, NewUser, PasswordChange, ProfileUpdate, RegisterRequest, RolesResponse,
    TokenResponse, UploadKind, UploadReceipt, UserProfile, UserQuery, UserUpdate,
};
use crate::config::Config;
use crate::risk::BandFilter;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a new API configuration.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Build the API configuration from the client configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    /// Build an endpoint URL from path segments. Segments are
    /// percent-encoded, so usernames may contain any character.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Config(format!("Invalid base URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("Base URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// API client error types.
#[derive(Debug)]
pub enum ApiError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Token missing, expired or rejected (HTTP 401)
    Unauthorized(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// Server answered 200 but reported a failure in the body
    Backend(String),
    /// Response did not have the expected shape
    Serialization(String),
    /// Upload rejected before sending
    InvalidUpload(String),
}

impl ApiError {
    /// Whether this error must end the local session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "API config error: {msg}"),
            ApiError::Network(msg) => write!(f, "API network error: {msg}"),
            ApiError::Unauthorized(msg) => write!(f, "Not authorized: {msg}"),
            ApiError::Server { status, message } => {
                write!(f, "API server error ({status}): {message}")
            }
            ApiError::Backend(msg) => write!(f, "Backend reported an error: {msg}"),
            ApiError::Serialization(msg) => write!(f, "API serialization error: {msg}"),
            ApiError::InvalidUpload(msg) => write!(f, "Invalid upload: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Async client for the review backend.
pub struct ApiClient {
    config: ApiConfig,
    client: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new, unauthenticated client.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("fmeca-review/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            token: None,
        })
    }

    /// Attach a bearer token to every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.config.endpoint(segments)?;
        tracing::debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message())
                .unwrap_or_else(|_| {
                    if body.is_empty() {
                        status.canonical_reason().unwrap_or("Unknown error").to_string()
                    } else {
                        body.clone()
                    }
                });

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized(message));
            }
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// Test connection to the backend.
    pub async fn test_connection(&self) -> Result<bool, ApiError> {
        let response = self
            .request(Method::GET, &[])?
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    // ---- Authentication ----

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = self
            .request(Method::POST, &["token"])?
            .form(&[("username", username), ("password", password)]);
        self.send(request).await
    }

    /// Create a new account.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::POST, &["register"])?.json(registration);
        self.send(request).await
    }

    /// Check the current token and return its user.
    pub async fn verify_token(&self) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::GET, &["verify-token"])?;
        self.send(request).await
    }

    pub async fn change_password(
        &self,
        change: &PasswordChange,
    ) -> Result<MessageResponse, ApiError> {
        let request = self.request(Method::POST, &["change-password"])?.json(change);
        self.send(request).await
    }

    pub async fn update_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .request(Method::PUT, &["users", username])?
            .json(update);
        self.send(request).await
    }

    // ---- Boards and analysis ----

    /// List the board catalog.
    pub async fn boards(&self) -> Result<Vec<Board>, ApiError> {
        let request = self.request(Method::GET, &["boards"])?;
        self.send(request).await
    }

    pub async fn board_files(&self, board_id: u32) -> Result<BoardFiles, ApiError> {
        let id = board_id.to_string();
        let request = self.request(Method::GET, &["board", &id, "files"])?;
        self.send(request).await
    }

    /// Fetch FMECA rows for a board, filtered by band on the server.
    pub async fn fmeca_data(
        &self,
        board_id: u32,
        filter: BandFilter,
    ) -> Result<FmecaResponse, ApiError> {
        let id = board_id.to_string();
        let request = self
            .request(Method::POST, &["fmeca-data", &id])?
            .json(&FilterRequest {
                board_id,
                filter_type: filter,
            });

        let response: FmecaResponse = self.send(request).await?;
        if let Some(error) = response.error {
            return Err(ApiError::Backend(error));
        }
        Ok(response)
    }

    /// Components in the coverage report that FMECA does not list.
    pub async fn atm_check(&self, board_id: u32) -> Result<AtmReport, ApiError> {
        let id = board_id.to_string();
        let request = self.request(Method::GET, &["atm-check", &id])?;
        self.send(request).await
    }

    pub async fn db_status(&self, board_id: u32) -> Result<DbStatus, ApiError> {
        let id = board_id.to_string();
        let request = self.request(Method::GET, &["board", &id, "db-status"])?;
        self.send(request).await
    }

    /// Upload a dataset or image for a board.
    pub async fn upload(
        &self,
        board_id: u32,
        kind: UploadKind,
        path: &Path,
    ) -> Result<UploadReceipt, ApiError> {
        if !kind.accepts(path) {
            return Err(ApiError::InvalidUpload(format!(
                "{} files must be one of {}",
                kind,
                kind.allowed_extensions().join(", ")
            )));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ApiError::InvalidUpload(format!("{path:?} is not a file")))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::InvalidUpload(format!("Could not read {path:?}: {e}")))?;

        tracing::info!(board_id, kind = %kind, size = bytes.len(), "uploading {}", file_name);

        let form = reqwest::multipart::Form::new()
            .text("file_type", kind.as_str())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let id = board_id.to_string();
        let request = self
            .request(Method::POST, &["upload", "board", &id, "excel-to-db"])?
            .multipart(form);
        self.send(request).await
    }

    // ---- Administration ----

    pub async fn list_users(&self, query: &UserQuery) -> Result<Vec<UserProfile>, ApiError> {
        let request = self.request(Method::GET, &["admin", "users"])?.query(query);
        self.send(request).await
    }

    pub async fn get_user(&self, username: &str) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::GET, &["admin", "users", username])?;
        self.send(request).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::POST, &["admin", "users"])?.json(user);
        self.send(request).await
    }

    pub async fn update_user(
        &self,
        username: &str,
        update: &UserUpdate,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .request(Method::PUT, &["admin", "users", username])?
            .json(update);
        self.send(request).await
    }

    pub async fn enable_user(&self, username: &str) -> Result<MessageResponse, ApiError> {
        let request = self.request(Method::PUT, &["admin", "users", username, "enable"])?;
        self.send(request).await
    }

    pub async fn disable_user(&self, username: &str) -> Result<MessageResponse, ApiError> {
        let request = self.request(Method::PUT, &["admin", "users", username, "disable"])?;
        self.send(request).await
    }

    pub async fn delete_user(&self, username: &str) -> Result<MessageResponse, ApiError> {
        let request = self.request(Method::DELETE, &["admin", "users", username])?;
        self.send(request).await
    }

    pub async fn roles(&self) -> Result<Vec<String>, ApiError> {
        let request = self.request(Method::GET, &["admin", "roles"])?;
        let response: RolesResponse = self.send(request).await?;
        Ok(response.roles)
    }
}

/// Blocking API client for use in synchronous contexts.
pub struct BlockingApiClient {
    inner: ApiClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingApiClient {
    /// Create a new blocking API client.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: ApiClient::new(config)?,
            runtime,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    pub fn test_connection(&self) -> Result<bool, ApiError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    pub fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        self.runtime.block_on(self.inner.login(username, password))
    }

    pub fn register(&self, registration: &RegisterRequest) -> Result<UserProfile, ApiError> {
        self.runtime.block_on(self.inner.register(registration))
    }

    pub fn verify_token(&self) -> Result<UserProfile, ApiError> {
        self.runtime.block_on(self.inner.verify_token())
    }

    pub fn change_password(&self, change: &PasswordChange) -> Result<MessageResponse, ApiError> {
        self.runtime.block_on(self.inner.change_password(change))
    }

    pub fn update_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        self.runtime
            .block_on(self.inner.update_profile(username, update))
    }

    pub fn boards(&self) -> Result<Vec<Board>, ApiError> {
        self.runtime.block_on(self.inner.boards())
    }

    pub fn board_files(&self, board_id: u32) -> Result<BoardFiles, ApiError> {
        self.runtime.block_on(self.inner.board_files(board_id))
    }

    pub fn fmeca_data(&self, board_id: u32, filter: BandFilter) -> Result<FmecaResponse, ApiError> {
        self.runtime.block_on(self.inner.fmeca_data(board_id, filter))
    }

    pub fn atm_check(&self, board_id: u32) -> Result<AtmReport, ApiError> {
        self.runtime.block_on(self.inner.atm_check(board_id))
    }

    pub fn db_status(&self, board_id: u32) -> Result<DbStatus, ApiError> {
        self.runtime.block_on(self.inner.db_status(board_id))
    }

    pub fn upload(
        &self,
        board_id: u32,
        kind: UploadKind,
        path: &Path,
    ) -> Result<UploadReceipt, ApiError> {
        self.runtime
            .block_on(self.inner.upload(board_id, kind, path))
    }

    pub fn list_users(&self, query: &UserQuery) -> Result<Vec<UserProfile>, ApiError> {
        self.runtime.block_on(self.inner.list_users(query))
    }

    pub fn get_user(&self, username: &str) -> Result<UserProfile, ApiError> {
        self.runtime.block_on(self.inner.get_user(username))
    }

    pub fn create_user(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        self.runtime.block_on(self.inner.create_user(user))
    }

    pub fn update_user(&self, username: &str, update: &UserUpdate) -> Result<UserProfile, ApiError> {
        self.runtime
            .block_on(self.inner.update_user(username, update))
    }

    pub fn enable_user(&self, username: &str) -> Result<MessageResponse, ApiError> {
        self.runtime.block_on(self.inner.enable_user(username))
    }

    pub fn disable_user(&self, username: &str) -> Result<MessageResponse, ApiError> {
        self.runtime.block_on(self.inner.disable_user(username))
    }

    pub fn delete_user(&self, username: &str) -> Result<MessageResponse, ApiError> {
        self.runtime.block_on(self.inner.delete_user(username))
    }

    pub fn roles(&self) -> Result<Vec<String>, ApiError> {
        self.runtime.block_on(self.inner.roles())
    }
}
