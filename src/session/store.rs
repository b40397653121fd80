//! Persistence for the logged-in session.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Everything that identifies a logged-in user on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Bearer token issued by the backend
    pub access_token: String,
    /// Name the user logged in with
    pub username: String,
    /// Login (or last extension) time, Unix milliseconds
    pub login_timestamp_ms: i64,
}

/// Storage backend for the session record.
///
/// Implementations must be safe to share between the CLI thread and the
/// session timer worker.
pub trait SessionStore: Send + Sync {
    /// Read the current record, `None` if nobody is logged in.
    fn load(&self) -> Result<Option<SessionRecord>, StoreError>;

    /// Replace the current record.
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Remove every session key. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Session store errors.
#[derive(Debug)]
pub enum StoreError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "Session store IO error: {e}"),
            StoreError::ParseError(e) => write!(f, "Session store parse error: {e}"),
            StoreError::SerializeError(e) => write!(f, "Session store serialize error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// JSON file holding the session record.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: std::sync::Arc<Mutex<()>>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: std::sync::Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if !self.path.exists() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::IoError(e.to_string()))?;
        let record: SessionRecord =
            serde_json::from_str(&content).map_err(|e| StoreError::ParseError(e.to_string()))?;
        Ok(Some(record))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;
        write_private(&self.path, content.as_bytes())
            .map_err(|e| StoreError::IoError(e.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::IoError(e.to_string())),
        }
    }
}

/// Write `content` readable by the owner only, from the moment of creation.
#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a file left by older versions.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, content)
}

/// Process-local store, used by tests and embedders that keep the session
/// in memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.record.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
