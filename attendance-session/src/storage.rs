//! Session Storage - durable backends for the session record
//!
//! A backend persists exactly one [`Session`] per namespace. Every write
//! replaces the whole record, so readers never observe a mix of old and new
//! fields.

use super::Session;
use async_trait::async_trait;
use attendance_core::{storage_error, AttendanceResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

/// Durable key-value region holding the session record
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Read the persisted record. A region that was never written loads as empty.
    async fn load(&self) -> AttendanceResult<Session>;

    /// Replace the persisted record with `session` in one step
    async fn store(&self, session: &Session) -> AttendanceResult<()>;

    /// Replace the persisted record with the empty session
    async fn clear(&self) -> AttendanceResult<()> {
        self.store(&Session::default()).await
    }

    /// Short description for logs
    fn describe(&self) -> String;
}

/// JSON file backend: `<dir>/<namespace>.json`
pub struct FileSessionBackend {
    storage_dir: PathBuf,
    namespace: String,
}

impl FileSessionBackend {
    pub fn new<P: AsRef<Path>>(storage_dir: P, namespace: &str) -> Self {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        info!(
            "Session storage at {} (namespace: {})",
            storage_dir.display(),
            namespace
        );

        Self {
            storage_dir,
            namespace: namespace.to_string(),
        }
    }

    /// Path of the session file
    pub fn path(&self) -> PathBuf {
        self.storage_dir.join(format!("{}.json", self.namespace))
    }

    /// Fresh staging file per write; concurrent writers never share one
    fn temp_path(&self) -> PathBuf {
        self.storage_dir.join(format!(
            ".{}.{}.json.tmp",
            self.namespace,
            uuid::Uuid::new_v4().simple()
        ))
    }
}

#[async_trait]
impl SessionBackend for FileSessionBackend {
    async fn load(&self) -> AttendanceResult<Session> {
        let path = self.path();

        let json_data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", path.display());
                return Ok(Session::default());
            }
            Err(e) => {
                return Err(storage_error!(
                    format!("Failed to read session file {}: {}", path.display(), e),
                    "file_session_backend",
                    e
                ))
            }
        };

        let session: Session = serde_json::from_str(&json_data).map_err(|e| {
            storage_error!(
                format!("Session file {} is corrupt: {}", path.display(), e),
                "file_session_backend",
                e
            )
        })?;

        debug!("Loaded session from {}", path.display());
        Ok(session)
    }

    async fn store(&self, session: &Session) -> AttendanceResult<()> {
        let path = self.path();
        let temp_path = self.temp_path();

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|e| {
                storage_error!(
                    format!(
                        "Failed to create session directory {}: {}",
                        self.storage_dir.display(),
                        e
                    ),
                    "file_session_backend",
                    e
                )
            })?;

        let json_data = serde_json::to_string_pretty(session).map_err(|e| {
            storage_error!(
                format!("Failed to serialize session: {}", e),
                "file_session_backend",
                e
            )
        })?;

        let staged = stage_and_replace(&temp_path, &path, json_data).await;
        if staged.is_err() {
            // Leave no stray staging file behind
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        staged?;

        debug!("Saved session to {}", path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path().display())
    }
}

/// Write `json_data` to `temp_path`, then rename it over `path`
async fn stage_and_replace(
    temp_path: &Path,
    path: &Path,
    json_data: String,
) -> AttendanceResult<()> {
    tokio::fs::write(temp_path, json_data).await.map_err(|e| {
        storage_error!(
            format!("Failed to write {}: {}", temp_path.display(), e),
            "file_session_backend",
            e
        )
    })?;

    // Tokens are credentials; keep them private to the owner
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(temp_path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| {
                storage_error!(
                    format!("Failed to restrict permissions on {}: {}", temp_path.display(), e),
                    "file_session_backend",
                    e
                )
            })?;
    }

    tokio::fs::rename(temp_path, path).await.map_err(|e| {
        storage_error!(
            format!("Failed to replace session file {}: {}", path.display(), e),
            "file_session_backend",
            e
        )
    })
}

/// In-process backend; nothing survives the process
#[derive(Default)]
pub struct MemorySessionBackend {
    record: Mutex<Session>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `session`, as if written by an earlier run
    pub fn with_session(session: Session) -> Self {
        Self {
            record: Mutex::new(session),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail with a storage error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self, operation: &str) -> AttendanceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(storage_error!(
                format!("Memory backend unavailable during {}", operation),
                "memory_session_backend"
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn load(&self) -> AttendanceResult<Session> {
        self.check_available("load")?;
        Ok(self.record.lock().clone())
    }

    async fn store(&self, session: &Session) -> AttendanceResult<()> {
        self.check_available("store")?;
        *self.record.lock() = session.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
