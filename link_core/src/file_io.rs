//! # Document persistence
//!
//! Interchange documents are stored as pretty-printed JSON text:
//! - **Atomic saves**: write `<file>.tmp`, fsync, rename over the target
//! - **File locking**: `<file>.lock` with holder metadata plus an OS lock,
//!   so two tools never write one document at the same time; saves refuse
//!   a document another live process has locked
//! - **Version validation**: documents from an incompatible schema are rejected
//!
//! ## Example
//!
//! ```rust,no_run
//! use link_core::file_io::{load_document, save_document, FileLock};
//! use link_core::schema::InterchangeDocument;
//! use std::path::Path;
//!
//! let doc = InterchangeDocument::new("bim-source");
//! let path = Path::new("level3.json");
//!
//! let lock = FileLock::acquire(path, "exporter")?;
//! save_document(&doc, path)?;
//! drop(lock);
//!
//! let back = load_document(path)?;
//! assert_eq!(back.meta.document_id, doc.meta.document_id);
//! # Ok::<(), link_core::errors::LinkError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{LinkError, LinkResult};
use crate::loads::LoadData;
use crate::schema::{InterchangeDocument, SCHEMA_VERSION};

/// Hours after which a lock is considered abandoned
const STALE_LOCK_HOURS: i64 = 24;

/// Contents of a `.lock` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Tool or user holding the lock
    pub holder: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(holder: impl Into<String>) -> Self {
        LockInfo {
            holder: holder.into(),
            machine: machine_name(),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Held by this process
    pub fn is_own(&self) -> bool {
        self.pid == std::process::id() && self.machine == machine_name()
    }
}

fn machine_name() -> String {
    hostname().unwrap_or_else(|| "unknown".to_string())
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

/// `path` with `suffix` appended to its full file name
/// (`model.json` -> `model.json.lock`).
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Lock file path for a document
pub fn lock_path_for(path: &Path) -> PathBuf {
    sibling_path(path, "lock")
}

/// Exclusive write lock on a document, released on drop.
pub struct FileLock {
    document_path: PathBuf,
    lock_path: PathBuf,
    /// Holds the OS lock
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock for `path`, taking over a stale one.
    ///
    /// Fails with `FileLocked` while another live process holds it.
    pub fn acquire(path: &Path, holder: impl Into<String>) -> LinkResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(holder);

        if let Some(existing) = read_lock_info(&lock_path) {
            if !is_lock_stale(&existing) {
                return Err(LinkError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", existing.holder, existing.machine),
                    existing.locked_at.to_rfc3339(),
                ));
            }
            tracing::warn!(
                path = %path.display(),
                holder = %existing.holder,
                "Taking over stale document lock"
            );
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| {
                LinkError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| {
                LinkError::file_locked(path.display().to_string(), "another process", "unknown")
            })?;

        let json = serde_json::to_string_pretty(&info)?;
        lock_file
            .write_all(json.as_bytes())
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| {
                LinkError::file_error("write lock", lock_path.display().to_string(), e.to_string())
            })?;

        tracing::debug!(path = %path.display(), holder = %info.holder, "Acquired document lock");

        Ok(FileLock {
            document_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Current live holder of `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).filter(|info| !is_lock_stale(info))
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// A lock is stale when its process is gone from this machine or it is
/// older than [`STALE_LOCK_HOURS`].
fn is_lock_stale(info: &LockInfo) -> bool {
    if hostname().as_deref() == Some(info.machine.as_str()) {
        #[cfg(unix)]
        {
            if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                return true;
            }
        }
        #[cfg(windows)]
        {
            let output = std::process::Command::new("tasklist")
                .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                .output();
            if let Ok(output) = output {
                if !String::from_utf8_lossy(&output.stdout).contains(&info.pid.to_string()) {
                    return true;
                }
            }
        }
    }
    (Utc::now() - info.locked_at).num_hours() > STALE_LOCK_HOURS
}

// ============================================================================
// Reading and writing
// ============================================================================

/// Write `contents` to `path` through a synced temp file and a rename.
fn write_atomic(path: &Path, contents: &str) -> LinkResult<()> {
    let tmp_path = sibling_path(path, "tmp");
    let tmp_error = |operation: &str, e: std::io::Error| {
        LinkError::file_error(operation, tmp_path.display().to_string(), e.to_string())
    };

    let mut tmp_file = File::create(&tmp_path).map_err(|e| tmp_error("create temp file", e))?;
    tmp_file
        .write_all(contents.as_bytes())
        .map_err(|e| tmp_error("write temp file", e))?;
    tmp_file
        .sync_all()
        .map_err(|e| tmp_error("sync temp file", e))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        LinkError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> LinkResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LinkError::file_not_found(path.display().to_string()),
        _ => LinkError::file_error("read", path.display().to_string(), e.to_string()),
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| LinkError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// `FileLocked` when another live process holds the lock on `path`.
fn ensure_writable(path: &Path) -> LinkResult<()> {
    match FileLock::check(path) {
        Some(info) if !info.is_own() => Err(LinkError::file_locked(
            path.display().to_string(),
            format!("{} ({})", info.holder, info.machine),
            info.locked_at.to_rfc3339(),
        )),
        _ => Ok(()),
    }
}

/// Save a document atomically.
///
/// Fails with `FileLocked` while another process holds the document's lock;
/// a lock held by this process does not block the save.
pub fn save_document(doc: &InterchangeDocument, path: &Path) -> LinkResult<()> {
    ensure_writable(path)?;
    let json = serde_json::to_string_pretty(doc)?;
    write_atomic(path, &json)?;
    tracing::info!(
        path = %path.display(),
        document = %doc.meta.document_id,
        elements = doc.element_count(),
        "Saved interchange document"
    );
    Ok(())
}

/// Load a document.
///
/// Errors: `FileNotFound` for a missing path, `FileError` for other I/O
/// failures, `SerializationError` for malformed JSON and `VersionMismatch`
/// for an incompatible schema version.
pub fn load_document(path: &Path) -> LinkResult<InterchangeDocument> {
    let doc: InterchangeDocument = read_json(path)?;
    validate_version(&doc.meta.version)?;
    tracing::debug!(
        path = %path.display(),
        document = %doc.meta.document_id,
        elements = doc.element_count(),
        "Loaded interchange document"
    );
    Ok(doc)
}

/// Load a document along with the current lock holder, if any.
pub fn load_document_with_lock_check(
    path: &Path,
) -> LinkResult<(InterchangeDocument, Option<LockInfo>)> {
    let doc = load_document(path)?;
    Ok((doc, FileLock::check(path)))
}

/// Save load transfer data on its own.
pub fn save_load_data(loads: &LoadData, path: &Path) -> LinkResult<()> {
    ensure_writable(path)?;
    let json = serde_json::to_string_pretty(loads)?;
    write_atomic(path, &json)
}

/// Load standalone load transfer data.
pub fn load_load_data(path: &Path) -> LinkResult<LoadData> {
    read_json(path)
}

/// Accept a file version with the same major version (and, while the
/// schema is 0.x, a minor version no newer than ours).
pub fn validate_version(file_version: &str) -> LinkResult<()> {
    let parse = |v: &str| -> Vec<u32> {
        v.split('.').filter_map(|p| p.trim().parse().ok()).collect()
    };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);

    let mismatch = || LinkError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    match (file.first(), current.first()) {
        (Some(f), Some(c)) if f == c => {}
        _ => return Err(mismatch()),
    }
    if current[0] == 0 {
        if let (Some(f), Some(c)) = (file.get(1), current.get(1)) {
            if f > c {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}
