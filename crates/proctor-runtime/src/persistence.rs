//! Session-scoped warning persistence.
//!
//! Keeps the violation count alive across page reloads so reloading cannot
//! reset it. The browser keeps it in `sessionStorage`; natively the same
//! contract is met by [`MemoryStore`] or, with the `file-store` feature, a
//! JSON file.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       WarningStore                            │
//! │   - One key per attempt: quiz_warnings_<attemptId>            │
//! │   - restore / persist / clear                                 │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       SessionStore                            │
//! │   - MemoryStore: in-process (tests, single page lifetime)     │
//! │   - FileStore: JSON file (requires file-store)                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | Logged, count kept in memory |
//! | `StorageError::Serialization` | JSON encode/decode | Logged, treated as empty |
//! | `StorageError::Corruption` | Poisoned lock | Logged, treated as empty |
//! | Unparsable value | Tampering | Restores `0` |

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use proctor_core::session::AttemptId;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during session storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    #[cfg(feature = "file-store")]
    Serialization(String),
    /// Storage is in an unusable state.
    Corruption(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "file-store")]
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            #[cfg(feature = "file-store")]
            StorageError::Serialization(_) => None,
            StorageError::Corruption(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Session Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// String key/value storage scoped to one browser session.
pub trait SessionStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory session store.
///
/// Share it through an `Arc` to simulate a reload: drop the proctor, build a
/// new one over the same store.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in `Arc` for shared ownership.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl SessionStore for MemoryStore {
    fn name(&self) -> &str {
        "MemoryStore"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        guard.remove(key);
        Ok(())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStore")
            .field("entries", &count)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Store (requires file-store feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "file-store")]
mod file_store {
    use super::*;
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// JSON-file session store.
    ///
    /// The whole map is rewritten on each change using a temp file + rename
    /// so a crash never leaves a half-written file.
    pub struct FileStore {
        path: PathBuf,
        lock: RwLock<()>,
    }

    impl FileStore {
        /// The file does not need to exist; it is created on first write.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
                lock: RwLock::new(()),
            }
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }

        fn load(&self) -> StorageResult<HashMap<String, String>> {
            if !self.path.exists() {
                return Ok(HashMap::new());
            }
            let reader = BufReader::new(File::open(&self.path)?);
            serde_json::from_reader(reader).map_err(|e| {
                StorageError::Serialization(format!("failed to parse session file: {e}"))
            })
        }

        fn store(&self, entries: &HashMap<String, String>) -> StorageResult<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp_path = self.temp_path();
            {
                let file = File::create(&tmp_path)?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer(&mut writer, entries).map_err(|e| {
                    StorageError::Serialization(format!("failed to serialize session: {e}"))
                })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        }
    }

    impl SessionStore for FileStore {
        fn name(&self) -> &str {
            "FileStore"
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            let _guard = self
                .lock
                .read()
                .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
            Ok(self.load()?.remove(key))
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            let _guard = self
                .lock
                .write()
                .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
            let mut entries = self.load()?;
            entries.insert(key.to_owned(), value.to_owned());
            self.store(&entries)
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            let _guard = self
                .lock
                .write()
                .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
            let mut entries = self.load()?;
            if entries.remove(key).is_some() {
                self.store(&entries)?;
            }
            Ok(())
        }
    }

    impl fmt::Debug for FileStore {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStore")
                .field("path", &self.path)
                .finish()
        }
    }
}

#[cfg(feature = "file-store")]
pub use file_store::FileStore;

// ─────────────────────────────────────────────────────────────────────────────
// Warning Store
// ─────────────────────────────────────────────────────────────────────────────

/// Prefix of the per-attempt storage key.
pub const WARNING_KEY_PREFIX: &str = "quiz_warnings_";

/// Persists one attempt's warning count.
///
/// Storage failures are logged and swallowed: the in-memory count stays
/// authoritative for the current page either way.
pub struct WarningStore {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl WarningStore {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, attempt: &AttemptId) -> Self {
        Self {
            store,
            key: format!("{WARNING_KEY_PREFIX}{attempt}"),
        }
    }

    /// Storage key for this attempt.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read a previously persisted count. Unparsable values restore as `0`.
    #[must_use]
    pub fn restore(&self) -> Option<u32> {
        match self.store.get(&self.key) {
            Ok(Some(raw)) => {
                let count = raw.trim().parse::<u32>().unwrap_or_else(|_| {
                    tracing::warn!(key = %self.key, value = %raw, "unparsable warning count");
                    0
                });
                tracing::debug!(key = %self.key, count, "restored warning count");
                Some(count)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    backend = self.store.name(),
                    key = %self.key,
                    error = %e,
                    "failed to read warning count"
                );
                None
            }
        }
    }

    /// Write the current count as a decimal string.
    pub fn persist(&self, count: u32) {
        if let Err(e) = self.store.set(&self.key, &count.to_string()) {
            tracing::warn!(
                backend = self.store.name(),
                key = %self.key,
                count,
                error = %e,
                "failed to persist warning count"
            );
        }
    }

    /// Drop the stored count.
    pub fn clear(&self) {
        match self.store.remove(&self.key) {
            Ok(()) => tracing::debug!(key = %self.key, "cleared warning count"),
            Err(e) => tracing::warn!(
                backend = self.store.name(),
                key = %self.key,
                error = %e,
                "failed to clear warning count"
            ),
        }
    }
}

impl fmt::Debug for WarningStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarningStore")
            .field("backend", &self.store.name())
            .field("key", &self.key)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn warning_store(store: &Arc<MemoryStore>) -> WarningStore {
        WarningStore::new(store.clone(), &AttemptId::new("17"))
    }

    #[test]
    fn memory_store_basic_operations() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        // Removing again is fine.
        store.remove("k").unwrap();
    }

    #[test]
    fn key_uses_attempt_id() {
        let store = MemoryStore::new().shared();
        assert_eq!(warning_store(&store).key(), "quiz_warnings_17");
    }

    #[test]
    fn persist_then_restore() {
        let store = MemoryStore::new().shared();
        let warnings = warning_store(&store);
        assert_eq!(warnings.restore(), None);

        warnings.persist(3);
        assert_eq!(store.get("quiz_warnings_17").unwrap().as_deref(), Some("3"));
        assert_eq!(warnings.restore(), Some(3));
    }

    #[test]
    fn garbage_restores_as_zero() {
        let store = MemoryStore::new().shared();
        store.set("quiz_warnings_17", "lots").unwrap();
        assert_eq!(warning_store(&store).restore(), Some(0));
    }

    #[test]
    fn clear_removes_only_this_attempt() {
        let store = MemoryStore::new().shared();
        store.set("quiz_warnings_99", "1").unwrap();
        let warnings = warning_store(&store);
        warnings.persist(2);

        warnings.clear();
        assert_eq!(warnings.restore(), None);
        assert_eq!(store.get("quiz_warnings_99").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn storage_error_display() {
        let io_err = StorageError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(io_err.to_string().contains("I/O error"));

        let corrupt = StorageError::Corruption("bad data".into());
        assert!(corrupt.to_string().contains("corruption"));
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn name(&self) -> &str {
            "FailingStore"
        }

        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Corruption("unavailable".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Corruption("unavailable".into()))
        }

        fn remove(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Corruption("unavailable".into()))
        }
    }

    #[test]
    fn failing_store_degrades_silently() {
        let warnings = WarningStore::new(Arc::new(FailingStore), &AttemptId::new("x"));
        warnings.persist(1);
        warnings.clear();
        assert_eq!(warnings.restore(), None);
    }
}

#[cfg(all(test, feature = "file-store"))]
mod file_store_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");

        FileStore::new(&path).set("quiz_warnings_1", "2").unwrap();
        assert!(path.exists());

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("quiz_warnings_1").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("nope.json"));
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("k").unwrap();
    }

    #[test]
    fn file_store_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dirs").join("session.json");
        FileStore::new(&path).set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::new(&path).get("k").unwrap_err();
        assert!(err.to_string().contains("serialization"));
    }
}
