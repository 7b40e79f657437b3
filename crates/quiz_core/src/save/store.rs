use super::error::StoreError;
use super::format::{decode_snapshot, SessionSnapshot, SnapshotCodec};

use std::fs::{remove_file, rename, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Durable home of the single in-progress session.
///
/// Every write replaces the whole record. `load` returns `Ok(None)` when
/// nothing was saved; unreadable data is reported as an error and it is up to
/// the caller to treat it as a cold start.
pub trait SessionStore {
    fn load(&mut self) -> Result<Option<SessionSnapshot>, StoreError>;

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;

    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-process store holding the encoded record.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    codec: SnapshotCodec,
    data: Option<Vec<u8>>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(codec: SnapshotCodec) -> Self {
        Self { codec, ..Self::default() }
    }

    /// Start from raw stored bytes, e.g. a record left by an older build.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { data: Some(bytes.into()), ..Self::default() }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Number of successful `save` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl SessionStore for MemoryStore {
    fn load(&mut self) -> Result<Option<SessionSnapshot>, StoreError> {
        self.data.as_deref().map(decode_snapshot).transpose()
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        self.data = Some(self.codec.encode(snapshot)?);
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.data = None;
        Ok(())
    }
}

/// Single-file store with atomic replace.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    codec: SnapshotCodec,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, codec: SnapshotCodec) -> Self {
        Self { path: path.into(), codec }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl SessionStore for FileStore {
    fn load(&mut self) -> Result<Option<SessionSnapshot>, StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let snapshot = decode_snapshot(&data)?;

        log::debug!("Loaded {} bytes from {:?}", data.len(), self.path);
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        // Ensure save directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let data = self.codec.encode(snapshot)?;

        // Atomic save: write to temp file, then rename
        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;

            // sync_all ensures data is written to disk (portable fsync)
            file.sync_all()?;
        }
        rename(&temp_path, &self.path)?;

        log::debug!("Saved {} bytes to {:?}", data.len(), self.path);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match remove_file(&self.path) {
            Ok(()) => {
                log::info!("Deleted saved session {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::Player;
    use crate::money::Money;
    use crate::scoring::AnswerResult;
    use crate::state::Phase;
    use tempfile::TempDir;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            phase: Phase::Summary,
            player: Some(Player::new("leo", "Leo", Money::from_units(10), Money::from_units(1))),
            current_index: 1,
            results: vec![AnswerResult {
                question_id: "l1".to_string(),
                question_value: Money::from_units(10),
                selected_answer: "B".to_string(),
                is_correct: false,
            }],
        }
    }

    #[test]
    fn test_file_roundtrip_both_codecs() {
        let temp_dir = TempDir::new().unwrap();
        for codec in [SnapshotCodec::Json, SnapshotCodec::Packed] {
            let mut store = FileStore::new(temp_dir.path().join("session.dat"), codec);
            store.save(&snapshot()).unwrap();
            assert_eq!(store.load().unwrap(), Some(snapshot()));
        }
    }

    #[test]
    fn test_save_of_load_is_identity() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("session.json"), SnapshotCodec::Json);
        store.save(&snapshot()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap(), Some(loaded));
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("session.json");
        let mut store = FileStore::new(&path, SnapshotCodec::Json);

        store.save(&snapshot()).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_file_loads_none() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("absent.json"), SnapshotCodec::Json);
        assert_eq!(store.load().unwrap(), None);
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_corrupt_file_reports_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "{\"phase\": 42").unwrap();

        let mut store = FileStore::new(&path, SnapshotCodec::Json);
        let err = store.load().unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_clear_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("session.json"), SnapshotCodec::Packed);
        store.save(&snapshot()).unwrap();
        store.clear().unwrap();

        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store_counts_writes() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        store.save(&snapshot()).unwrap();
        store.save(&snapshot()).unwrap();
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.load().unwrap(), Some(snapshot()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
