//! Loading and saving the conversation transcript.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use stream_chat_model::Transcript;

use crate::Error;

/// Durable storage for a [`Transcript`].
///
/// A store is the only part of a turn that touches the filesystem. The
/// store is not guarded against concurrent writers: two processes saving
/// to the same place end with whichever wrote last.
pub trait HistoryStore {
    /// Reads the stored transcript.
    ///
    /// Returns [`Transcript::default`] if nothing has been stored yet.
    fn load(&self) -> Result<Transcript, Error>;

    /// Replaces the stored transcript.
    fn save(&self, transcript: &Transcript) -> Result<(), Error>;
}

impl<S: HistoryStore + ?Sized> HistoryStore for &S {
    #[inline]
    fn load(&self) -> Result<Transcript, Error> {
        (**self).load()
    }

    #[inline]
    fn save(&self, transcript: &Transcript) -> Result<(), Error> {
        (**self).save(transcript)
    }
}

/// A history store backed by a JSON file.
///
/// Saving writes a sibling temporary file and renames it over the
/// target, so readers never see a half-written file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    /// Creates a store for the file at `path`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the history file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| OsString::from("history"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = self.temp_path();
        let result = (|| -> io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        })();
        if result.is_err() {
            fs::remove_file(&temp_path).ok();
        }
        result
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> Result<Transcript, Error> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no history at {}, starting fresh", self.path.display());
                return Ok(Transcript::default());
            }
            Err(err) => {
                return Err(Error::storage(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_slice(&data).map_err(|err| {
            Error::storage(format!(
                "failed to parse {}: {err}",
                self.path.display()
            ))
        })
    }

    fn save(&self, transcript: &Transcript) -> Result<(), Error> {
        let data = serde_json::to_vec_pretty(transcript).map_err(|err| {
            Error::storage(format!("failed to serialize history: {err}"))
        })?;
        self.write_atomically(&data).map_err(|err| {
            Error::storage(format!(
                "failed to write {}: {err}",
                self.path.display()
            ))
        })?;
        debug!(
            "saved {} messages to {}",
            transcript.messages.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    transcript: Option<Transcript>,
    saves: usize,
    fail_load: bool,
    fail_save: bool,
}

/// An in-memory history store.
///
/// Clones share the same state, so a test can keep one handle and give
/// another to the turn.
#[derive(Clone, Debug, Default)]
pub struct MemoryHistoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryHistoryStore {
    /// Creates a store that already holds `transcript`.
    pub fn with_transcript(transcript: Transcript) -> Self {
        let store = Self::default();
        store.lock().transcript = Some(transcript);
        store
    }

    /// Returns the stored transcript, if any was stored.
    pub fn transcript(&self) -> Option<Transcript> {
        self.lock().transcript.clone()
    }

    /// Returns how many times [`HistoryStore::save`] succeeded.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Makes every later load fail.
    pub fn fail_loads(&self) {
        self.lock().fail_load = true;
    }

    /// Makes every later save fail.
    pub fn fail_saves(&self) {
        self.lock().fail_save = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Transcript, Error> {
        let state = self.lock();
        if state.fail_load {
            return Err(Error::storage("history is unavailable"));
        }
        Ok(state.transcript.clone().unwrap_or_default())
    }

    fn save(&self, transcript: &Transcript) -> Result<(), Error> {
        let mut state = self.lock();
        if state.fail_save {
            return Err(Error::storage("history is read-only"));
        }
        state.transcript = Some(transcript.clone());
        state.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stream_chat_model::{ErrorKind, Message};

    use super::*;

    fn sample() -> Transcript {
        Transcript {
            conversation_id: "cv1".to_owned(),
            messages: vec![
                Message::user("hello"),
                Message::assistant("Hi \"there\"\n<think>x</think>"),
            ],
            show_think: false,
            typewriter_delay_ms: 0,
        }
    }

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("history.json"));
        assert_eq!(store.load().unwrap(), Transcript::default());
    }

    #[test]
    fn test_round_trip_is_fixed_point() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("nested/history.json"));
        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample());

        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap(), sample());
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = FileHistoryStore::new(path).load().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_unwritable_location_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a regular file.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let store = FileHistoryStore::new(blocker.join("history.json"));
        let err = store.save(&sample()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryHistoryStore::default();
        assert_eq!(store.load().unwrap(), Transcript::default());
        assert_eq!(store.transcript(), None);

        store.save(&sample()).unwrap();
        assert_eq!(store.clone().load().unwrap(), sample());
        assert_eq!(store.save_count(), 1);

        store.fail_saves();
        assert_eq!(
            store.save(&Transcript::default()).unwrap_err().kind(),
            ErrorKind::Storage
        );
        assert_eq!(store.transcript(), Some(sample()));
    }
}
