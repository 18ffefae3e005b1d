use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub type BoxedSessionStorage = Arc<dyn SessionStorage>;

/// The locally persisted identity used to restore a session after a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub room_id: String,
    pub user_id: String,
    pub user_name: String,
}

/// Represents a place where a [SavedSession] can be persisted between runs
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Option<SavedSession>;
    fn save(&self, session: &SavedSession);
    fn clear(&self);
}

/// Stores the session as a JSON file on disk
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Option<SavedSession> {
        let contents = fs::read_to_string(&self.path).ok()?;

        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("Discarding unreadable session file: {}", err);
                None
            }
        }
    }

    fn save(&self, session: &SavedSession) {
        let contents = serde_json::to_string(session).expect("session serializes");

        if let Err(err) = fs::write(&self.path, contents) {
            warn!("Failed to persist session: {}", err);
        }
    }

    fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Keeps the session in memory only. Useful for tests and throwaway clients.
#[derive(Default)]
pub struct MemorySessionStorage {
    session: Mutex<Option<SavedSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Option<SavedSession> {
        self.session.lock().clone()
    }

    fn save(&self, session: &SavedSession) {
        *self.session.lock() = Some(session.clone());
    }

    fn clear(&self) {
        *self.session.lock() = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_storage_round_trips() {
        let path = std::env::temp_dir().join(format!(
            "watchparty-session-{}.json",
            crate::util::random_string(8)
        ));

        let storage = FileSessionStorage::new(&path);
        assert!(storage.load().is_none());

        let session = SavedSession {
            room_id: "abcd1234".to_string(),
            user_id: "u1".to_string(),
            user_name: "Mary".to_string(),
        };

        storage.save(&session);
        assert_eq!(storage.load(), Some(session));

        storage.clear();
        assert!(storage.load().is_none());
    }

    #[test]
    fn unreadable_session_files_are_discarded() {
        let path = std::env::temp_dir().join(format!(
            "watchparty-session-{}.json",
            crate::util::random_string(8)
        ));

        fs::write(&path, "not json").unwrap();

        let storage = FileSessionStorage::new(&path);
        assert!(storage.load().is_none());

        storage.clear();
    }
}
