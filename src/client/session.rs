use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::client::error::ClientResult;
use crate::models::LoginResponse;

/// Login payload persisted as a JSON file between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when nothing is stored. An unreadable file is discarded.
    pub fn load(&self) -> ClientResult<Option<LoginResponse>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session file");
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &LoginResponse) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    pub fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn session() -> LoginResponse {
        LoginResponse {
            token: "t".to_string(),
            role: Role::Manager,
            role_id: 2,
            user_id: 5,
            name: "Meera".to_string(),
            username: "meera".to_string(),
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("userInfo.json"));

        assert_eq!(store.load().unwrap(), None);

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("userInfo.json"));
        fs::write(store.path(), b"{not json").unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }
}
