//! Durable storage for session blobs.
//!
//! The in-memory jar lives as long as the process. Callers that want a
//! session to survive a restart export it and hand the blob to a
//! [`SessionPersistence`] backend under an opaque key.

use crate::error::{Result, SessionError};
use agora_core::AppConfig;
use async_trait::async_trait;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Async key/blob storage for session state.
#[async_trait]
pub trait SessionPersistence: Send + Sync {
    /// The blob stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `blob` under `key`, replacing any previous value.
    async fn store(&self, key: &str, blob: &str) -> Result<()>;

    /// Delete the blob under `key`. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    /// Store blobs under `dir`, creating it on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store blobs in the `sessions` directory of the platform data dir.
    pub fn in_data_dir() -> Result<Self> {
        Ok(Self::new(AppConfig::data_dir()?.join("sessions")))
    }

    /// Directory blobs are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<PathBuf> {
        static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = KEY_REGEX.get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid persistence key regex")
        });
        if !re.is_match(key) {
            return Err(SessionError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl SessionPersistence for FilePersistence {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &str, blob: &str) -> Result<()> {
        let path = self.file_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Readers only ever see a complete blob.
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, blob).await?;
        tokio::fs::rename(&staging, &path).await?;

        debug!(path = %path.display(), "stored session blob");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.file_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_load_remove() {
        let temp = TempDir::new().expect("create temp dir");
        let store = FilePersistence::new(temp.path().join("sessions"));

        assert_eq!(store.load("alice").await.expect("load"), None);
        store.store("alice", "[1,2]").await.expect("store");
        assert_eq!(store.load("alice").await.expect("load").as_deref(), Some("[1,2]"));

        store.store("alice", "[3]").await.expect("overwrite");
        assert_eq!(store.load("alice").await.expect("load").as_deref(), Some("[3]"));

        store.remove("alice").await.expect("remove");
        store.remove("alice").await.expect("remove twice");
        assert_eq!(store.load("alice").await.expect("load"), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let temp = TempDir::new().expect("create temp dir");
        let store = FilePersistence::new(temp.path());
        for key in ["../escape", "a/b", "", "with space"] {
            assert!(matches!(
                store.store(key, "x").await,
                Err(SessionError::InvalidKey(_))
            ));
        }
    }
}
