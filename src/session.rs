//! Persisted wallet-session metadata.
//!
//! Only which connector was used and which account it authorized is stored,
//! so the next start can reconnect without prompting. Nothing secret is kept.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::common::error::Result;
use crate::common::logging;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub connector_id: String,
    pub address: Address,
    pub chain_id: u64,
    /// Unix timestamp of the connection.
    pub connected_at: i64,
}

impl SessionRecord {
    #[must_use]
    pub fn new(connector_id: impl Into<String>, address: Address, chain_id: u64) -> Self {
        Self {
            connector_id: connector_id.into(),
            address,
            chain_id,
            connected_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// JSON file holding the last [`SessionRecord`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session. A missing file is `None`; an unreadable one
    /// is logged and treated as missing.
    pub async fn load(&self) -> Result<Option<SessionRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                logging::log(
                    logging::LogLevel::Warning,
                    &format!("Ignoring corrupt session file {}: {e}", self.path.display()),
                );
                Ok(None)
            }
        }
    }

    pub async fn save(&self, record: &SessionRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().await.unwrap(), None);

        let record = SessionRecord::new("injected", Address::repeat_byte(0xab), 11_155_111);
        store.save(&record).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(record));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SessionStore::new(path);
        assert_eq!(store.load().await.unwrap(), None);
    }
}
