//! Persistent storage for the access/refresh token pair.
//!
//! Stores hold exactly two entries, `access_token` and `refresh_token`. They
//! are pure storage: no validation, no network, no knowledge of sessions.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use neemaflex_auth::{AccessToken, CredentialPair, RefreshToken};

use crate::error::StoreError;

/// Snapshot of both persisted entries. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<RefreshToken>,
}

impl StoredTokens {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// Both entries, if both are present.
    pub fn pair(&self) -> Option<CredentialPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access.clone(), refresh.clone())),
            _ => None,
        }
    }
}

impl From<&CredentialPair> for StoredTokens {
    fn from(pair: &CredentialPair) -> Self {
        Self {
            access_token: Some(pair.access_token.clone()),
            refresh_token: Some(pair.refresh_token.clone()),
        }
    }
}

/// Durable client-local token storage.
///
/// Every write replaces the stored entries in one step; a reader never sees a
/// new access token next to a cleared refresh token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<StoredTokens, StoreError>;

    /// Replace both entries.
    fn save_pair(&self, pair: &CredentialPair) -> Result<(), StoreError>;

    /// Replace the access token, keeping the refresh token as it is.
    fn save_access_token(&self, token: &AccessToken) -> Result<(), StoreError>;

    /// Remove both entries. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: Mutex::new(tokens),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<StoredTokens, StoreError> {
        let guard = self.tokens.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save_pair(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let mut guard = self.tokens.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = StoredTokens::from(pair);
        Ok(())
    }

    fn save_access_token(&self, token: &AccessToken) -> Result<(), StoreError> {
        let mut guard = self.tokens.lock().map_err(|_| StoreError::Poisoned)?;
        guard.access_token = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.tokens.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = StoredTokens::default();
        Ok(())
    }
}

/// JSON file holding both entries.
///
/// Writes go to a uniquely named sibling temp file which is then renamed over
/// the target, so a crash mid-write leaves either the old pair or the new one.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write in `save_access_token`.
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoredTokens, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(StoredTokens::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredTokens::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, tokens: &StoredTokens) -> Result<(), StoreError> {
        if tokens.is_empty() {
            return self.remove();
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Unique, owner-only temp file; dropped (and deleted) on any failure.
        let bytes = serde_json::to_vec_pretty(tokens)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredTokens, StoreError> {
        self.read()
    }

    fn save_pair(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.write(&StoredTokens::from(pair))
    }

    fn save_access_token(&self, token: &AccessToken) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut tokens = self.read()?;
        tokens.access_token = Some(token.clone());
        self.write(&tokens)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(access: &str, refresh: &str) -> CredentialPair {
        CredentialPair::new(access.into(), refresh.into())
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_empty());

        store.save_pair(&pair("a1", "r1")).unwrap();
        store.save_access_token(&"a2".into()).unwrap();
        let loaded = store.load().unwrap().pair().unwrap();
        assert_eq!(loaded, pair("a2", "r1"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn pair_requires_both_entries() {
        let tokens = StoredTokens {
            access_token: Some("a".into()),
            refresh_token: None,
        };
        assert!(tokens.pair().is_none());
        assert!(!tokens.is_empty());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileTokenStore::new(&path).save_pair(&pair("a1", "r1")).unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.load().unwrap().pair(), Some(pair("a1", "r1")));
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn file_store_refresh_keeps_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));

        store.save_pair(&pair("a1", "r1")).unwrap();
        store.save_access_token(&"a2".into()).unwrap();

        assert_eq!(store.load().unwrap().pair(), Some(pair("a2", "r1")));
    }

    #[test]
    fn file_store_clear_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));

        store.save_pair(&pair("a1", "r1")).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn failed_write_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        // A directory in the way makes the final rename fail.
        fs::create_dir(&path).unwrap();

        let err = FileTokenStore::new(&path).save_pair(&pair("a1", "r1")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("session.json")]);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"{ not json").unwrap();

        let err = FileTokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn file_uses_the_two_named_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.save_pair(&pair("a1", "r1")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "access_token": "a1", "refresh_token": "r1" }));
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.save_pair(&pair("a1", "r1")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
