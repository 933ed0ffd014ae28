// ── Credential file ──
//
// One JSON object keyed by contract, holding the refresh token, its
// expiry, and the password. Rewritten whole on every change through a
// temporary file in the same directory that is renamed over the target, so
// a crash never leaves a truncated file. On unix the file has mode 0600.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;
use ufanet_core::{CredentialStore, StoreError, StoredCredentials};

type Records = BTreeMap<String, StoredCredentials>;

/// File-backed [`CredentialStore`].
#[derive(Debug)]
pub struct CredentialFile {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl CredentialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The file at the platform data directory.
    pub fn default_location() -> Self {
        Self::new(crate::credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Records, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Records::new());
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn write(&self, records: &Records) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;
        let json =
            serde_json::to_vec_pretty(records).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".credentials")
            .tempfile_in(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        debug!(path = %self.path.display(), records = records.len(), "credential file written");
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().expect("credential file lock poisoned")
    }
}

impl CredentialStore for CredentialFile {
    fn load(&self, contract: &str) -> Result<Option<StoredCredentials>, StoreError> {
        let _guard = self.guard();
        Ok(self.read()?.remove(contract))
    }

    fn save(&self, contract: &str, credentials: &StoredCredentials) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut records = self.read()?;
        records.insert(contract.to_owned(), credentials.clone());
        self.write(&records)
    }

    fn remove(&self, contract: &str) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut records = self.read()?;
        if records.remove(contract).is_some() {
            self.write(&records)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn record(token: &str) -> StoredCredentials {
        StoredCredentials {
            refresh_token: Some(token.into()),
            refresh_exp: Some(1_900_000_000),
            password: Some("hunter2".into()),
        }
    }

    #[test]
    fn records_are_keyed_by_contract() {
        let dir = tempfile::tempdir().unwrap();
        let file = CredentialFile::new(dir.path().join("data").join("credentials.json"));

        assert_eq!(file.load("1").unwrap(), None);

        file.save("1", &record("a")).unwrap();
        file.save("2", &record("b")).unwrap();
        assert_eq!(file.load("1").unwrap(), Some(record("a")));
        assert_eq!(file.load("2").unwrap(), Some(record("b")));

        // A second handle sees the same data.
        let reopened = CredentialFile::new(file.path());
        file.remove("1").unwrap();
        assert_eq!(reopened.load("1").unwrap(), None);
        assert_eq!(reopened.load("2").unwrap(), Some(record("b")));

        file.remove("missing").unwrap();
    }

    #[test]
    fn update_merges_into_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let file = CredentialFile::new(dir.path().join("credentials.json"));
        file.save("1", &record("old")).unwrap();

        file.update("1", &mut |r| r.refresh_token = Some("new".into()))
            .unwrap();

        let loaded = file.load("1").unwrap().unwrap();
        assert_eq!(loaded.refresh_token.as_deref(), Some("new"));
        assert_eq!(loaded.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();

        let file = CredentialFile::new(&path);
        assert!(matches!(file.load("1"), Err(StoreError::Corrupt(_))));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        let file = CredentialFile::new(dir.path().join("credentials.json"));
        file.save("1", &record("a")).unwrap();

        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_replaces_a_world_readable_file() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let file = CredentialFile::new(&path);
        file.save("1", &record("a")).unwrap();
        file.save("1", &record("b")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(file.load("1").unwrap(), Some(record("b")));

        // No temporary files are left next to the target.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("credentials.json")]);
    }
}
