// ── Credential persistence ──
//
// The API client only reports refreshed tokens; where they end up is the
// host's business. `CredentialStore` is that seam: the CLI backs it with
// a JSON file, tests with `MemoryStore`. `StoreSink` adapts a store to the
// client's `CredentialSink` so every rotation is written back at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use ufanet_api::CredentialSink;

/// Persisted credential record for one contract.
///
/// The password is kept so the client can fall back to a full login once
/// the refresh token has expired.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("refresh_exp", &self.refresh_exp)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt credential data: {0}")]
    Corrupt(String),
}

/// Keyed by contract. Implementations must be safe to call from any
/// thread; calls are short and synchronous.
pub trait CredentialStore: Send + Sync {
    fn load(&self, contract: &str) -> Result<Option<StoredCredentials>, StoreError>;

    fn save(&self, contract: &str, credentials: &StoredCredentials) -> Result<(), StoreError>;

    /// Delete the record. Removing a missing record is not an error.
    fn remove(&self, contract: &str) -> Result<(), StoreError>;

    /// Load, apply `f`, save. A missing record starts from the default.
    fn update(
        &self,
        contract: &str,
        f: &mut dyn FnMut(&mut StoredCredentials),
    ) -> Result<(), StoreError> {
        let mut record = self.load(contract)?.unwrap_or_default();
        f(&mut record);
        self.save(contract, &record)
    }
}

// ── MemoryStore ──────────────────────────────────────────────────────

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, StoredCredentials>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredCredentials>> {
        self.records.lock().expect("credential store lock poisoned")
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self, contract: &str) -> Result<Option<StoredCredentials>, StoreError> {
        Ok(self.records().get(contract).cloned())
    }

    fn save(&self, contract: &str, credentials: &StoredCredentials) -> Result<(), StoreError> {
        self.records()
            .insert(contract.to_owned(), credentials.clone());
        Ok(())
    }

    fn remove(&self, contract: &str) -> Result<(), StoreError> {
        self.records().remove(contract);
        Ok(())
    }
}

// ── StoreSink ────────────────────────────────────────────────────────

/// Writes every refreshed token into a [`CredentialStore`], leaving the
/// rest of the record (the password) untouched.
///
/// Persistence failures are logged, never surfaced: the in-memory token
/// is already valid and the call that triggered the rotation should
/// still succeed.
#[derive(Clone)]
pub struct StoreSink {
    store: Arc<dyn CredentialStore>,
    contract: String,
}

impl StoreSink {
    pub fn new(store: Arc<dyn CredentialStore>, contract: impl Into<String>) -> Self {
        Self {
            store,
            contract: contract.into(),
        }
    }
}

impl std::fmt::Debug for StoreSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSink")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl CredentialSink for StoreSink {
    fn tokens_refreshed(&self, refresh_token: &SecretString, refresh_exp: Option<i64>) {
        let result = self.store.update(&self.contract, &mut |record| {
            record.refresh_token = Some(refresh_token.expose_secret().to_owned());
            record.refresh_exp = refresh_exp;
        });
        match result {
            Ok(()) => debug!(contract = %self.contract, ?refresh_exp, "refresh token persisted"),
            Err(e) => warn!(contract = %self.contract, error = %e, "failed to persist refresh token"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn load(&self, _: &str) -> Result<Option<StoredCredentials>, StoreError> {
            Err(StoreError::Corrupt("unreadable".into()))
        }
        fn save(&self, _: &str, _: &StoredCredentials) -> Result<(), StoreError> {
            Err(StoreError::Corrupt("unwritable".into()))
        }
        fn remove(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn sink_keeps_password() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(
                "100",
                &StoredCredentials {
                    refresh_token: Some("old".into()),
                    refresh_exp: Some(1),
                    password: Some("pw".into()),
                },
            )
            .unwrap();

        let sink = StoreSink::new(store.clone(), "100");
        sink.tokens_refreshed(&SecretString::from("new".to_owned()), Some(99));

        let record = store.load("100").unwrap().unwrap();
        assert_eq!(record.refresh_token.as_deref(), Some("new"));
        assert_eq!(record.refresh_exp, Some(99));
        assert_eq!(record.password.as_deref(), Some("pw"));
    }

    #[test]
    fn sink_creates_missing_record() {
        let store = Arc::new(MemoryStore::new());
        let sink = StoreSink::new(store.clone(), "200");
        sink.tokens_refreshed(&SecretString::from("r".to_owned()), None);

        let record = store.load("200").unwrap().unwrap();
        assert_eq!(record.refresh_token.as_deref(), Some("r"));
        assert_eq!(record.refresh_exp, None);
        assert_eq!(record.password, None);
    }

    #[test]
    fn sink_swallows_store_failures() {
        let sink = StoreSink::new(Arc::new(BrokenStore), "300");
        sink.tokens_refreshed(&SecretString::from("r".to_owned()), None);
    }

    #[test]
    fn debug_hides_secrets() {
        let record = StoredCredentials {
            refresh_token: Some("secret-refresh".into()),
            refresh_exp: None,
            password: Some("secret-password".into()),
        };
        let shown = format!("{record:?}");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn record_serializes_compactly() {
        let record = StoredCredentials {
            refresh_token: Some("r".into()),
            ..StoredCredentials::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"refresh_token":"r"}"#);
    }
}
