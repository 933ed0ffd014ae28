// ── Accounts ──
//
// An `Account` is the shared context for one contract: the token-managed
// client, the entry recorded at setup, and the sink that persists token
// rotations. Entities borrow the client from here instead of building
// their own, so a refresh seen by one is seen by all.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ufanet_api::{Intercom, UfanetClient};

use crate::config::AccountConfig;
use crate::entity::{CameraEntity, DeviceInfo, DoorButton};
use crate::error::CoreError;
use crate::store::{CredentialStore, StoreSink};

// ── Entry data ───────────────────────────────────────────────────────

/// An intercom as recorded at setup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntercomEntry {
    pub id: i64,
    pub name: String,
}

impl From<&Intercom> for IntercomEntry {
    fn from(intercom: &Intercom) -> Self {
        Self {
            id: intercom.id,
            name: intercom.display_name(),
        }
    }
}

/// What setup learned about an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub contract: String,
    pub intercoms: Vec<IntercomEntry>,
}

impl AccountEntry {
    pub fn new(contract: impl Into<String>, intercoms: &[Intercom]) -> Self {
        Self {
            contract: contract.into(),
            intercoms: intercoms.iter().map(IntercomEntry::from).collect(),
        }
    }
}

// ── Account ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Account {
    entry: AccountEntry,
    client: Arc<UfanetClient>,
    sink: StoreSink,
}

impl Account {
    /// Build the client from the persisted credential record.
    pub fn open(
        config: &AccountConfig,
        entry: AccountEntry,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, CoreError> {
        let stored = store.load(&config.contract)?.unwrap_or_default();
        debug!(contract = %config.contract, credentials = ?stored, "opening account");
        let client = config.restore(&stored).build()?;
        Ok(Self::with_client(entry, client, store))
    }

    /// Open an account whose entry is not known yet by listing its
    /// intercoms once.
    pub async fn discover(
        config: &AccountConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, CoreError> {
        let mut account = Self::open(config, AccountEntry::new(config.contract.clone(), &[]), store)?;
        let intercoms = account.client.list_intercoms(&account.sink).await?;
        account.entry = AccountEntry::new(config.contract.clone(), &intercoms);
        Ok(account)
    }

    pub fn with_client(
        entry: AccountEntry,
        client: UfanetClient,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let sink = StoreSink::new(store, entry.contract.clone());
        Self {
            entry,
            client: Arc::new(client),
            sink,
        }
    }

    pub fn contract(&self) -> &str {
        &self.entry.contract
    }

    pub fn entry(&self) -> &AccountEntry {
        &self.entry
    }

    pub fn client(&self) -> &Arc<UfanetClient> {
        &self.client
    }

    /// Sink that persists token rotations for this contract.
    pub fn sink(&self) -> &StoreSink {
        &self.sink
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::for_contract(self.contract())
    }

    /// One door button per intercom recorded at setup.
    pub fn buttons(&self) -> Vec<DoorButton> {
        self.entry
            .intercoms
            .iter()
            .map(|intercom| DoorButton::new(self, intercom))
            .collect()
    }

    /// One camera entity per camera currently listed by the backend.
    ///
    /// Failures are logged and produce no cameras: the account stays
    /// usable for its buttons.
    pub async fn cameras(&self) -> Vec<CameraEntity> {
        match self.client.list_cameras(&self.sink).await {
            Ok(cameras) => {
                debug!(contract = %self.contract(), count = cameras.len(), "cameras loaded");
                cameras
                    .into_iter()
                    .map(|camera| CameraEntity::new(self, camera))
                    .collect()
            }
            Err(e) if e.is_auth() => {
                warn!(contract = %self.contract(), error = %e, "authentication failed while loading cameras");
                Vec::new()
            }
            Err(e) => {
                warn!(contract = %self.contract(), error = %e, "failed to load cameras");
                Vec::new()
            }
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Live accounts keyed by contract. Dropping an account here releases its
/// client; entities still holding it keep working until they are dropped.
pub struct AccountRegistry {
    store: Arc<dyn CredentialStore>,
    accounts: HashMap<String, Arc<Account>>,
}

impl AccountRegistry {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            accounts: HashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Open the account for `entry` and register it, replacing any
    /// previous registration for the same contract.
    pub fn setup(
        &mut self,
        config: &AccountConfig,
        entry: AccountEntry,
    ) -> Result<Arc<Account>, CoreError> {
        let account = Arc::new(Account::open(config, entry, Arc::clone(&self.store))?);
        info!(contract = %account.contract(), intercoms = account.entry().intercoms.len(), "account set up");
        self.accounts
            .insert(account.contract().to_owned(), Arc::clone(&account));
        Ok(account)
    }

    pub fn get(&self, contract: &str) -> Option<Arc<Account>> {
        self.accounts.get(contract).cloned()
    }

    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    /// Forget the live account. Persisted credentials stay.
    pub fn unload(&mut self, contract: &str) -> Option<Arc<Account>> {
        let account = self.accounts.remove(contract);
        if account.is_some() {
            debug!(contract, "account unloaded");
        }
        account
    }

    /// Unload and delete the persisted credential record.
    pub fn remove(&mut self, contract: &str) -> Result<(), CoreError> {
        self.unload(contract);
        self.store.remove(contract)?;
        info!(contract, "account removed");
        Ok(())
    }
}

impl std::fmt::Debug for AccountRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRegistry")
            .field("accounts", &self.accounts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
