//! Shared helpers for command handlers.

use std::sync::Arc;

use ufanet_core::{Account, AccountEntry, CredentialStore};

use crate::config::{CredentialFile, ResolvedAccount};
use crate::error::CliError;

/// The on-disk credential store.
pub fn credential_store() -> Arc<dyn CredentialStore> {
    Arc::new(CredentialFile::default_location())
}

/// Open the account from stored credentials without listing anything.
pub fn open_account(resolved: &ResolvedAccount) -> Result<Account, CliError> {
    let entry = AccountEntry::new(resolved.contract(), &[]);
    Ok(Account::open(&resolved.config, entry, credential_store())?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}
