// ── Account setup ──
//
// Credential validation for first-time setup and re-authentication.
// Both list the account's intercoms with a password-only client: the
// listing forces a login, and the resulting refresh token reaches the
// store through the sink before we return.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, error, info};
use ufanet_api::{Intercom, UfanetClient};

use crate::account::AccountEntry;
use crate::config::AccountConfig;
use crate::store::{CredentialStore, StoreSink};

/// User-facing setup outcome.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid contract or password")]
    Auth,

    #[error("no intercoms found for this contract")]
    NoIntercoms,

    #[error("unexpected error: {0}")]
    Unknown(String),
}

/// Validate `contract` + `password` and record the account.
///
/// On success the password and the freshly issued refresh token are in
/// `store`, and the returned entry lists the account's intercoms.
pub async fn validate_credentials(
    config: &AccountConfig,
    password: &SecretString,
    store: &Arc<dyn CredentialStore>,
) -> Result<AccountEntry, SetupError> {
    let intercoms = login_and_list(config, password, store).await?;
    if intercoms.is_empty() {
        return Err(SetupError::NoIntercoms);
    }

    remember_password(config, password, store)?;
    info!(contract = %config.contract, intercoms = intercoms.len(), "credentials validated");
    Ok(AccountEntry::new(config.contract.clone(), &intercoms))
}

/// Re-enter the password for an existing contract.
///
/// Existing stored tokens are ignored: the new password must work on its
/// own. Fresh tokens and the new password replace the stored ones.
pub async fn reauthenticate(
    config: &AccountConfig,
    password: &SecretString,
    store: &Arc<dyn CredentialStore>,
) -> Result<(), SetupError> {
    login_and_list(config, password, store).await?;
    remember_password(config, password, store)?;
    info!(contract = %config.contract, "re-authenticated");
    Ok(())
}

async fn login_and_list(
    config: &AccountConfig,
    password: &SecretString,
    store: &Arc<dyn CredentialStore>,
) -> Result<Vec<Intercom>, SetupError> {
    let client: UfanetClient = config
        .client_builder()
        .password(password.clone())
        .build()
        .map_err(|e| SetupError::Unknown(e.to_string()))?;
    let sink = StoreSink::new(Arc::clone(store), config.contract.clone());

    client.list_intercoms(&sink).await.map_err(|e| {
        if e.is_auth() {
            debug!(contract = %config.contract, error = %e, "credentials rejected");
            SetupError::Auth
        } else {
            error!(contract = %config.contract, error = %e, "unexpected error during setup");
            SetupError::Unknown(e.to_string())
        }
    })
}

fn remember_password(
    config: &AccountConfig,
    password: &SecretString,
    store: &Arc<dyn CredentialStore>,
) -> Result<(), SetupError> {
    store
        .update(&config.contract, &mut |record| {
            record.password = Some(password.expose_secret().to_owned());
        })
        .map_err(|e| SetupError::Unknown(e.to_string()))
}
