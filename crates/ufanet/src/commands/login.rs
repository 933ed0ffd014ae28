//! Account lifecycle: login, reauth, logout.

use secrecy::SecretString;
use tabled::Tabled;

use ufanet_core::{AccountRegistry, IntercomEntry, setup};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::{self, ResolvedAccount};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct IntercomRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&IntercomEntry> for IntercomRow {
    fn from(entry: &IntercomEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
        }
    }
}

/// Flag, then configured password, then an interactive prompt.
fn password_for(account: &ResolvedAccount, args: LoginArgs) -> Result<SecretString, CliError> {
    match args.password {
        Some(password) if !password.is_empty() => Ok(SecretString::from(password)),
        _ => match account.config.password.clone() {
            Some(password) => Ok(password),
            None => config::prompt_password(account.contract()),
        },
    }
}

pub async fn login(
    account: &ResolvedAccount,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = password_for(account, args)?;
    let store = util::credential_store();

    let entry = setup::validate_credentials(&account.config, &password, &store)
        .await
        .map_err(|e| CliError::from_setup(e, account.contract()))?;

    output::status(
        &format!(
            "Logged in as contract {} ({} intercoms)",
            entry.contract,
            entry.intercoms.len()
        ),
        global.quiet,
    );
    let out = output::render_list(
        &global.output,
        &entry.intercoms,
        |i: &IntercomEntry| IntercomRow::from(i),
        |i| i.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn reauth(
    account: &ResolvedAccount,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = password_for(account, args)?;
    let store = util::credential_store();

    setup::reauthenticate(&account.config, &password, &store)
        .await
        .map_err(|e| CliError::from_setup(e, account.contract()))?;

    output::status(
        &format!("Re-authenticated contract {}", account.contract()),
        global.quiet,
    );
    Ok(())
}

pub fn logout(account: &ResolvedAccount, global: &GlobalOpts) -> Result<(), CliError> {
    let contract = account.contract();
    if !util::confirm(
        &format!("Forget stored credentials for contract {contract}?"),
        global.yes,
    )? {
        return Ok(());
    }

    let mut registry = AccountRegistry::new(util::credential_store());
    registry.remove(contract)?;
    output::status(&format!("Logged out of contract {contract}"), global.quiet);
    Ok(())
}
