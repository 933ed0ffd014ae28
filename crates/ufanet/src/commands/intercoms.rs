//! Intercom command handlers.

use tabled::Tabled;

use ufanet_core::{Account, Entity, Intercom};

use crate::cli::{GlobalOpts, IntercomsArgs, IntercomsCommand};
use crate::config::ResolvedAccount;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct IntercomRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
}

impl From<&Intercom> for IntercomRow {
    fn from(intercom: &Intercom) -> Self {
        Self {
            id: intercom.id,
            name: intercom.display_name(),
            address: intercom.address.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(
    resolved: &ResolvedAccount,
    args: IntercomsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        IntercomsCommand::List => {
            let account = util::open_account(resolved)?;
            let intercoms = account.client().list_intercoms(account.sink()).await.map_err(ufanet_core::CoreError::from)?;
            let out = output::render_list(
                &global.output,
                &intercoms,
                |i: &Intercom| IntercomRow::from(i),
                |i| i.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        IntercomsCommand::Open { id } => {
            let account = Account::discover(&resolved.config, util::credential_store()).await?;
            let button = account
                .buttons()
                .into_iter()
                .find(|b| b.intercom_id() == id)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "intercom".into(),
                    identifier: id.to_string(),
                    list_command: "intercoms list".into(),
                })?;

            if !button.press().await? {
                return Err(CliError::ApiError {
                    message: format!("intercom {id} did not confirm the door opened"),
                });
            }
            output::status(&format!("Opened {}", button.name()), global.quiet);
            Ok(())
        }
    }
}
