//! Command dispatch: bridges CLI args -> core accounts -> output formatting.

pub mod cameras;
pub mod config_cmd;
pub mod intercoms;
pub mod login;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::ResolvedAccount;
use crate::error::CliError;

/// Dispatch an account-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    account: &ResolvedAccount,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::login(account, args, global).await,
        Command::Reauth(args) => login::reauth(account, args, global).await,
        Command::Logout => login::logout(account, global),
        Command::Intercoms(args) => intercoms::handle(account, args, global).await,
        Command::Cameras(args) => cameras::handle(account, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
