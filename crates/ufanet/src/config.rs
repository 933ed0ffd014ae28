//! CLI configuration: a thin wrapper around `ufanet_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--contract, --base-url, --timeout).

use secrecy::SecretString;

use ufanet_core::AccountConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use ufanet_config::{
    Config, CredentialFile, Profile, config_path, load_config_or_default,
    profile_to_account_config, resolve_password, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Everything a command needs to talk to the backend.
#[derive(Debug)]
pub struct ResolvedAccount {
    pub profile_name: String,
    pub config: AccountConfig,
}

impl ResolvedAccount {
    pub fn contract(&self) -> &str {
        &self.config.contract
    }
}

/// Build an `AccountConfig` from the config file, profile, and CLI
/// overrides. The configured password, if any, is attached.
pub fn resolve_account(global: &GlobalOpts) -> Result<ResolvedAccount, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let fallback;
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        // An explicitly named profile must exist.
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            fallback = Profile::default();
            &fallback
        }
    };

    // Flags (and their env vars) override the profile.
    let effective = Profile {
        contract: global
            .contract
            .clone()
            .unwrap_or_else(|| profile.contract.clone()),
        password: profile.password.clone(),
        password_env: profile.password_env.clone(),
        base_url: global.base_url.clone().or_else(|| profile.base_url.clone()),
        timeout: global.timeout.or(profile.timeout),
    };
    if effective.contract.trim().is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    let mut config = profile_to_account_config(&effective, &cfg.defaults)?;
    if let Some(password) = resolve_password(&effective, &profile_name) {
        config = config.with_password(password);
    }

    Ok(ResolvedAccount {
        profile_name,
        config,
    })
}

/// Prompt for a password on the terminal.
pub fn prompt_password(contract: &str) -> Result<SecretString, CliError> {
    let password = rpassword::prompt_password(format!("Password for contract {contract}: "))?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}
