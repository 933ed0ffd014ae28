//! Config subcommand handlers.

use std::collections::BTreeMap;

use dialoguer::Input;
use secrecy::ExposeSecret;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the password.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "base_url = \"{}\"", cfg.defaults.base_url);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let sorted: BTreeMap<_, _> = cfg.profiles.iter().collect();
    for (name, p) in sorted {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "contract = \"{}\"", p.contract);
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref url) = p.base_url {
            let _ = writeln!(out, "base_url = \"{url}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn available_profiles(cfg: &Config) -> String {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    if available.is_empty() {
        "(none)".into()
    } else {
        available.join(", ")
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: flags first, prompt for the rest ──────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            let mut cfg = config::load_config_or_default();
            let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());

            let contract = match global.contract.clone() {
                Some(contract) => contract,
                None if global.yes => {
                    return Err(CliError::Validation {
                        field: "contract".into(),
                        reason: "pass --contract when running non-interactively".into(),
                    });
                }
                None => Input::new()
                    .with_prompt("Contract number")
                    .interact_text()
                    .map_err(prompt_err)?,
            };
            if contract.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "contract".into(),
                    reason: "contract cannot be empty".into(),
                });
            }

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            profile.contract = contract.trim().to_owned();
            if let Some(ref url) = global.base_url {
                profile.base_url = Some(url.clone());
            }
            if let Some(timeout) = global.timeout {
                profile.timeout = Some(timeout);
            }
            if !cfg.profiles.contains_key(cfg.active_profile_name()) {
                cfg.default_profile = Some(profile_name.clone());
            }

            config::save_config(&cfg)?;

            output::status(
                &format!(
                    "Configuration written to {}\n  Profile: {profile_name}\n\n  Next: ufanet login",
                    config_path.display()
                ),
                global.quiet,
            );
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.password.is_some() {
                    profile.password = Some("****".into());
                }
            }
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile: &mut Profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "contract" => profile.contract = value,
                "base_url" | "base-url" => {
                    if !value.starts_with("http://") && !value.starts_with("https://") {
                        return Err(CliError::Validation {
                            field: "base_url".into(),
                            reason: format!("invalid URL: {value}"),
                        });
                    }
                    profile.base_url = Some(value);
                }
                "password_env" | "password-env" => profile.password_env = Some(value),
                "timeout" => {
                    profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: contract, base_url, \
                             password_env, timeout"
                        ),
                    });
                }
            }

            config::save_config(&cfg)?;
            output::status(&format!("Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.active_profile_name();
            if cfg.profiles.is_empty() {
                output::status("No profiles configured. Run: ufanet config init", global.quiet);
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                let listing = names
                    .into_iter()
                    .map(|name| {
                        let marker = if name == default { " *" } else { "" };
                        format!("{name}{marker}")
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                output::print_output(&listing, global.quiet);
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::status(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let contract = cfg
                .profiles
                .get(&profile_name)
                .map(|p| p.contract.clone())
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: available_profiles(&cfg),
                })?;

            let password = config::prompt_password(&contract)?;
            config::store_password(&profile_name, password.expose_secret())?;
            output::status(
                &format!("Password for profile '{profile_name}' stored in system keyring"),
                global.quiet,
            );
            Ok(())
        }
    }
}
