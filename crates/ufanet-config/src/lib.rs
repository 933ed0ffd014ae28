//! Shared configuration for Ufanet tools.
//!
//! TOML profiles, password resolution (env + keyring + plaintext),
//! the on-disk credential file, and translation to
//! `ufanet_core::AccountConfig`. The CLI adds flag-aware wrappers on top.

mod credentials;

pub use credentials::CredentialFile;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ufanet_core::{AccountConfig, DEFAULT_BASE_URL};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "ufanet";

/// Fallback env var consulted for every profile.
pub const PASSWORD_ENV: &str = "UFANET_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_timeout() -> u64 {
    30
}

/// A named account profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Contract (account) number.
    pub contract: String,

    /// Plaintext password. Prefer the keyring or an env var.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override the API root.
    pub base_url: Option<String>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("ru", "ufanet", "ufanet")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where persisted tokens live.
pub fn credentials_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("credentials.json"),
        |dirs| dirs.data_dir().join("credentials.json"),
    )
}

fn dirs_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("ufanet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file; environment overrides still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UFANET_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Password resolution (without CLI flags) ─────────────────────────

/// Resolve a profile's password. `None` is not an error: a stored
/// refresh token may be enough.
///
/// Order: the profile's `password_env` var, `UFANET_PASSWORD`, the
/// system keyring, plaintext in the config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_password_with(
        profile,
        |name| std::env::var(name).ok(),
        || keyring_password(profile_name),
    )
}

/// [`resolve_password`] with injectable env and keyring lookups.
pub fn resolve_password_with(
    profile: &Profile,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Option<SecretString> {
    // 1. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Some(SecretString::from(pw));
    }

    // 2. Generic env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring() {
        return Some(SecretString::from(pw));
    }

    // 4. Plaintext in config
    profile.password.clone().map(SecretString::from)
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .ok()?
        .get_password()
        .ok()
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to runtime config ───────────────────────────────────

/// Build an `AccountConfig` from a profile. CLI flag overrides are applied by the caller.
pub fn profile_to_account_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<AccountConfig, ConfigError> {
    if profile.contract.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "contract".into(),
            reason: "must not be empty".into(),
        });
    }

    let base_url = profile.base_url.as_deref().unwrap_or(&defaults.base_url);
    url::Url::parse(base_url).map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {base_url}"),
    })?;

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(AccountConfig::new(profile.contract.trim())
        .with_base_url(base_url)
        .with_timeout(timeout))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> Profile {
        Profile {
            contract: "100200300".into(),
            password: Some("plain".into()),
            password_env: Some("MY_UFANET_PW".into()),
            ..Profile::default()
        }
    }

    fn resolved(
        profile: &Profile,
        env: &[(&str, &str)],
        keyring: Option<&str>,
    ) -> Option<String> {
        resolve_password_with(
            profile,
            |name| {
                env.iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| (*v).to_owned())
            },
            || keyring.map(str::to_owned),
        )
        .map(|s| s.expose_secret().to_owned())
    }

    #[test]
    fn password_resolution_order() {
        let p = profile();
        let all = [("MY_UFANET_PW", "from-profile-env"), (PASSWORD_ENV, "from-env")];

        assert_eq!(resolved(&p, &all, Some("kr")).as_deref(), Some("from-profile-env"));
        assert_eq!(resolved(&p, &all[1..], Some("kr")).as_deref(), Some("from-env"));
        assert_eq!(resolved(&p, &[], Some("kr")).as_deref(), Some("kr"));
        assert_eq!(resolved(&p, &[], None).as_deref(), Some("plain"));

        let bare = Profile {
            contract: "1".into(),
            ..Profile::default()
        };
        assert_eq!(resolved(&bare, &[], None), None);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.defaults.timeout = 12;
        cfg.profiles.insert("home".into(), profile());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.defaults.timeout, 12);
        assert_eq!(loaded.active_profile_name(), "default");
        let home = loaded.profile("home").unwrap();
        assert_eq!(home.contract, "100200300");
        assert_eq!(home.password_env.as_deref(), Some("MY_UFANET_PW"));
        assert!(matches!(
            loaded.profile("work"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.defaults.base_url, "https://dom.ufanet.ru/");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn account_config_applies_overrides() {
        let defaults = Defaults::default();
        let mut p = profile();
        let account = profile_to_account_config(&p, &defaults).unwrap();
        assert_eq!(account.contract, "100200300");
        assert_eq!(account.timeout, Duration::from_secs(30));
        assert_eq!(account.base_url, "https://dom.ufanet.ru/");

        p.base_url = Some("http://127.0.0.1:8080".into());
        p.timeout = Some(5);
        let account = profile_to_account_config(&p, &defaults).unwrap();
        assert_eq!(account.base_url, "http://127.0.0.1:8080");
        assert_eq!(account.timeout, Duration::from_secs(5));

        p.base_url = Some("not a url".into());
        assert!(matches!(
            profile_to_account_config(&p, &defaults),
            Err(ConfigError::Validation { .. })
        ));

        p.base_url = None;
        p.contract = "  ".into();
        assert!(matches!(
            profile_to_account_config(&p, &defaults),
            Err(ConfigError::Validation { .. })
        ));
    }
}
