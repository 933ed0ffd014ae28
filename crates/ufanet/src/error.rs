//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, setup outcomes and config failures into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ufanet_config::ConfigError;
use ufanet_core::{CoreError, SetupError, StoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(ufanet::connection_failed),
        help("Check your network connection, or the --base-url override.\nURL: {url}")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ufanet::auth_failed),
        help(
            "The stored session can no longer be renewed.\n\
             Run: ufanet reauth"
        )
    )]
    AuthFailed { message: String },

    #[error("Invalid contract or password")]
    #[diagnostic(
        code(ufanet::invalid_credentials),
        help("Check the contract number and password from your Ufanet account.")
    )]
    InvalidCredentials,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(ufanet::not_found),
        help("Run: ufanet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("No intercoms found for contract {contract}")]
    #[diagnostic(
        code(ufanet::no_intercoms),
        help("This account has no shared intercoms; there is nothing to control.")
    )]
    NoIntercoms { contract: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(ufanet::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ufanet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ufanet::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ufanet config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No contract configured")]
    #[diagnostic(
        code(ufanet::no_config),
        help(
            "Create a profile with: ufanet config init\n\
             Or pass --contract (UFANET_CONTRACT).\n\
             Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ufanet::config))]
    Config(Box<figment::Error>),

    #[error("Credential storage failed: {0}")]
    #[diagnostic(code(ufanet::credentials))]
    Store(#[from] StoreError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(ufanet::timeout),
        help("Increase timeout with --timeout or try again later.")
    )]
    Timeout,

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::InvalidCredentials => exit_code::AUTH,
            Self::NotFound { .. } | Self::NoIntercoms { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Api { message, .. } => CliError::ApiError { message },

            CoreError::Store(e) => CliError::Store(e),

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl CliError {
    /// Translate a setup outcome for `contract`.
    pub fn from_setup(err: SetupError, contract: &str) -> Self {
        match err {
            SetupError::Auth => CliError::InvalidCredentials,
            SetupError::NoIntercoms => CliError::NoIntercoms {
                contract: contract.into(),
            },
            SetupError::Unknown(message) => CliError::ApiError { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Keyring(reason) => CliError::Validation {
                field: "keyring".into(),
                reason,
            },
        }
    }
}
