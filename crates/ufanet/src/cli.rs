//! Clap derive structures for the `ufanet` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ufanet -- open doors and watch cameras of a Ufanet account
#[derive(Debug, Parser)]
#[command(
    name = "ufanet",
    version,
    about = "Ufanet intercoms and cameras from the command line",
    long_about = "Open intercom doors and fetch camera streams and snapshots\n\
        for a Ufanet (dom.ufanet.ru) account.\n\n\
        Log in once with `ufanet login`; refreshed tokens are kept on disk\n\
        so later commands run without the password.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "UFANET_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Contract number (overrides profile)
    #[arg(long, short = 'c', env = "UFANET_CONTRACT", global = true)]
    pub contract: Option<String>,

    /// API root (overrides profile)
    #[arg(long, env = "UFANET_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "UFANET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "UFANET_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate contract + password and remember the account
    Login(LoginArgs),

    /// Re-enter the password for the current contract
    Reauth(LoginArgs),

    /// Forget stored tokens and password for the current contract
    Logout,

    /// List and open intercoms
    #[command(alias = "ic")]
    Intercoms(IntercomsArgs),

    /// List cameras, print stream URLs, save snapshots
    #[command(alias = "cam")]
    Cameras(CamerasArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGIN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Password (prompted for when not given or configured)
    #[arg(long)]
    pub password: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INTERCOMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct IntercomsArgs {
    #[command(subcommand)]
    pub command: IntercomsCommand,
}

#[derive(Debug, Subcommand)]
pub enum IntercomsCommand {
    /// List intercoms shared with the account
    #[command(alias = "ls")]
    List,

    /// Open the door of an intercom
    Open {
        /// Intercom ID
        #[arg(value_name = "ID")]
        id: i64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CAMERAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CamerasArgs {
    #[command(subcommand)]
    pub command: CamerasCommand,
}

#[derive(Debug, Subcommand)]
pub enum CamerasCommand {
    /// List cameras available to the account
    #[command(alias = "ls")]
    List,

    /// Print the RTSP stream URL of a camera
    Stream {
        /// Camera number
        #[arg(value_name = "NUMBER")]
        number: String,
    },

    /// Save a JPEG snapshot of a camera
    Snapshot {
        /// Camera number
        #[arg(value_name = "NUMBER")]
        number: String,

        /// Output file
        #[arg(long, short = 'O', value_name = "FILE")]
        out: PathBuf,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile (prompts for anything not given by flags)
    Init,

    /// Display current configuration (passwords masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: contract, base_url, password_env, timeout
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the profile's password in the system keyring
    SetPassword,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
