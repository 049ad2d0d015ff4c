//! Clap derive structures for the `graylogctl` CLI.
//!
//! `-h` is the host (Nagios plugin convention), so help is `--help` only.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// graylogctl -- manage and monitor Graylog servers over the REST API
#[derive(Debug, Parser)]
#[command(
    name = "graylogctl",
    version,
    about = "Manage and monitor Graylog servers from the command line",
    long_about = "Manage users, streams and dashboards of a Graylog server, export them as\n\
        JSON backups, and run Nagios-compatible checks and control commands.",
    disable_help_flag = true,
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
    /// Print help
    #[arg(long, action = ArgAction::Help, global = true)]
    pub help: Option<bool>,

    /// Server profile to use
    #[arg(long, env = "GRAYLOG_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Graylog server host (overrides profile)
    #[arg(long, short = 'h', env = "GRAYLOG_HOST", global = true)]
    pub host: Option<String>,

    /// REST API port [default: 12900]
    #[arg(long, short = 'p', env = "GRAYLOG_PORT", global = true)]
    pub port: Option<u16>,

    /// Username for Basic authentication
    #[arg(long, short = 'u', env = "GRAYLOG_USERNAME", global = true)]
    pub user: Option<String>,

    /// Password for Basic authentication
    #[arg(
        long,
        short = 'P',
        env = "GRAYLOG_PASSWORD",
        global = true,
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Use HTTPS
    #[arg(long, global = true)]
    pub tls: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "GRAYLOG_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "GRAYLOG_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Check payloads against the server's schema documents
    #[arg(long, global = true)]
    pub validate_schemas: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GRAYLOG_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

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
    /// Nagios check: report inputs or streams in a bad state
    Check(CheckArgs),

    /// Nagios check: send a control command to an input or a stream
    Control(ControlArgs),

    /// Manage user accounts
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage streams
    #[command(alias = "s")]
    Streams(StreamsArgs),

    /// Manage dashboards
    #[command(alias = "d")]
    Dashboards(DashboardsArgs),

    /// Export a collection or a single entity as JSON
    Backup(BackupArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Nagios ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// What to check
    #[arg(value_enum)]
    pub target: CheckTarget,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CheckTarget {
    /// Every input must be RUNNING
    Inputs,
    /// Every stream must be enabled
    Streams,
}

#[derive(Debug, Args)]
pub struct ControlArgs {
    /// Kind of entity to control
    #[arg(value_enum)]
    pub target: ControlTarget,

    /// Input or stream id
    #[arg(long, short = 'i', default_value = "")]
    pub id: String,

    /// Command keyword (input: launch|stop|restart, stream: clone|pause|resume)
    #[arg(long, short = 'c', default_value = "")]
    pub command: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ControlTarget {
    Input,
    Stream,
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List user accounts
    #[command(alias = "ls")]
    List,

    /// Show one user
    Get { username: String },

    /// Delete a user
    #[command(alias = "rm")]
    Delete { username: String },
}

// ── Streams ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StreamsArgs {
    #[command(subcommand)]
    pub command: StreamsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StreamsCommand {
    /// List streams
    #[command(alias = "ls")]
    List,

    /// Show one stream
    Get { id: String },

    /// Look up a stream id by its exact title
    Find {
        #[arg(long, short = 't')]
        title: String,
    },

    /// Pause a running stream
    Pause { id: String },

    /// Resume a paused stream
    Resume { id: String },

    /// List the rule ids of a stream
    Rules { id: String },
}

// ── Dashboards ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DashboardsArgs {
    #[command(subcommand)]
    pub command: DashboardsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DashboardsCommand {
    /// List dashboards
    #[command(alias = "ls")]
    List,

    /// Show one dashboard
    Get { id: String },
}

// ── Backup ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Collection to export
    #[arg(value_enum)]
    pub collection: BackupCollection,

    /// Export only this entity
    #[arg(long, short = 'i')]
    pub id: Option<String>,

    /// Directory the export is written to
    #[arg(long, short = 'd', default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackupCollection {
    Users,
    Streams,
    Dashboards,
}

impl BackupCollection {
    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Streams => "streams",
            Self::Dashboards => "dashboards",
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// List configured profiles (passwords are never shown)
    Show,

    /// Create or update a profile from the global connection flags
    ///
    /// A password given with -P is stored in the system keyring, never in
    /// the config file.
    SetProfile {
        name: String,

        /// Also make it the default profile
        #[arg(long)]
        default: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
