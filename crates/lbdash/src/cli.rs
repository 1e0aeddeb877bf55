//! Clap derive structures for the `lbdash` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use lbdash_api::{CheckType, Mode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lbdash -- operational dashboard for the load-balancer control plane
#[derive(Debug, Parser)]
#[command(
    name = "lbdash",
    version,
    about = "Inspect and manage load-balancer services from the command line",
    long_about = "A CLI for the load-balancer control plane.\n\n\
        Lists services and backend server health, changes distribution\n\
        modes, edits the service topology, and follows the live log stream.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "LBDASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'b', env = "LBDASH_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LBDASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "LBDASH_TIMEOUT", default_value = "10", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Distribution modes as CLI values.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// All traffic to the first healthy server
    Failover,
    /// Traffic rotated across healthy servers
    RoundRobin,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Failover => Mode::Failover,
            ModeArg::RoundRobin => Mode::RoundRobin,
        }
    }
}

/// Health-check types as CLI values.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CheckTypeArg {
    /// TCP connect check
    Tcp,
    /// HTTP GET check against --http-path
    Http,
    /// SMPP bind check
    Smpp,
}

impl From<CheckTypeArg> for CheckType {
    fn from(value: CheckTypeArg) -> Self {
        match value {
            CheckTypeArg::Tcp => CheckType::Tcp,
            CheckTypeArg::Http => CheckType::Http,
            CheckTypeArg::Smpp => CheckType::Smpp,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show connectivity and per-server health at a glance
    #[command(alias = "st")]
    Status,

    /// Manage services (listeners)
    #[command(alias = "svc", alias = "s")]
    Services(ServicesArgs),

    /// Manage backend servers within a service
    #[command(alias = "srv")]
    Servers(ServersArgs),

    /// Set a service's distribution mode
    Mode {
        /// Service name
        service: String,
        /// New distribution mode
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Follow the live log stream (Ctrl-C to stop)
    Logs,

    /// Live dashboard: re-render status on every change (Ctrl-C to stop)
    Watch,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Services ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServicesArgs {
    #[command(subcommand)]
    pub command: ServicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServicesCommand {
    /// List configured services
    #[command(alias = "ls")]
    List,

    /// Add a service
    Add {
        /// Service name
        name: String,
        /// Frontend listen port
        listen_port: u16,
        /// Distribution mode
        #[arg(long, value_enum, default_value = "failover")]
        mode: ModeArg,
    },

    /// Edit a service (unset fields stay unchanged)
    Edit {
        /// Service name
        name: String,
        /// Rename the service
        #[arg(long)]
        new_name: Option<String>,
        /// Change the listen port
        #[arg(long)]
        listen_port: Option<u16>,
        /// Change the distribution mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Remove a service and all its servers
    #[command(alias = "rm")]
    Remove {
        /// Service name
        name: String,
    },
}

// ── Servers ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServersArgs {
    #[command(subcommand)]
    pub command: ServersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServersCommand {
    /// List the servers of one service
    #[command(alias = "ls")]
    List {
        /// Service name
        service: String,
    },

    /// Add a backend server to a service
    Add {
        /// Service name
        service: String,
        /// Server IP address
        ip: String,
        /// Server port
        port: u16,
        /// Health-check type
        #[arg(long, value_enum, default_value = "tcp")]
        check_type: CheckTypeArg,
        /// Request path for HTTP checks (ignored otherwise)
        #[arg(long)]
        http_path: Option<String>,
    },

    /// Edit a server, identified by service + ip + port
    Edit {
        /// Service name
        service: String,
        /// Current server IP
        ip: String,
        /// Current server port
        port: u16,
        /// New IP address
        #[arg(long)]
        new_ip: Option<String>,
        /// New port
        #[arg(long)]
        new_port: Option<u16>,
        /// New health-check type
        #[arg(long, value_enum)]
        check_type: Option<CheckTypeArg>,
    },

    /// Remove a server from a service
    #[command(alias = "rm")]
    Remove {
        /// Service name
        service: String,
        /// Server IP
        ip: String,
        /// Server port
        port: u16,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a starter config file with a default profile
    Init {
        /// Backend URL for the default profile
        backend: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
