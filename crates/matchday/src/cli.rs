//! Clap derive structures for the `matchday` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

use matchday_core::Sport;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// matchday -- live scores and ball-by-ball commentary in the terminal
#[derive(Debug, Parser)]
#[command(
    name = "matchday",
    version,
    about = "Follow live matches and commentary from the command line",
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
    /// Service profile to use
    #[arg(long, short = 'p', env = "MATCHDAY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// REST base URL (overrides profile)
    #[arg(long, env = "MATCHDAY_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MATCHDAY_OUTPUT",
        default_value = "text",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "MATCHDAY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MATCHDAY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Skip the push channel and poll REST only
    #[arg(long, global = true)]
    pub no_push: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines (default)
    Text,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON, one document per update
    JsonCompact,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow a match's live snapshot over the push channel
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Print the merged commentary feed for a match
    #[command(alias = "c")]
    Commentary(CommentaryArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Match ID
    pub match_id: String,

    /// Sport the match belongs to
    #[arg(long, short = 's', default_value = "cricket")]
    pub sport: SportArg,

    /// Also print discrete events (wickets, goals, notifications)
    #[arg(long, short = 'e')]
    pub events: bool,

    /// Exit after this many snapshot updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SportArg {
    Cricket,
    #[value(alias = "soccer")]
    Football,
}

impl From<SportArg> for Sport {
    fn from(arg: SportArg) -> Self {
        match arg {
            SportArg::Cricket => Sport::Cricket,
            SportArg::Football => Sport::Football,
        }
    }
}

// ── Commentary ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CommentaryArgs {
    /// Match ID
    pub match_id: String,

    /// Keep refreshing and print each new feed
    #[arg(long, short = 'f')]
    pub follow: bool,

    /// Which feed to print
    #[arg(long, short = 'i', default_value = "all")]
    pub innings: InningsArg,

    /// Show at most this many entries
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Refresh period in seconds when following (overrides profile)
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InningsArg {
    All,
    First,
    Second,
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

    /// Display the resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set a value on the active profile
    Set {
        /// Profile key (api_url, live_url, push, upgrade, ca_cert, insecure,
        /// timeout, reconnect_attempts, reconnect_max_delay,
        /// commentary_interval, snapshot_interval)
        key: String,

        value: String,
    },

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },
}
