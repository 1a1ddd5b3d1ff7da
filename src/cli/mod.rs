//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::model::When;

pub mod commands;

/// thira - bring Jira tickets into Things 3
#[derive(Parser, Debug)]
#[command(name = "thira", author, version, about, long_about = None)]
pub struct Cli {
    /// Command to run (default: sync)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path (default: ~/.config/thira/config.json)
    #[arg(long, global = true, env = "THIRA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sync state file path (default: ~/.local/state/thira.json)
    #[arg(long, global = true, env = "THIRA_STATE")]
    pub state: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync tickets from Jira into Things
    Sync(SyncArgs),

    /// Show sync status
    Status {
        /// List every synced ticket id
        #[arg(long)]
        ids: bool,
    },

    /// Clear all sync state so every ticket syncs again
    Reset,

    /// Remove tickets from sync state so they sync again
    Remove {
        /// Ticket keys (e.g. OPS-123)
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Write a config file template
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SyncArgs {
    /// Custom JQL query (default: unresolved tickets assigned to you)
    #[arg(short, long)]
    pub jql: Option<String>,

    /// Maximum tickets to fetch (default: jira.max_results, 50)
    #[arg(short, long)]
    pub max_results: Option<u32>,

    /// Sync every fetched ticket, ignoring sync state
    #[arg(long)]
    pub force_resync: bool,

    /// Send already-synced tickets again (creates a second task)
    #[arg(long)]
    pub update_existing: bool,

    /// Show what would be synced without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Schedule created tasks (overrides things.when)
    #[arg(long, value_enum)]
    pub when: Option<When>,

    /// Things list or project id (overrides things.list_id)
    #[arg(long)]
    pub list_id: Option<String>,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
