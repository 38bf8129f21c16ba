//! CLI argument definitions using clap
//!
//! Commands:
//! - walletapps check --settings <path>
//! - walletapps info --config <path> --app <url>
//! - walletapps items --config <path> --wallet <id> --app <url> --model <name> list|get|set|add|delete
//! - walletapps action --config <path> --wallet <id> --app <url> --name <action>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// walletapps - per-wallet app data with schema validation and scripts
#[derive(Parser, Debug)]
#[command(name = "walletapps")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a settings document and exit
    Check {
        /// Path to the settings JSON file
        #[arg(long)]
        settings: PathBuf,
    },

    /// Print an installed app's validated settings
    Info {
        /// Path to configuration file
        #[arg(long, default_value = "./walletapps.json")]
        config: PathBuf,

        /// App URL
        #[arg(long)]
        app: String,
    },

    /// Read or write items of one model
    Items {
        #[command(flatten)]
        target: ItemTarget,

        #[command(subcommand)]
        action: ItemsAction,
    },

    /// Run an app action; params are read from stdin
    Action {
        /// Path to configuration file
        #[arg(long, default_value = "./walletapps.json")]
        config: PathBuf,

        /// Wallet the action runs for
        #[arg(long)]
        wallet: String,

        /// App URL
        #[arg(long)]
        app: String,

        /// Action name
        #[arg(long)]
        name: String,
    },
}

/// The model whose items a command touches
#[derive(Args, Debug, Clone)]
pub struct ItemTarget {
    /// Path to configuration file
    #[arg(long, default_value = "./walletapps.json")]
    pub config: PathBuf,

    /// Wallet id
    #[arg(long)]
    pub wallet: String,

    /// App URL
    #[arg(long)]
    pub app: String,

    /// Model name
    #[arg(long)]
    pub model: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ItemsAction {
    /// List items with computed fields and filter applied
    List,

    /// Print one stored item
    Get {
        #[arg(long)]
        key: String,
    },

    /// Store the item read from stdin at a key
    Set {
        #[arg(long)]
        key: String,
    },

    /// Store the item read from stdin under a new key
    Add,

    /// Remove an item
    Delete {
        #[arg(long)]
        key: String,
    },
}

impl ItemsAction {
    /// Whether the command needs an item body on stdin
    pub fn reads_body(&self) -> bool {
        matches!(self, ItemsAction::Set { .. } | ItemsAction::Add)
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
