// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use lxdc::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lxdc")]
#[command(about = "Manage LXD containers through the local REST socket")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON lines instead of text
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub json: bool,

    /// Print bare values only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: discovered lxdc.yml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// LXD unix socket (default: detected)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List containers and their status
    List,

    /// Print a container's full document
    Show { name: String },

    /// Exit 0 if the container exists, 1 otherwise
    Exists { name: String },

    /// Create a container with an empty root filesystem
    Create {
        name: String,

        /// Raw configuration entry (repeatable)
        #[arg(short = 'c', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, String)>,

        /// Profile to apply (repeatable)
        #[arg(short, long = "profile")]
        profiles: Vec<String>,

        /// Destroy the container when it stops
        #[arg(long)]
        ephemeral: bool,

        #[arg(long)]
        description: Option<String>,
    },

    /// Stop and delete a container
    Delete { name: String },

    Start(StateArgs),
    Stop(StateArgs),
    Restart(StateArgs),
    Freeze(StateArgs),
    Unfreeze(StateArgs),

    /// Set a raw configuration key
    SetConfig {
        name: String,
        key: String,
        value: String,
    },

    /// Remove a raw configuration key
    UnsetConfig { name: String, key: String },
}

#[derive(Args)]
pub struct StateArgs {
    pub name: String,

    /// Kill instead of shutting down cleanly
    #[arg(long)]
    pub force: bool,

    /// Checkpoint on stop, restore on start
    #[arg(long)]
    pub stateful: bool,

    /// Override the configured state timeout
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}
