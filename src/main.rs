// ABOUTME: Entry point for the lxdc CLI application.
// ABOUTME: Parses arguments, connects to the LXD socket and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::{CliError, CreateRequest};
use lxdc::client::{UnixSocketClient, detect_socket};
use lxdc::config::Config;
use lxdc::container::StateAction;
use lxdc::output::Output;
use lxdc::registry::ContainerRegistry;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode());
    let result = run(cli, &mut output).await;

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let socket = detect_socket(cli.socket.as_deref().or(config.socket.as_deref()))?;
    tracing::debug!(socket = %socket.display(), "using LXD socket");

    let client = Arc::new(UnixSocketClient::new(socket));
    let registry = ContainerRegistry::with_settings(client, config.settings());

    match cli.command {
        Commands::List => commands::list(&registry, output).await,
        Commands::Show { name } => commands::show(&registry, &name, output).await,
        Commands::Exists { name } => commands::exists(&registry, &name, output).await,
        Commands::Create {
            name,
            set,
            profiles,
            ephemeral,
            description,
        } => {
            let request = CreateRequest {
                name,
                config: set,
                profiles,
                ephemeral,
                description,
            };
            commands::create(&registry, request, output).await
        }
        Commands::Delete { name } => commands::delete(&registry, &name, output).await,
        Commands::Start(args) => {
            commands::change_state(&registry, StateAction::Start, &args, output).await
        }
        Commands::Stop(args) => {
            commands::change_state(&registry, StateAction::Stop, &args, output).await
        }
        Commands::Restart(args) => {
            commands::change_state(&registry, StateAction::Restart, &args, output).await
        }
        Commands::Freeze(args) => {
            commands::change_state(&registry, StateAction::Freeze, &args, output).await
        }
        Commands::Unfreeze(args) => {
            commands::change_state(&registry, StateAction::Unfreeze, &args, output).await
        }
        Commands::SetConfig { name, key, value } => {
            commands::set_config(&registry, &name, &key, &value, output).await
        }
        Commands::UnsetConfig { name, key } => {
            commands::unset_config(&registry, &name, &key, output).await
        }
    }
}

/// Explicit `--config` must exist; otherwise discover one or use defaults.
fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => {
            let cwd = env::current_dir()?;
            Ok(Config::discover_or_default(&cwd)?)
        }
    }
}
