// ABOUTME: Commands that create, delete or change the state of a container.
// ABOUTME: Each waits for the server to finish before reporting success.

use lxdc::container::{StateAction, StateChange};
use lxdc::output::Output;
use lxdc::registry::ContainerRegistry;
use std::time::Duration;

use super::{Result, parse_name};
use crate::cli::StateArgs;

/// Arguments for `create`.
pub struct CreateRequest {
    pub name: String,
    pub config: Vec<(String, String)>,
    pub profiles: Vec<String>,
    pub ephemeral: bool,
    pub description: Option<String>,
}

pub async fn create(
    registry: &ContainerRegistry,
    request: CreateRequest,
    output: &mut Output,
) -> Result<()> {
    let name = parse_name(&request.name)?;
    output.start_timer();
    output.progress(&format!("  → Creating {name}..."));

    let mut container = registry.local(name).ephemeral(request.ephemeral);
    for (key, value) in request.config {
        container = container.with_config(key, value);
    }
    for profile in request.profiles {
        container = container.with_profile(profile);
    }
    if let Some(description) = request.description {
        container = container.with_description(description);
    }

    let created = container.create().await?;
    output.success(&format!("Created {} ({})", created.name(), created.status()));
    Ok(())
}

pub async fn delete(registry: &ContainerRegistry, name: &str, output: &mut Output) -> Result<()> {
    let name = parse_name(name)?;
    output.start_timer();
    let container = registry.get(&name).await?;
    output.progress(&format!("  → Stopping and deleting {name}..."));
    container.delete().await?;
    output.success(&format!("Deleted {name}"));
    Ok(())
}

pub async fn change_state(
    registry: &ContainerRegistry,
    action: StateAction,
    args: &StateArgs,
    output: &mut Output,
) -> Result<()> {
    let name = parse_name(&args.name)?;
    let timeout = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(registry.settings().state_timeout);
    let request = StateChange::new(action, timeout)
        .force(args.force)
        .stateful(args.stateful);
    // Reject bad option combinations before touching the server.
    request.validate()?;

    output.start_timer();
    let mut container = registry.get(&name).await?;
    output.progress(&format!("  → Sending {action} to {name}..."));
    container.change_state(request).await?;
    output.success(&format!("{name} is {}", container.status()));
    Ok(())
}
