// ABOUTME: Commands that edit a container's raw configuration.
// ABOUTME: Fetches a fresh snapshot, edits it and pushes it with the snapshot's ETag.

use lxdc::output::Output;
use lxdc::registry::ContainerRegistry;

use super::{Result, parse_name};

pub async fn set_config(
    registry: &ContainerRegistry,
    name: &str,
    key: &str,
    value: &str,
    output: &Output,
) -> Result<()> {
    let name = parse_name(name)?;
    let mut container = registry.get(&name).await?;
    container.edit().set_config(key, value);
    container.update().await?;
    output.success(&format!("Set {key} on {name}"));
    Ok(())
}

pub async fn unset_config(
    registry: &ContainerRegistry,
    name: &str,
    key: &str,
    output: &Output,
) -> Result<()> {
    let name = parse_name(name)?;
    let mut container = registry.get(&name).await?;
    if !container.config().contains_key(key) {
        output.warning(&format!("{key} is not set on {name}"));
        return Ok(());
    }
    container.edit().unset_config(key);
    container.update().await?;
    output.success(&format!("Removed {key} from {name}"));
    Ok(())
}
