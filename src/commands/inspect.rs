// ABOUTME: Read-only commands: list, show and exists.
// ABOUTME: Never modify server state.

use lxdc::output::{Output, OutputMode};
use lxdc::registry::ContainerRegistry;
use serde::Serialize;

use super::{CliError, Result, parse_name};

#[derive(Serialize)]
struct Summary<'a> {
    name: &'a str,
    status: String,
    status_code: u16,
    ephemeral: bool,
}

pub async fn list(registry: &ContainerRegistry, output: &Output) -> Result<()> {
    let containers = registry.get_all().await?;
    if containers.is_empty() {
        output.progress("No containers");
        return Ok(());
    }

    let width = containers
        .iter()
        .map(|c| c.name().as_str().len())
        .max()
        .unwrap_or(0);

    for container in &containers {
        let status = container.status();
        let text = match output.mode() {
            OutputMode::Quiet => container.name().to_string(),
            _ => format!("{:<width$}  {}", container.name(), status),
        };
        output.value(
            &text,
            &Summary {
                name: container.name().as_str(),
                status: status.to_string(),
                status_code: container.status_code().map(|c| c.code()).unwrap_or(0),
                ephemeral: container.is_ephemeral(),
            },
        );
    }
    Ok(())
}

pub async fn show(registry: &ContainerRegistry, name: &str, output: &Output) -> Result<()> {
    let name = parse_name(name)?;
    let container = registry.get(&name).await?;
    let yaml = serde_yaml::to_string(container.metadata())
        .unwrap_or_else(|e| format!("# failed to render document: {e}"));
    output.value(yaml.trim_end(), container.metadata());
    Ok(())
}

pub async fn exists(registry: &ContainerRegistry, name: &str, output: &Output) -> Result<()> {
    let name = parse_name(name)?;
    if registry.exists(&name).await? {
        output.value(name.as_str(), &serde_json::json!({ "name": name.as_str(), "exists": true }));
        Ok(())
    } else {
        Err(CliError::Absent(name))
    }
}
