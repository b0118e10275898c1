// ABOUTME: Command handlers for the lxdc CLI.
// ABOUTME: Each handler validates its arguments, calls the registry and reports through Output.

mod edit;
mod inspect;
mod lifecycle;

pub use edit::{set_config, unset_config};
pub use inspect::{exists, list, show};
pub use lifecycle::{CreateRequest, change_state, create, delete};

use lxdc::client::DetectionError;
use lxdc::config::ConfigError;
use lxdc::types::{ContainerName, ContainerNameError};
use thiserror::Error;

/// Failures reported by the binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Container(#[from] lxdc::Error),

    #[error("invalid container name: {0}")]
    InvalidName(#[from] ContainerNameError),

    #[error("container {0} does not exist")]
    Absent(ContainerName),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

fn parse_name(raw: &str) -> Result<ContainerName> {
    Ok(ContainerName::new(raw)?)
}
