// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Container names and the LXD status code table.

mod container_name;
mod status;

pub use container_name::{ContainerName, ContainerNameError};
pub use status::{ContainerStatus, StatusCode};
