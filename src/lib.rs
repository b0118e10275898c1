// ABOUTME: Library root for lxdc - container lifecycle proxy over the LXD REST API.
// ABOUTME: The main binary is in main.rs.

pub mod client;
pub mod config;
pub mod container;
pub mod error;
pub mod operation;
pub mod output;
pub mod registry;
pub mod types;

pub use client::{ResourceClient, UnixSocketClient};
pub use container::{Container, ContainerSettings, Local, Remote, StateAction, StateChange};
pub use error::{Error, ErrorKind, Result};
pub use registry::ContainerRegistry;
