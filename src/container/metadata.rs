// ABOUTME: The server-reported container document.
// ABOUTME: Typed view of the fields the proxy reads, with every other field preserved for round-trips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::types::StatusCode;

/// Attributes of a single device (`type`, `path`, `source`, ...).
pub type Device = HashMap<String, String>;

/// Full container document as last reported by the server.
///
/// Fields not modeled here land in `extra` and are sent back unchanged on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<StatusCode>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub config: HashMap<String, String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub expanded_config: HashMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: HashMap<String, Device>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub expanded_devices: HashMap<String, Device>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub profiles: Vec<String>,

    #[serde(default)]
    pub ephemeral: bool,

    #[serde(default)]
    pub stateful: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        ContainerMetadata {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the reported status is one a transition can start from.
    pub fn is_stable(&self) -> bool {
        self.status_code
            .is_some_and(|code| code.is_container_stable())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
