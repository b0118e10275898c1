// ABOUTME: Registry of containers reachable through one resource client.
// ABOUTME: Answers existence checks and produces remote container proxies by name.

use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

use crate::client::{CONTAINERS, ResourceClient, last_segment};
use crate::container::{Container, ContainerSettings, Local, fetch, not_found};
use crate::error::{Error, MalformedResponseSnafu, Result};
use crate::types::ContainerName;

/// Entry point for looking up containers.
#[derive(Clone)]
pub struct ContainerRegistry {
    client: Arc<dyn ResourceClient>,
    settings: ContainerSettings,
}

impl std::fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ContainerRegistry {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self::with_settings(client, ContainerSettings::default())
    }

    pub fn with_settings(client: Arc<dyn ResourceClient>, settings: ContainerSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// A local container sharing this registry's client and settings.
    pub fn local(&self, name: ContainerName) -> Container<Local> {
        Container::local(Arc::clone(&self.client), name).with_settings(self.settings)
    }

    /// Whether the server knows `name`.
    ///
    /// Only the not-found sentinel means "absent"; any other error envelope
    /// is surfaced.
    pub async fn exists(&self, name: &ContainerName) -> Result<bool> {
        let path = name.resource_path();
        let response = self.client.get(&path).await?;
        if response.is_not_found() {
            return Ok(false);
        }
        if response.is_error() {
            return Err(Error::from_envelope(&response, name.as_str()));
        }
        Ok(true)
    }

    /// Fetch `name` as a remote proxy with a fresh snapshot.
    pub async fn get(&self, name: &ContainerName) -> Result<Container> {
        let fetched = fetch(self.client.as_ref(), name.as_str())
            .await?
            .ok_or_else(|| not_found(name))?;
        tracing::debug!(container = %name, status = %fetched.metadata.status, "fetched container");
        Container::from_fetched(Arc::clone(&self.client), fetched, self.settings)
    }

    /// Names of every container, in server order.
    pub async fn names(&self) -> Result<Vec<ContainerName>> {
        let response = self.client.get(CONTAINERS).await?;
        if response.is_error() {
            return Err(Error::from_envelope(&response, CONTAINERS));
        }

        let urls: Option<Vec<String>> = serde_json::from_value(response.metadata).map_err(|e| {
            MalformedResponseSnafu {
                message: format!("container list: {e}"),
            }
            .build()
        })?;

        urls.unwrap_or_default()
            .iter()
            .map(|url| {
                let segment = last_segment(url).unwrap_or_default();
                ContainerName::new(&segment).map_err(|e| {
                    MalformedResponseSnafu {
                        message: format!("container list entry {url:?}: {e}"),
                    }
                    .build()
                })
            })
            .collect()
    }

    /// Every container, in server order.
    ///
    /// Lookups run `lookup_concurrency` at a time; the first failure aborts
    /// the listing.
    pub async fn get_all(&self) -> Result<Vec<Container>> {
        let names = self.names().await?;
        tracing::debug!(count = names.len(), "listing containers");

        let lookups = names.iter().map(|name| self.get(name));
        stream::iter(lookups)
            .buffered(self.settings.lookup_concurrency.max(1))
            .try_collect()
            .await
    }
}
