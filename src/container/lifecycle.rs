// ABOUTME: Remote lifecycle transitions: create, update, state changes and delete.
// ABOUTME: Every call waits on the server's operation and then on a stable status, never on a fixed delay.

use serde_json::json;

use crate::client::{CONTAINERS, ResourceClient};
use crate::error::{NotModifiedSnafu, Result};
use crate::operation::{PollConfig, complete, poll_until, to_body};
use crate::types::{ContainerName, ContainerStatus};

use super::action::{StateAction, StateChange};
use super::state::{Local, Remote};
use super::{Container, Fetched, fetch, not_found};

/// Poll until the container reports a stable status.
async fn settle(
    client: &dyn ResourceClient,
    name: &ContainerName,
    config: &PollConfig,
) -> Result<Fetched> {
    let subject = format!("container {name} settling");
    poll_until(config, &subject, move || async move {
        match fetch(client, name.as_str()).await? {
            Some(fetched) if fetched.metadata.is_stable() => Ok(Some(fetched)),
            Some(fetched) => {
                tracing::debug!(container = %name, status = %fetched.metadata.status, "still transitioning");
                Ok(None)
            }
            None => Err(not_found(name)),
        }
    })
    .await
}

impl Container<Local> {
    /// Create the container on the server with an empty root filesystem.
    ///
    /// Returns once the create operation has finished and the container
    /// reports a stable status.
    pub async fn create(mut self) -> Result<Container<Remote>> {
        self.metadata.name = self.name.to_string();
        self.metadata.source = Some(json!({ "type": "none" }));
        let body = to_body(&self.metadata)?;

        tracing::debug!(container = %self.name, "creating container");
        let client = self.client.as_ref();
        let response = client.post(CONTAINERS, &body).await?;
        complete(client, response, &self.settings.operations, self.name.as_str()).await?;
        let fetched = settle(client, &self.name, &self.settings.operations).await?;

        let mut created: Container<Remote> = self.transition();
        created.apply(fetched);
        tracing::info!(container = %created.name, status = %created.status(), "container created");
        Ok(created)
    }
}

impl Container<Remote> {
    /// Push local edits, guarded by the snapshot's ETag.
    ///
    /// A concurrent change on the server fails with `StaleState`; the local
    /// edits are kept so the caller can inspect them before refreshing.
    pub async fn update(&mut self) -> Result<()> {
        snafu::ensure!(self.modified, NotModifiedSnafu { name: self.name.as_str() });

        let body = to_body(&self.metadata)?;
        let path = self.path();
        tracing::debug!(container = %self.name, etag = ?self.etag, "updating container");

        let client = self.client.as_ref();
        let response = client
            .put_if_match(&path, &body, self.etag.as_deref())
            .await?;
        complete(client, response, &self.settings.operations, self.name.as_str()).await?;

        self.refresh().await?;
        tracing::info!(container = %self.name, "container updated");
        Ok(())
    }

    /// Apply a state change and wait until the container settles.
    ///
    /// Stopping an already stopped container sends nothing. The snapshot is
    /// refreshed on the way, so unsaved edits are discarded.
    pub async fn change_state(&mut self, request: StateChange) -> Result<()> {
        request.validate()?;
        self.refresh().await?;

        if request.action == StateAction::Stop && self.status() == ContainerStatus::Stopped {
            tracing::warn!(container = %self.name, "already stopped, nothing to do");
            return Ok(());
        }

        let body = to_body(&request)?;
        let path = format!("{}/state", self.path());
        tracing::debug!(container = %self.name, action = %request.action, "changing state");

        let client = self.client.as_ref();
        let response = client.put(&path, &body).await?;
        complete(client, response, &self.settings.operations, self.name.as_str()).await?;
        let fetched = settle(client, &self.name, &self.settings.operations).await?;

        self.apply(fetched);
        tracing::info!(
            container = %self.name,
            action = %request.action,
            status = %self.status(),
            "state changed"
        );
        Ok(())
    }

    /// Run a named action with default options.
    pub async fn request(&mut self, action: &str) -> Result<()> {
        let action: StateAction = action.parse()?;
        self.change_state(self.default_request(action)).await
    }

    pub async fn start(&mut self) -> Result<()> {
        self.change_state(self.default_request(StateAction::Start)).await
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.change_state(self.default_request(StateAction::Stop)).await
    }

    pub async fn restart(&mut self) -> Result<()> {
        self.change_state(self.default_request(StateAction::Restart)).await
    }

    pub async fn freeze(&mut self) -> Result<()> {
        self.change_state(self.default_request(StateAction::Freeze)).await
    }

    pub async fn unfreeze(&mut self) -> Result<()> {
        self.change_state(self.default_request(StateAction::Unfreeze)).await
    }

    fn default_request(&self, action: StateAction) -> StateChange {
        StateChange::new(action, self.settings.state_timeout)
    }

    /// Stop and destroy the container.
    ///
    /// Returns once the server no longer knows the name. A container that
    /// disappears on its own while being stopped (ephemeral) counts as deleted.
    pub async fn delete(mut self) -> Result<()> {
        match self.stop().await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                if fetch(self.client.as_ref(), self.name.as_str()).await?.is_some() {
                    return Err(e);
                }
                tracing::info!(container = %self.name, "container gone after stop");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let path = self.path();
        let client = self.client.as_ref();
        let name = &self.name;
        tracing::debug!(container = %name, "deleting container");

        let response = client.delete(&path).await?;
        if response.is_not_found() {
            tracing::info!(container = %name, "container already deleted");
            return Ok(());
        }
        complete(client, response, &self.settings.operations, name.as_str()).await?;

        let deadline = self
            .settings
            .operations
            .with_timeout(self.settings.delete_timeout);
        let subject = format!("deletion of container {name}");
        poll_until(&deadline, &subject, move || async move {
            Ok(fetch(client, name.as_str()).await?.is_none().then_some(()))
        })
        .await?;

        tracing::info!(container = %name, "container deleted");
        Ok(())
    }
}
