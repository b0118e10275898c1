// ABOUTME: Proxy for a single container, parameterized by whether the server knows it.
// ABOUTME: Holds one authoritative snapshot of the container document plus its ETag.

mod action;
mod editor;
mod lifecycle;
mod metadata;
mod settings;
mod state;

pub use action::{StateAction, StateChange};
pub use editor::ContainerEditor;
pub use metadata::{ContainerMetadata, Device};
pub use settings::ContainerSettings;
pub use state::{Local, Remote};

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::client::{CONTAINERS, ResourceClient, Response};
use crate::error::{Error, MalformedResponseSnafu, Result};
use crate::types::{ContainerName, ContainerStatus, StatusCode};

/// A container proxy.
///
/// `Container<Local>` is a document being assembled before `create()`.
/// `Container<Remote>` mirrors a server resource and exposes its status.
/// The state marker makes status queries on an uncreated container, or
/// a second `create()`, compile errors.
pub struct Container<S = Remote> {
    pub(crate) client: Arc<dyn ResourceClient>,
    pub(crate) name: ContainerName,
    pub(crate) metadata: ContainerMetadata,
    pub(crate) etag: Option<String>,
    pub(crate) modified: bool,
    pub(crate) settings: ContainerSettings,
    _state: PhantomData<S>,
}

impl<S> fmt::Debug for Container<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("status", &self.metadata.status)
            .field("etag", &self.etag)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

/// A container document and ETag as returned by a single GET.
#[derive(Debug)]
pub(crate) struct Fetched {
    pub(crate) metadata: ContainerMetadata,
    pub(crate) etag: Option<String>,
}

/// Fetch `name` once. `None` means the server answered with the not-found sentinel.
pub(crate) async fn fetch(client: &dyn ResourceClient, name: &str) -> Result<Option<Fetched>> {
    let path = format!("{}/{}", CONTAINERS, urlencoding::encode(name));
    let response = client.get(&path).await?;
    if response.is_not_found() {
        return Ok(None);
    }
    if response.is_error() {
        return Err(Error::from_envelope(&response, name));
    }

    let Response { metadata, etag, .. } = response;
    let metadata: ContainerMetadata =
        serde_json::from_value(metadata).map_err(|e| Error::MalformedResponse {
            message: format!("container {name}: {e}"),
        })?;
    Ok(Some(Fetched { metadata, etag }))
}

// =============================================================================
// Shared accessors
// =============================================================================

impl<S> Container<S> {
    fn transition<T>(self) -> Container<T> {
        Container {
            client: self.client,
            name: self.name,
            metadata: self.metadata,
            etag: self.etag,
            modified: self.modified,
            settings: self.settings,
            _state: PhantomData,
        }
    }

    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    /// Raw configuration, excluding values inherited from profiles.
    pub fn config(&self) -> &HashMap<String, String> {
        &self.metadata.config
    }

    /// Raw devices, excluding devices inherited from profiles.
    pub fn devices(&self) -> &HashMap<String, Device> {
        &self.metadata.devices
    }

    pub fn profiles(&self) -> &[String] {
        &self.metadata.profiles
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn is_ephemeral(&self) -> bool {
        self.metadata.ephemeral
    }

    /// The whole document as last fetched or built.
    pub fn metadata(&self) -> &ContainerMetadata {
        &self.metadata
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// Whether local edits are waiting for `update()`.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Scoped mutable access to the raw configuration.
    pub fn edit(&mut self) -> ContainerEditor<'_> {
        ContainerEditor::new(&mut self.metadata, &mut self.modified)
    }

    fn path(&self) -> String {
        self.name.resource_path()
    }
}

// =============================================================================
// Local containers
// =============================================================================

impl Container<Local> {
    /// Start building a container that does not exist on the server yet.
    pub fn local(client: Arc<dyn ResourceClient>, name: ContainerName) -> Self {
        Container {
            metadata: ContainerMetadata::new(name.as_str()),
            client,
            name,
            etag: None,
            modified: false,
            settings: ContainerSettings::default(),
            _state: PhantomData,
        }
    }

    pub fn with_settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.edit().set_config(key, value);
        self
    }

    pub fn with_device<K, V>(
        mut self,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.edit().set_device(name, attributes);
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.edit().add_profile(profile);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.edit().set_description(description);
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.edit().set_ephemeral(ephemeral);
        self
    }
}

// =============================================================================
// Remote containers
// =============================================================================

impl Container<Remote> {
    pub(crate) fn from_fetched(
        client: Arc<dyn ResourceClient>,
        fetched: Fetched,
        settings: ContainerSettings,
    ) -> Result<Self> {
        let name = ContainerName::new(&fetched.metadata.name).map_err(|e| {
            MalformedResponseSnafu {
                message: format!("server reported container name {:?}: {e}", fetched.metadata.name),
            }
            .build()
        })?;
        Ok(Container {
            client,
            name,
            metadata: fetched.metadata,
            etag: fetched.etag,
            modified: false,
            settings,
            _state: PhantomData,
        })
    }

    pub fn status(&self) -> ContainerStatus {
        self.metadata
            .status_code
            .map(ContainerStatus::from)
            .unwrap_or(ContainerStatus::Unknown(0))
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.metadata.status_code
    }

    /// Status text exactly as the server reported it.
    pub fn status_text(&self) -> &str {
        &self.metadata.status
    }

    /// Configuration with profile values applied.
    pub fn expanded_config(&self) -> &HashMap<String, String> {
        &self.metadata.expanded_config
    }

    /// Devices with profile devices applied.
    pub fn expanded_devices(&self) -> &HashMap<String, Device> {
        &self.metadata.expanded_devices
    }

    /// Revision tag of the snapshot, sent as `If-Match` on update.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Re-read the container, replacing the snapshot and dropping local edits.
    pub async fn refresh(&mut self) -> Result<()> {
        let fetched = fetch(self.client.as_ref(), self.name.as_str())
            .await?
            .ok_or_else(|| not_found(&self.name))?;
        self.apply(fetched);
        Ok(())
    }

    fn apply(&mut self, fetched: Fetched) {
        self.metadata = fetched.metadata;
        self.etag = fetched.etag;
        self.modified = false;
    }
}

pub(crate) fn not_found(name: &ContainerName) -> Error {
    Error::NotFound {
        name: name.to_string(),
        detail: Response::NOT_FOUND_MESSAGE.to_string(),
    }
}
