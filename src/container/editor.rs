// ABOUTME: Scoped mutator for a container's raw configuration.
// ABOUTME: Every change marks the snapshot modified so update() knows there is something to send.

use super::metadata::ContainerMetadata;

/// Mutable access to the user-editable parts of a container document.
///
/// Obtained from `Container::edit()`. Expanded views are not reachable from here.
pub struct ContainerEditor<'a> {
    metadata: &'a mut ContainerMetadata,
    modified: &'a mut bool,
}

impl<'a> ContainerEditor<'a> {
    pub(crate) fn new(metadata: &'a mut ContainerMetadata, modified: &'a mut bool) -> Self {
        Self { metadata, modified }
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.config.insert(key.into(), value.into());
        self.touch()
    }

    pub fn unset_config(&mut self, key: &str) -> &mut Self {
        self.metadata.config.remove(key);
        self.touch()
    }

    /// Add or replace a device.
    pub fn set_device<K, V>(
        &mut self,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let device = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.metadata.devices.insert(name.into(), device);
        self.touch()
    }

    pub fn remove_device(&mut self, name: &str) -> &mut Self {
        self.metadata.devices.remove(name);
        self.touch()
    }

    pub fn set_profiles<P: Into<String>>(&mut self, profiles: impl IntoIterator<Item = P>) -> &mut Self {
        self.metadata.profiles = profiles.into_iter().map(Into::into).collect();
        self.touch()
    }

    pub fn add_profile(&mut self, profile: impl Into<String>) -> &mut Self {
        self.metadata.profiles.push(profile.into());
        self.touch()
    }

    pub fn set_ephemeral(&mut self, ephemeral: bool) -> &mut Self {
        self.metadata.ephemeral = ephemeral;
        self.touch()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.metadata.description = description.into();
        self.touch()
    }

    fn touch(&mut self) -> &mut Self {
        *self.modified = true;
        self
    }
}
