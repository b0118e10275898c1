// ABOUTME: LXD container name validation.
// ABOUTME: Names are hostname-like labels: letters, digits and hyphens.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerNameError {
    #[error("container name cannot be empty")]
    Empty,

    #[error("container name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("container name cannot start with a digit")]
    StartsWithDigit,

    #[error("container name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("container name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("invalid character in container name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, ContainerNameError> {
        if value.is_empty() {
            return Err(ContainerNameError::Empty);
        }

        if value.len() > 63 {
            return Err(ContainerNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ContainerNameError::StartsWithHyphen);
        }

        if value.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ContainerNameError::StartsWithDigit);
        }

        if value.ends_with('-') {
            return Err(ContainerNameError::EndsWithHyphen);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' {
                return Err(ContainerNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this container's resource, relative to the API root.
    pub fn resource_path(&self) -> String {
        format!("containers/{}", urlencoding::encode(&self.0))
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContainerName {
    type Err = ContainerNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ContainerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContainerName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
