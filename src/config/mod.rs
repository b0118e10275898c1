// ABOUTME: Configuration types and parsing for lxdc.yml.
// ABOUTME: Socket location, operation polling and lifecycle timeouts.

mod error;

pub use error::ConfigError;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::container::ContainerSettings;
use crate::operation::PollConfig;

pub const CONFIG_FILENAME: &str = "lxdc.yml";
pub const CONFIG_FILENAME_ALT: &str = "lxdc.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".lxdc/config.yml";

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Explicit socket path. Detected when absent.
    #[serde(default)]
    pub socket: Option<PathBuf>,

    #[serde(default)]
    pub operations: PollConfig,

    #[serde(default = "default_state_timeout", with = "humantime_serde")]
    pub state_timeout: Duration,

    #[serde(default = "default_delete_timeout", with = "humantime_serde")]
    pub delete_timeout: Duration,

    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
}

fn default_state_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_delete_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_lookup_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Config {
            socket: None,
            operations: PollConfig::default(),
            state_timeout: default_state_timeout(),
            delete_timeout: default_delete_timeout(),
            lookup_concurrency: default_lookup_concurrency(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is a config with every default.
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load(path);
            }
        }

        Err(ConfigError::NotFound(dir.to_path_buf()))
    }

    /// Like `discover`, but falls back to defaults when no file exists.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ops = &self.operations;
        if ops.initial_interval.is_zero() || ops.max_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "operation poll intervals must be non-zero".to_string(),
            ));
        }
        if ops.initial_interval > ops.max_interval {
            return Err(ConfigError::Invalid(
                "operations.initial_interval exceeds operations.max_interval".to_string(),
            ));
        }
        if !ops.multiplier.is_finite() || ops.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "operations.multiplier must be a finite number of at least 1, got {}",
                ops.multiplier
            )));
        }
        if ops.timeout.is_zero() || self.delete_timeout.is_zero() {
            return Err(ConfigError::Invalid("timeouts must be non-zero".to_string()));
        }
        if self.state_timeout < Duration::from_secs(1) {
            return Err(ConfigError::Invalid(
                "state_timeout must be at least one second".to_string(),
            ));
        }
        if self.lookup_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "lookup_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn settings(&self) -> ContainerSettings {
        ContainerSettings {
            operations: self.operations,
            state_timeout: self.state_timeout,
            delete_timeout: self.delete_timeout,
            lookup_concurrency: self.lookup_concurrency,
        }
    }
}
