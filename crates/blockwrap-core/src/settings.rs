use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// File name looked up in the working directory.
pub const SETTINGS_FILE: &str = "blockwrap.toml";

/// blockwrap.toml tool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub docker: DockerSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerSettings {
    /// Container runtime CLI (defaults to `docker`)
    #[serde(default = "default_docker_binary")]
    pub binary: String,
    /// Upper bound for a single image pull
    #[serde(default = "default_pull_timeout_secs")]
    pub pull_timeout_secs: u64,
    /// Extra pull attempts after a registry failure
    #[serde(default = "default_pull_retries")]
    pub pull_retries: u32,
    /// Delay before the first retry, doubled on each further attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Block-schema validation endpoint of the platform
    #[serde(default = "default_validation_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_validation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            binary: default_docker_binary(),
            pull_timeout_secs: default_pull_timeout_secs(),
            pull_retries: default_pull_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            endpoint: default_validation_endpoint(),
            timeout_secs: default_validation_timeout_secs(),
        }
    }
}

impl DockerSettings {
    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl ValidationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Load from blockwrap.toml in the given directory, or return defaults if not found.
    pub fn load(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| SettingsError::Load {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| SettingsError::Parse { path, source: e })
        } else {
            Ok(Self::default())
        }
    }
}

fn default_docker_binary() -> String {
    "docker".to_owned()
}

fn default_pull_timeout_secs() -> u64 {
    300
}

fn default_pull_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_validation_endpoint() -> String {
    "https://api.up42.com/validate-schema/block".to_owned()
}

fn default_validation_timeout_secs() -> u64 {
    30
}
