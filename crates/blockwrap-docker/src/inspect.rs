//! Parsing of image metadata returned by the container runtime.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Defaults a base image declares for the process it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDefaults {
    /// `Entrypoint` followed by `Cmd`; empty when the image declares neither.
    pub command: Vec<String>,
    /// `WorkingDir`, `/` when unset.
    pub workdir: String,
    /// Numeric part of `ExposedPorts`, sorted.
    pub exposed_ports: Vec<u16>,
    /// `KEY=value` entries of the image environment.
    pub env: Vec<String>,
}

/// `.Config` object of `docker image inspect`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageConfig {
    #[serde(default)]
    cmd: Option<Vec<String>>,
    #[serde(default)]
    entrypoint: Option<Vec<String>>,
    #[serde(default)]
    working_dir: Option<String>,
    #[serde(default)]
    exposed_ports: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    env: Option<Vec<String>>,
}

impl ImageDefaults {
    /// Parse the output of `docker image inspect --format '{{json .Config}}'`.
    pub fn from_config_json(json: &str) -> Result<Self, serde_json::Error> {
        // Images built FROM scratch without any config print `null`.
        let config: Option<ImageConfig> = serde_json::from_str(json.trim())?;
        let config = config.unwrap_or_default();

        let mut command = config.entrypoint.unwrap_or_default();
        command.extend(config.cmd.unwrap_or_default());

        let workdir = match config.working_dir {
            Some(dir) if !dir.is_empty() => dir,
            _ => "/".to_owned(),
        };

        let mut exposed_ports: Vec<u16> = config
            .exposed_ports
            .unwrap_or_default()
            .keys()
            .filter_map(|spec| {
                let port = spec.split('/').next()?;
                match port.parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(e) => {
                        tracing::warn!(%spec, error = %e, "ignoring unparsable exposed port");
                        None
                    }
                }
            })
            .collect();
        exposed_ports.sort_unstable();
        exposed_ports.dedup();

        Ok(Self {
            command,
            workdir,
            exposed_ports,
            env: config.env.unwrap_or_default(),
        })
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.iter().find_map(|entry| {
            let (k, v) = entry.split_once('=')?;
            (k == key).then_some(v)
        })
    }

    /// NVIDIA CUDA base images declare their toolkit version in the environment.
    pub fn is_cuda(&self) -> bool {
        self.env_var("CUDA_VERSION").is_some()
    }
}

/// Operating system identification from `/etc/os-release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    /// `ID=` (e.g. `debian`, `ubuntu`, `centos`)
    pub id: String,
    /// `ID_LIKE=` entries, closest relative first
    pub id_like: Vec<String>,
}

impl OsRelease {
    /// Parse os-release content. Returns `None` when there is no `ID` line.
    pub fn parse(content: &str) -> Option<Self> {
        let mut id = None;
        let mut id_like = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value);
            match key {
                "ID" => id = Some(value.to_ascii_lowercase()),
                "ID_LIKE" => {
                    id_like = value
                        .split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect();
                }
                _ => {}
            }
        }

        id.filter(|id| !id.is_empty())
            .map(|id| Self { id, id_like })
    }

    /// `ID` followed by every `ID_LIKE` entry.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.id_like.iter().map(String::as_str))
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
