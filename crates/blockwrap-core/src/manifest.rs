//! Platform manifest document.
//!
//! The serialized key order is part of the downstream contract: it follows
//! the struct field order below, and the opaque maps keep the order they were
//! declared in the source configuration.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ManifestConfig;
use crate::kind::{BlockType, ClosedEnum, MachineType};

/// Manifest describing the packaged block to the platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestDocument {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub tags: Vec<String>,
    pub description: String,
    pub parameters: Map<String, Value>,
    pub machine: Machine,
    pub input_capabilities: Map<String, Value>,
    pub output_capabilities: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Machine {
    #[serde(rename = "type")]
    pub kind: MachineType,
}

impl ManifestDocument {
    /// Build and validate the manifest from its configuration section.
    ///
    /// `parameters` and both capability maps are passed through untouched.
    pub fn build(config: &ManifestConfig) -> Result<Self, ManifestError> {
        if config.name.trim().is_empty() {
            return Err(ManifestError::MissingField("name"));
        }
        if config.display_name.trim().is_empty() {
            return Err(ManifestError::MissingField("display_name"));
        }

        let block_type =
            BlockType::parse(&config.block_type).ok_or_else(|| ManifestError::InvalidEnum {
                field: "type",
                value: config.block_type.clone(),
            })?;
        let machine =
            MachineType::parse(&config.machine).ok_or_else(|| ManifestError::InvalidEnum {
                field: "machine",
                value: config.machine.clone(),
            })?;

        Ok(Self {
            name: config.name.clone(),
            display_name: config.display_name.clone(),
            block_type,
            tags: config.tags.clone(),
            description: config.description.clone(),
            parameters: config.parameters.clone(),
            machine: Machine { kind: machine },
            input_capabilities: config.input_capabilities.clone(),
            output_capabilities: config.output_capabilities.clone(),
        })
    }

    /// Single-line JSON, as embedded in the image label.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        serde_json::to_string(self).map_err(|e| ManifestError::Serialize { source: e })
    }

    /// Indented JSON with a trailing newline, as written to disk.
    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        let mut json =
            serde_json::to_string_pretty(self).map_err(|e| ManifestError::Serialize { source: e })?;
        json.push('\n');
        Ok(json)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest field `{0}` is required")]
    MissingField(&'static str),

    #[error("manifest field `{field}` has invalid value {value:?}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("failed to serialize manifest")]
    Serialize { source: serde_json::Error },
}
