//! Core types and configuration for blockwrap.
//!
//! This crate defines the packaging configuration schema ([`PackagingConfig`]),
//! the platform manifest ([`ManifestDocument`]), tool settings read from
//! `blockwrap.toml` ([`Settings`]), and the shared error types.

pub mod config;
pub mod error;
pub mod kind;
pub mod manifest;
pub mod settings;

pub use config::{DockerConfig, InputConfig, ManifestConfig, OutputConfig, PackagingConfig, Routes};
pub use error::{ConfigError, SettingsError, Violation, ViolationKind};
pub use kind::{AlgorithmType, BlockType, ClosedEnum, MachineType};
pub use manifest::{Machine, ManifestDocument, ManifestError};
pub use settings::{DockerSettings, Settings, ValidationSettings};
