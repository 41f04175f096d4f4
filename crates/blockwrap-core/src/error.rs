use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config from {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config is not valid YAML: {source}")]
    Malformed { source: serde_yaml::Error },

    #[error(
        "config has {} schema violation(s):\n{}",
        violations.len(),
        format_violations(violations)
    )]
    SchemaViolation { violations: Vec<Violation> },
}

impl ConfigError {
    /// Violations carried by a [`ConfigError::SchemaViolation`], empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::SchemaViolation { violations } => violations,
            _ => &[],
        }
    }
}

/// A single schema problem, addressed by its dotted key path
/// (e.g. `docker.input.routes.process`).
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    Missing,
    Empty,
    OutOfEnum {
        value: String,
        allowed: &'static [&'static str],
    },
    NotPositive,
    PortOutOfRange(i64),
    InvalidImageReference(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "`{}` is required", self.field),
            ViolationKind::Empty => write!(f, "`{}` must not be empty", self.field),
            ViolationKind::OutOfEnum { value, allowed } => write!(
                f,
                "`{}` has unsupported value {value:?} (expected one of: {})",
                self.field,
                allowed.join(", ")
            ),
            ViolationKind::NotPositive => write!(f, "`{}` must be greater than zero", self.field),
            ViolationKind::PortOutOfRange(port) => {
                write!(f, "`{}` must be a port in 1..=65535, got {port}", self.field)
            }
            ViolationKind::InvalidImageReference(value) => write!(
                f,
                "`{}` must be an image reference in repo:tag form, got {value:?}",
                self.field
            ),
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings from {path}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
