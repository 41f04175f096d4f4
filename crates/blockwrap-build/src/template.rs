//! Dockerfile template variants and placeholder substitution.
//!
//! Templates use `{{NAME}}` placeholders. Every placeholder must be bound;
//! values are inserted verbatim, so callers escape them beforehand (see
//! [`escape_double_quoted`]).

use std::collections::BTreeMap;
use std::fmt;

use blockwrap_docker::OsRelease;

/// Placeholder name → substituted text.
pub type Bindings = BTreeMap<&'static str, String>;

/// Placeholders every variant binds.
pub const COMMON_PLACEHOLDERS: &[&str] = &[
    "BASE_IMAGE",
    "MANIFEST",
    "WORKDIR",
    "RUN_COMMAND",
    "PORT",
    "PROCESS_ROUTE",
    "HEALTHCHECK_ROUTE",
    "TYPE",
];

/// Bound only by variants whose launch passes a tile resolution.
pub const RESOLUTION_PLACEHOLDER: &str = "RESOLUTION";

/// Supported Dockerfile templates, one per base image family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateVariant {
    /// NVIDIA CUDA images (Ubuntu based, apt)
    Cuda,
    /// Debian and Ubuntu (apt)
    Debian,
    /// CentOS and RHEL (yum)
    RedHat,
}

/// Static description of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDescriptor {
    pub name: &'static str,
    pub package_manager: &'static str,
    pub supports_resolution: bool,
    pub template: &'static str,
}

const CUDA: VariantDescriptor = VariantDescriptor {
    name: "cuda",
    package_manager: "apt-get",
    supports_resolution: true,
    template: include_str!("../templates/cuda.Dockerfile"),
};

const DEBIAN: VariantDescriptor = VariantDescriptor {
    name: "debian",
    package_manager: "apt-get",
    supports_resolution: true,
    template: include_str!("../templates/debian.Dockerfile"),
};

const REDHAT: VariantDescriptor = VariantDescriptor {
    name: "redhat",
    package_manager: "yum",
    supports_resolution: false,
    template: include_str!("../templates/redhat.Dockerfile"),
};

impl TemplateVariant {
    pub const ALL: [TemplateVariant; 3] = [Self::Cuda, Self::Debian, Self::RedHat];

    pub fn descriptor(self) -> &'static VariantDescriptor {
        match self {
            Self::Cuda => &CUDA,
            Self::Debian => &DEBIAN,
            Self::RedHat => &REDHAT,
        }
    }

    /// Select the variant for a declared family name.
    pub fn select(family: &str) -> Result<Self, TemplateError> {
        Self::from_family(family)
            .ok_or_else(|| TemplateError::UnsupportedBaseFamily(family.to_owned()))
    }

    /// Select the variant for a detected operating system.
    ///
    /// `ID` is tried first, then each `ID_LIKE` entry. A Debian-family image
    /// carrying a CUDA toolkit selects [`TemplateVariant::Cuda`].
    pub fn select_detected(os: &OsRelease, cuda: bool) -> Result<Self, TemplateError> {
        let variant = os
            .candidates()
            .find_map(Self::from_family)
            .ok_or_else(|| TemplateError::UnsupportedBaseFamily(os.id.clone()))?;

        Ok(match variant {
            Self::Debian if cuda => Self::Cuda,
            other => other,
        })
    }

    fn from_family(family: &str) -> Option<Self> {
        match family.trim().to_ascii_lowercase().as_str() {
            "cuda" => Some(Self::Cuda),
            "debian" | "ubuntu" => Some(Self::Debian),
            "centos" | "rhel" => Some(Self::RedHat),
            _ => None,
        }
    }

    pub fn supports_resolution(self) -> bool {
        self.descriptor().supports_resolution
    }

    /// Render this variant's template with `bindings`.
    pub fn render(self, bindings: &Bindings) -> Result<String, TemplateError> {
        render(self.descriptor().template, bindings)
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Substitute every `{{NAME}}` in `template`.
pub fn render(template: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 512);
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(TemplateError::Unterminated {
                offset: offset + start,
            })?;
        let name = after[..end].trim();
        let value = bindings
            .get(name)
            .ok_or_else(|| TemplateError::MissingBinding(name.to_owned()))?;
        out.push_str(value);

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Escape `value` for the inside of a double-quoted Dockerfile string
/// (`LABEL`, `ARG`, `ENV`). Line breaks become spaces.
pub fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' | '\r' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unsupported base image family {0:?} (supported: cuda, debian, ubuntu, centos, rhel)")]
    UnsupportedBaseFamily(String),

    #[error("template placeholder {{{{{0}}}}} has no bound value")]
    MissingBinding(String),

    #[error("unterminated placeholder at byte {offset}")]
    Unterminated { offset: usize },
}
