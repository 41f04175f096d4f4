use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, Violation, ViolationKind};
use crate::kind::{AlgorithmType, BlockType, ClosedEnum, MachineType};

/// Packaging configuration, validated and read-only after [`PackagingConfig::parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct PackagingConfig {
    pub docker: DockerConfig,
    pub manifest: ManifestConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DockerConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// The image being wrapped and how to talk to the service inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    /// Base image reference (`repo:tag`)
    pub base_image: String,
    /// Port the inference service listens on
    pub exposed_port: u16,
    pub algorithm: AlgorithmType,
    pub routes: Routes,
    /// Overrides the base image's default command when set
    pub command: Option<String>,
    /// Tile resolution in meters/pixel, forwarded to the helper when the
    /// template variant supports it
    pub resolution: f64,
    /// Explicit template family (`debian`, `ubuntu`, `centos`, `rhel`, `cuda`).
    /// When unset the family is detected from the image.
    pub base_family: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub process: String,
    pub healthcheck: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Tag of the packaged image (`repo:tag`)
    pub tag: String,
    /// Overrides the base image's working directory when set
    pub workdir: Option<String>,
}

/// The `manifest` section as written by the user.
///
/// `block_type` and `machine` are kept as written; the manifest builder
/// turns them into their closed enums.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestConfig {
    pub name: String,
    pub display_name: String,
    pub block_type: String,
    pub tags: Vec<String>,
    pub description: String,
    pub parameters: Map<String, Value>,
    pub machine: String,
    pub input_capabilities: Map<String, Value>,
    pub output_capabilities: Map<String, Value>,
}

// ── Raw YAML shape ──
//
// Every key is optional here so that missing fields surface as collected
// violations instead of a first-error deserializer failure.

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    docker: Option<RawDocker>,
    manifest: Option<RawManifest>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDocker {
    input: Option<RawInput>,
    output: Option<RawOutput>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInput {
    base_image: Option<String>,
    exposed_port: Option<i64>,
    #[serde(rename = "type")]
    algorithm: Option<String>,
    routes: Option<RawRoutes>,
    command: Option<String>,
    resolution: Option<f64>,
    base_family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRoutes {
    process: Option<String>,
    healthcheck: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOutput {
    tag: Option<String>,
    workdir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    name: Option<String>,
    display_name: Option<String>,
    #[serde(rename = "type")]
    block_type: Option<String>,
    tags: Option<Vec<String>>,
    description: Option<String>,
    parameters: Option<Map<String, Value>>,
    machine: Option<String>,
    input_capabilities: Option<Map<String, Value>>,
    output_capabilities: Option<Map<String, Value>>,
}

impl PackagingConfig {
    /// Read and validate a YAML packaging config.
    pub fn parse(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "reading packaging config");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Validate YAML content already in memory.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Malformed { source: e })?;

        let mut check = Checker::default();
        let config = check.config(raw);

        if check.violations.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::SchemaViolation {
                violations: check.violations,
            })
        }
    }
}

/// Collects every violation while building the typed config.
///
/// Missing values are replaced by placeholders so validation can continue;
/// the config is only returned when no violation was recorded.
#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn config(&mut self, raw: RawConfig) -> PackagingConfig {
        let docker = raw.docker.unwrap_or_default();
        PackagingConfig {
            docker: DockerConfig {
                input: self.input(docker.input.unwrap_or_default()),
                output: self.output(docker.output.unwrap_or_default()),
            },
            manifest: self.manifest(raw.manifest.unwrap_or_default()),
        }
    }

    fn input(&mut self, raw: RawInput) -> InputConfig {
        let routes = raw.routes.unwrap_or_default();
        InputConfig {
            base_image: self.image_ref("docker.input.base_image", raw.base_image),
            exposed_port: self.port("docker.input.exposed_port", raw.exposed_port),
            algorithm: self
                .one_of::<AlgorithmType>("docker.input.type", raw.algorithm)
                .unwrap_or(AlgorithmType::ObjectDetection),
            routes: Routes {
                process: self.required("docker.input.routes.process", routes.process),
                healthcheck: self.required("docker.input.routes.healthcheck", routes.healthcheck),
            },
            command: self.optional("docker.input.command", raw.command),
            resolution: self.resolution("docker.input.resolution", raw.resolution),
            base_family: self.optional("docker.input.base_family", raw.base_family),
        }
    }

    fn output(&mut self, raw: RawOutput) -> OutputConfig {
        OutputConfig {
            tag: self.image_ref("docker.output.tag", raw.tag),
            workdir: self.optional("docker.output.workdir", raw.workdir),
        }
    }

    fn manifest(&mut self, raw: RawManifest) -> ManifestConfig {
        let block_type = self.required("manifest.type", raw.block_type);
        if !block_type.is_empty() {
            self.check_enum::<BlockType>("manifest.type", &block_type);
        }
        let machine = self.required("manifest.machine", raw.machine);
        if !machine.is_empty() {
            self.check_enum::<MachineType>("manifest.machine", &machine);
        }

        ManifestConfig {
            name: self.required("manifest.name", raw.name),
            display_name: self.required("manifest.display_name", raw.display_name),
            block_type,
            tags: raw.tags.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            parameters: raw.parameters.unwrap_or_default(),
            machine,
            input_capabilities: raw.input_capabilities.unwrap_or_default(),
            output_capabilities: raw.output_capabilities.unwrap_or_default(),
        }
    }

    fn push(&mut self, field: &str, kind: ViolationKind) {
        self.violations.push(Violation {
            field: field.to_owned(),
            kind,
        });
    }

    /// Present and non-blank.
    fn required(&mut self, field: &str, value: Option<String>) -> String {
        match value {
            None => {
                self.push(field, ViolationKind::Missing);
                String::new()
            }
            Some(v) if v.trim().is_empty() => {
                self.push(field, ViolationKind::Empty);
                String::new()
            }
            Some(v) => v,
        }
    }

    /// Absent or null is fine; an empty string is not.
    fn optional(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(v) if v.trim().is_empty() => {
                self.push(field, ViolationKind::Empty);
                None
            }
            other => other,
        }
    }

    fn image_ref(&mut self, field: &str, value: Option<String>) -> String {
        let value = self.required(field, value);
        if !value.is_empty() && !is_image_reference(&value) {
            self.push(field, ViolationKind::InvalidImageReference(value.clone()));
        }
        value
    }

    fn port(&mut self, field: &str, value: Option<i64>) -> u16 {
        match value {
            None => {
                self.push(field, ViolationKind::Missing);
                0
            }
            Some(p) => match u16::try_from(p) {
                Ok(port) if port > 0 => port,
                _ => {
                    self.push(field, ViolationKind::PortOutOfRange(p));
                    0
                }
            },
        }
    }

    fn resolution(&mut self, field: &str, value: Option<f64>) -> f64 {
        match value {
            None => {
                self.push(field, ViolationKind::Missing);
                0.0
            }
            Some(r) if r <= 0.0 || !r.is_finite() => {
                self.push(field, ViolationKind::NotPositive);
                0.0
            }
            Some(r) => r,
        }
    }

    fn one_of<T: ClosedEnum>(&mut self, field: &str, value: Option<String>) -> Option<T> {
        let value = self.required(field, value);
        if value.is_empty() {
            return None;
        }
        self.check_enum::<T>(field, &value)
    }

    fn check_enum<T: ClosedEnum>(&mut self, field: &str, value: &str) -> Option<T> {
        let parsed = T::parse(value);
        if parsed.is_none() {
            self.push(
                field,
                ViolationKind::OutOfEnum {
                    value: value.to_owned(),
                    allowed: T::VALUES,
                },
            );
        }
        parsed
    }
}

/// Docker image reference carrying a tag, a digest, or both:
/// `[host[:port]/]path[:tag][@algorithm:hex]`.
///
/// Path components are lowercase alphanumerics joined by `.`, `_`, `__` or
/// runs of `-`. A bare name without tag or digest is rejected.
pub fn is_image_reference(value: &str) -> bool {
    let (name_and_tag, digest) = match value.split_once('@') {
        Some((name, digest)) => (name, Some(digest)),
        None => (value, None),
    };

    // The tag separator is the first ':' after the last '/', which skips
    // registry ports such as `localhost:5000/img:1.0`.
    let slash = name_and_tag.rfind('/').map_or(0, |i| i + 1);
    let (name, tag) = match name_and_tag[slash..].find(':') {
        Some(colon) => (
            &name_and_tag[..slash + colon],
            Some(&name_and_tag[slash + colon + 1..]),
        ),
        None => (name_and_tag, None),
    };

    if tag.is_none() && digest.is_none() {
        return false;
    }
    is_name(name) && tag.is_none_or(is_tag) && digest.is_none_or(is_digest)
}

const NAME_MAX: usize = 255;
const TAG_MAX: usize = 128;
const DIGEST_HEX_MIN: usize = 32;

fn is_name(name: &str) -> bool {
    if name.is_empty() || name.len() > NAME_MAX {
        return false;
    }
    let mut components = name.split('/').peekable();
    let first = components.next().unwrap_or_default();
    let has_domain = components.peek().is_some()
        && (first.contains(['.', ':'])
            || first == "localhost"
            || first.chars().any(|c| c.is_ascii_uppercase()));

    if has_domain {
        is_domain(first) && components.all(is_path_component)
    } else {
        is_path_component(first) && components.all(is_path_component)
    }
}

fn is_path_component(component: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    component.starts_with(alnum)
        && component.ends_with(alnum)
        && component
            .split(alnum)
            .filter(|sep| !sep.is_empty())
            .all(|sep| matches!(sep, "." | "_" | "__") || sep.chars().all(|c| c == '-'))
}

fn is_domain(domain: &str) -> bool {
    let (host_ok, port) = match domain.strip_prefix('[') {
        Some(rest) => match rest.split_once(']') {
            Some((ipv6, port)) => (
                !ipv6.is_empty() && ipv6.chars().all(|c| c.is_ascii_hexdigit() || c == ':'),
                port,
            ),
            None => return false,
        },
        None => {
            let (host, port) = domain.find(':').map_or((domain, ""), |i| domain.split_at(i));
            (host.split('.').all(is_host_label), port)
        }
    };

    // `port` still carries its leading ':'
    let port_ok = port.is_empty()
        || port
            .strip_prefix(':')
            .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    host_ok && port_ok
}

fn is_host_label(label: &str) -> bool {
    !label.is_empty()
        && label.starts_with(|c: char| c.is_ascii_alphanumeric())
        && label.ends_with(|c: char| c.is_ascii_alphanumeric())
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_tag(tag: &str) -> bool {
    tag.len() <= TAG_MAX
        && tag.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn is_digest(digest: &str) -> bool {
    let Some((algorithm, hex)) = digest.split_once(':') else {
        return false;
    };
    let algorithm_ok = algorithm.split(['+', '.', '_', '-']).all(|part| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    });
    algorithm_ok && hex.len() >= DIGEST_HEX_MIN && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::is_image_reference;

    #[test]
    fn image_reference_forms() {
        let digest = format!("sha256:{}", "ab12".repeat(16));

        assert!(is_image_reference("myimg:1.0"));
        assert!(is_image_reference("localhost:5000/team/img:latest"));
        assert!(is_image_reference("registry.example.com/a.b/c__d/e--f:v1_rc-2"));
        assert!(is_image_reference("[::1]:5000/img:1"));
        assert!(is_image_reference(&format!("img@{digest}")));
        assert!(is_image_reference(&format!("img:1.0@{digest}")));

        assert!(!is_image_reference("myimg"));
        assert!(!is_image_reference("localhost:5000/img"));
        assert!(!is_image_reference("my img:1.0"));
        assert!(!is_image_reference("img:"));
        assert!(!is_image_reference("MyImg:1.0"));
        assert!(!is_image_reference("my$img:1.0"));
        assert!(!is_image_reference("a:b:c"));
        assert!(!is_image_reference("img:{{X}}"));
        assert!(!is_image_reference("repo:tag!"));
        assert!(!is_image_reference("img:.hidden"));
        assert!(!is_image_reference("a___b:1"));
        assert!(!is_image_reference("img@sha256:abcd"));
        assert!(!is_image_reference(&format!("img:{}", "t".repeat(129))));
    }
}
