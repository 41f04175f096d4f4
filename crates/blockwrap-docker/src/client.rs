use std::fmt;
use std::path::Path;
use std::time::Duration;

use blockwrap_core::DockerSettings;

use crate::docker::DockerError;
use crate::executor::{DockerExecutor, RealExecutor};
use crate::inspect::{ImageDefaults, OsRelease};

/// Bounds on fetching a base image from its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullPolicy {
    /// Upper bound for one `docker pull`
    pub timeout: Duration,
    /// Extra attempts after a registry failure
    pub retries: u32,
    /// Delay before the first retry, doubled for each further one
    pub backoff: Duration,
}

impl Default for PullPolicy {
    fn default() -> Self {
        Self::from(&DockerSettings::default())
    }
}

impl From<&DockerSettings> for PullPolicy {
    fn from(settings: &DockerSettings) -> Self {
        Self {
            timeout: settings.pull_timeout(),
            retries: settings.pull_retries,
            backoff: settings.retry_backoff(),
        }
    }
}

/// Container runtime client, parameterized over the executor for testability.
pub struct DockerClient<E: DockerExecutor = RealExecutor> {
    executor: E,
    pull: PullPolicy,
}

impl DockerClient<RealExecutor> {
    pub fn new(settings: &DockerSettings) -> Self {
        Self {
            executor: RealExecutor::new(settings.binary.clone()),
            pull: PullPolicy::from(settings),
        }
    }
}

impl<E: DockerExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            pull: PullPolicy::default(),
        }
    }

    pub fn with_pull_policy(mut self, pull: PullPolicy) -> Self {
        self.pull = pull;
        self
    }

    // ── Introspection ──

    /// Resolve the defaults of `image`, pulling it first when it is not
    /// in the local image store.
    pub async fn resolve(&self, image: &str) -> Result<ImageDefaults, IntrospectionError> {
        tracing::info!(%image, "checking local image store");
        if let Some(defaults) = self.inspect(image).await? {
            tracing::info!(%image, "image found locally");
            return Ok(defaults);
        }

        tracing::info!(%image, "image not found locally, pulling");
        self.pull(image).await?;

        self.inspect(image)
            .await?
            .ok_or_else(|| IntrospectionError::NotFound {
                image: image.to_owned(),
                detail: "image missing from local store after pull".to_owned(),
            })
    }

    /// Inspect a local image. `Ok(None)` means the image is not present.
    pub async fn inspect(&self, image: &str) -> Result<Option<ImageDefaults>, IntrospectionError> {
        let result = self
            .executor
            .exec(&args([
                "image",
                "inspect",
                "--format",
                "{{json .Config}}",
                image,
            ]))
            .await;

        match result {
            Ok(json) => ImageDefaults::from_config_json(&json)
                .map(Some)
                .map_err(|e| IntrospectionError::InvalidMetadata {
                    image: image.to_owned(),
                    source: e,
                }),
            Err(e) if is_missing_image(e.stderr()) => Ok(None),
            Err(e) => Err(IntrospectionError::RuntimeUnavailable { source: e }),
        }
    }

    /// Pull `image`, retrying registry failures according to the pull policy.
    pub async fn pull(&self, image: &str) -> Result<(), IntrospectionError> {
        let mut backoff = self.pull.backoff;
        let mut attempt = 0;

        loop {
            match self.pull_once(image).await {
                Ok(()) => {
                    tracing::info!(%image, "pull succeeded");
                    return Ok(());
                }
                Err(e @ IntrospectionError::RegistryUnreachable { .. })
                    if attempt < self.pull.retries =>
                {
                    attempt += 1;
                    tracing::warn!(
                        %image,
                        error = %e,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "pull failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn pull_once(&self, image: &str) -> Result<(), IntrospectionError> {
        let pulled =
            tokio::time::timeout(self.pull.timeout, self.executor.exec(&args(["pull", image])))
                .await;

        match pulled {
            Err(_elapsed) => Err(IntrospectionError::RegistryUnreachable {
                image: image.to_owned(),
                detail: format!("pull timed out after {}s", self.pull.timeout.as_secs()),
            }),
            Ok(Ok(output)) => {
                for line in output.lines().filter(|l| !l.trim().is_empty()) {
                    tracing::debug!(%image, "{line}");
                }
                Ok(())
            }
            Ok(Err(e @ DockerError::CommandFailed { .. })) => {
                let detail = e.stderr().trim().to_owned();
                if is_unknown_image(&detail) {
                    Err(IntrospectionError::NotFound {
                        image: image.to_owned(),
                        detail,
                    })
                } else {
                    Err(IntrospectionError::RegistryUnreachable {
                        image: image.to_owned(),
                        detail,
                    })
                }
            }
            Ok(Err(e)) => Err(IntrospectionError::RuntimeUnavailable { source: e }),
        }
    }

    /// Read `/etc/os-release` from `image` to learn its distribution family.
    pub async fn os_release(&self, image: &str) -> Result<OsRelease, IntrospectionError> {
        tracing::info!(%image, "detecting base image operating system");
        let content = self
            .executor
            .exec(&args([
                "run",
                "--rm",
                "--entrypoint",
                "cat",
                image,
                "/etc/os-release",
            ]))
            .await
            .map_err(|e| IntrospectionError::OsRelease {
                image: image.to_owned(),
                source: e,
            })?;

        let os = OsRelease::parse(&content).ok_or_else(|| IntrospectionError::NoOsId {
            image: image.to_owned(),
        })?;
        tracing::info!(%image, id = %os.id, like = ?os.id_like, "base image operating system");
        Ok(os)
    }

    // ── Build ──

    /// Build the packaged image from a generated output directory.
    ///
    /// On failure the tag is removed so no half-built image is left behind.
    pub async fn build_image(&self, context_dir: &Path, tag: &str) -> Result<(), BuildError> {
        let context = context_dir
            .to_str()
            .ok_or_else(|| BuildError::InvalidPath(context_dir.to_path_buf()))?;

        tracing::info!(%tag, context = %context, "building packaged image");
        match self
            .executor
            .exec_streaming(&args(["build", "--tag", tag, context]))
            .await
        {
            Ok(()) => {
                tracing::info!(%tag, "build succeeded");
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = self.remove_image(tag).await {
                    tracing::warn!(%tag, error = %cleanup, "failed to remove image after failed build");
                }
                Err(BuildError::Build {
                    tag: tag.to_owned(),
                    source: e,
                })
            }
        }
    }

    /// Remove a local image tag. A tag that does not exist is not an error.
    pub async fn remove_image(&self, tag: &str) -> Result<(), DockerError> {
        match self.executor.exec(&args(["image", "rm", tag])).await {
            Ok(_) => Ok(()),
            Err(e) if is_missing_image(e.stderr()) => {
                tracing::debug!(%tag, "no image to remove");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    pub async fn doctor(&self) -> DoctorReport {
        let mut report = DoctorReport::default();

        match self
            .executor
            .exec(&args(["version", "--format", "{{.Client.Version}}"]))
            .await
        {
            Ok(v) => report.cli = CheckResult::ok(v.trim()),
            Err(DockerError::CommandFailed { stderr, .. }) => {
                // The client prints its version even when the daemon is down.
                report.cli = CheckResult::ok("installed");
                report.daemon = CheckResult::fail(stderr.trim());
                return report;
            }
            Err(e) => {
                report.cli = CheckResult::fail(&e.to_string());
                report.daemon = CheckResult::fail("skipped (CLI unavailable)");
                return report;
            }
        }

        match self
            .executor
            .exec(&args(["info", "--format", "{{.ServerVersion}}"]))
            .await
        {
            Ok(v) if !v.trim().is_empty() => report.daemon = CheckResult::ok(v.trim()),
            Ok(_) => report.daemon = CheckResult::fail("daemon reported no version"),
            Err(e) => report.daemon = CheckResult::fail(e.stderr().trim()),
        }

        report
    }
}

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

/// `docker image inspect` / `image rm` wording for an absent image.
fn is_missing_image(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("no such image") || stderr.contains("no such object")
}

/// `docker pull` wording for a reference the registry does not know.
///
/// Access denials are checked first: Docker Hub answers a private or
/// unauthenticated pull with "repository does not exist or may require
/// 'docker login'", which is a credentials problem, not a missing image.
fn is_unknown_image(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    if is_access_denied(&stderr) {
        return false;
    }
    ["manifest unknown", "not found", "repository does not exist"]
        .iter()
        .any(|needle| stderr.contains(needle))
}

/// Expects lowercased `docker pull` stderr.
fn is_access_denied(stderr: &str) -> bool {
    ["pull access denied", "denied:", "unauthorized", "docker login"]
        .iter()
        .any(|needle| stderr.contains(needle))
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("image {image} not found locally or in its registry: {detail}")]
    NotFound { image: String, detail: String },

    #[error("registry unreachable while pulling {image}: {detail}")]
    RegistryUnreachable { image: String, detail: String },

    #[error("container runtime unavailable")]
    RuntimeUnavailable { source: DockerError },

    #[error("unreadable metadata for image {image}")]
    InvalidMetadata {
        image: String,
        source: serde_json::Error,
    },

    #[error("failed to read /etc/os-release from {image}")]
    OsRelease { image: String, source: DockerError },

    #[error("/etc/os-release in {image} has no ID field")]
    NoOsId { image: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build context path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("docker build of {tag} failed")]
    Build { tag: String, source: DockerError },
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub cli: CheckResult,
    pub daemon: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.cli.passed && self.daemon.passed
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] docker CLI     {}", self.cli.icon(), self.cli.detail)?;
        write!(f, "[{}] docker daemon  {}", self.daemon.icon(), self.daemon.detail)
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}
