//! Merging user overrides with values introspected from the base image.

use blockwrap_core::{AlgorithmType, ManifestDocument, ManifestError, PackagingConfig};
use blockwrap_docker::ImageDefaults;

/// Outcome of merging an optional override with an optional image default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    FromOverride(T),
    FromIntrospection(T),
    Unresolved,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Override,
    Introspection,
}

impl<T> Resolved<T> {
    /// Override wins when present; the introspected value is the fallback.
    pub fn merge(override_value: Option<T>, introspected: Option<T>) -> Self {
        match (override_value, introspected) {
            (Some(v), _) => Self::FromOverride(v),
            (None, Some(v)) => Self::FromIntrospection(v),
            (None, None) => Self::Unresolved,
        }
    }

    pub fn into_sourced(self) -> Option<(T, Source)> {
        match self {
            Self::FromOverride(v) => Some((v, Source::Override)),
            Self::FromIntrospection(v) => Some((v, Source::Introspection)),
            Self::Unresolved => None,
        }
    }
}

/// Flattened values the Dockerfile template is rendered from.
///
/// Built once per run, after introspection, and consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBuildContext {
    pub base_image: String,
    /// Single-line manifest JSON for the image label
    pub manifest_json: String,
    pub workdir: String,
    pub workdir_source: Source,
    pub run_command: String,
    pub run_command_source: Source,
    pub port: u16,
    pub process_route: String,
    pub healthcheck_route: String,
    pub algorithm: AlgorithmType,
    pub resolution: f64,
}

impl ResolvedBuildContext {
    pub fn new(
        config: &PackagingConfig,
        image: &ImageDefaults,
        manifest: &ManifestDocument,
    ) -> Result<Self, ContextError> {
        let input = &config.docker.input;

        let introspected_command =
            (!image.command.is_empty()).then(|| join_command(&image.command));
        let (run_command, run_command_source) =
            Resolved::merge(input.command.clone(), introspected_command)
                .into_sourced()
                .ok_or_else(|| ContextError::Unresolved {
                    field: "command",
                    image: input.base_image.clone(),
                })?;

        let (workdir, workdir_source) = Resolved::merge(
            config.docker.output.workdir.clone(),
            Some(image.workdir.clone()),
        )
        .into_sourced()
        .ok_or_else(|| ContextError::Unresolved {
            field: "workdir",
            image: input.base_image.clone(),
        })?;

        tracing::info!(command = %run_command, source = ?run_command_source, "run command resolved");
        tracing::info!(%workdir, source = ?workdir_source, "working directory resolved");

        if !image.exposed_ports.is_empty() && !image.exposed_ports.contains(&input.exposed_port) {
            tracing::warn!(
                port = input.exposed_port,
                exposed = ?image.exposed_ports,
                "configured port is not exposed by the base image"
            );
        }

        Ok(Self {
            base_image: input.base_image.clone(),
            manifest_json: manifest.to_json().map_err(|e| ContextError::Manifest { source: e })?,
            workdir,
            workdir_source,
            run_command,
            run_command_source,
            port: input.exposed_port,
            process_route: input.routes.process.clone(),
            healthcheck_route: input.routes.healthcheck.clone(),
            algorithm: input.algorithm,
            resolution: input.resolution,
        })
    }
}

/// Join an argv into one shell command line, single-quoting arguments
/// that would otherwise be split or expanded.
pub fn join_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(
        "no {field} for {image}: the image declares none and the config does not override it"
    )]
    Unresolved { field: &'static str, image: String },

    #[error("failed to embed manifest")]
    Manifest { source: ManifestError },
}
