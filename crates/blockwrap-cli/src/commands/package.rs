use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use blockwrap_build::output::{self, Artifacts};
use blockwrap_build::{
    DockerfileGenerator, ManifestValidator, ResolvedBuildContext, TemplateVariant,
};
use blockwrap_core::{ManifestDocument, PackagingConfig};
use blockwrap_docker::{DockerClient, PullPolicy};

/// Flags of `blockwrap package` beyond its two positional paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageOptions {
    pub build: bool,
    pub validate: bool,
    pub pull_timeout: Option<u64>,
}

/// Run the packaging pipeline.
///
/// Every stage before the write works in memory, so a failure there leaves
/// `destination` untouched.
pub async fn package(
    config_path: &Path,
    destination: &Path,
    options: &PackageOptions,
) -> anyhow::Result<()> {
    let settings = super::load_settings()?;

    // Config
    let config = PackagingConfig::parse(config_path).with_context(|| {
        format!("failed to load configuration {}", config_path.display())
    })?;
    let manifest =
        ManifestDocument::build(&config.manifest).context("failed to build manifest")?;
    let input = &config.docker.input;

    // An explicit family is checked before touching the runtime.
    let declared_variant = input
        .base_family
        .as_deref()
        .map(TemplateVariant::select)
        .transpose()
        .context("template selection failed")?;

    // Introspect
    let mut pull = PullPolicy::from(&settings.docker);
    if let Some(secs) = options.pull_timeout {
        pull.timeout = Duration::from_secs(secs);
    }
    let client = DockerClient::new(&settings.docker).with_pull_policy(pull);

    let image = client
        .resolve(&input.base_image)
        .await
        .context("image introspection failed")?;

    let variant = match declared_variant {
        Some(variant) => variant,
        None => {
            let os = client
                .os_release(&input.base_image)
                .await
                .context("image introspection failed")?;
            TemplateVariant::select_detected(&os, image.is_cuda())
                .context("template selection failed")?
        }
    };
    tracing::info!(%variant, "template variant selected");
    if manifest.machine.kind.is_accelerated() && variant != TemplateVariant::Cuda {
        tracing::warn!(
            machine = %config.manifest.machine,
            %variant,
            "GPU machine requested for a base image without CUDA"
        );
    }

    // Resolve + render
    let context = ResolvedBuildContext::new(&config, &image, &manifest)
        .context("failed to resolve build values")?;
    let artifacts = Artifacts {
        dockerfile: DockerfileGenerator::new(variant, &context)
            .render()
            .context("template rendering failed")?,
        manifest: manifest
            .to_json_pretty()
            .context("failed to build manifest")?,
    };

    if options.validate {
        ManifestValidator::new(&settings.validation)
            .context("manifest validation failed")?
            .validate(&manifest)
            .await
            .context("manifest validation failed")?;
    }

    // Write
    let written = output::write(destination, &artifacts)
        .with_context(|| format!("failed to write output to {}", destination.display()))?;

    println!("Packaged {} into {}", input.base_image, destination.display());
    for path in &written {
        println!("  {}", path.display());
    }

    if options.build {
        let tag = &config.docker.output.tag;
        client
            .build_image(destination, tag)
            .await
            .context("image build failed")?;
        println!("Built image {tag}");
    } else {
        println!(
            "Build it with: docker build --tag {} {}",
            config.docker.output.tag,
            destination.display()
        );
    }

    Ok(())
}
