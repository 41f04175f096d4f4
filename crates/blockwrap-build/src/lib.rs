//! Dockerfile rendering and output generation for blockwrap.
//!
//! # Packaging pipeline
//!
//! ```text
//! blockwrap package <config> <destination>
//!   1. Config      ── PackagingConfig::parse()
//!   2. Introspect  ── DockerClient::resolve() (+ os-release when no base_family)
//!   3. Resolve     ── ResolvedBuildContext::new() (override > image default)
//!   4. Render      ── TemplateVariant::select() + DockerfileGenerator::render()
//!   5. Write       ── output::write() → Dockerfile, UP42Manifest.json,
//!                     run_command.sh, run.py
//! ```
//!
//! Rendering happens entirely in memory; nothing touches the destination
//! until step 5.

pub mod context;
pub mod dockerfile;
pub mod output;
pub mod template;
pub mod validate;

pub use context::{ContextError, Resolved, ResolvedBuildContext, Source};
pub use dockerfile::DockerfileGenerator;
pub use output::{Artifacts, OutputError};
pub use template::{Bindings, TemplateError, TemplateVariant, VariantDescriptor};
pub use validate::{ManifestValidator, ValidationError};
