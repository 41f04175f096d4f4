use crate::context::ResolvedBuildContext;
use crate::template::{
    Bindings, RESOLUTION_PLACEHOLDER, TemplateError, TemplateVariant, escape_double_quoted,
};

/// Renders the wrapper Dockerfile for one base image family.
pub struct DockerfileGenerator<'a> {
    variant: TemplateVariant,
    context: &'a ResolvedBuildContext,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(variant: TemplateVariant, context: &'a ResolvedBuildContext) -> Self {
        Self { variant, context }
    }

    /// Placeholder values for the selected variant, escaped for use inside
    /// double-quoted Dockerfile strings. `BASE_IMAGE` is inserted raw.
    pub fn bindings(&self) -> Bindings {
        let ctx = self.context;
        let mut bindings = Bindings::new();

        bindings.insert("BASE_IMAGE", ctx.base_image.clone());
        bindings.insert("MANIFEST", escape_double_quoted(&ctx.manifest_json));
        bindings.insert("WORKDIR", escape_double_quoted(&ctx.workdir));
        bindings.insert("RUN_COMMAND", escape_double_quoted(&ctx.run_command));
        bindings.insert("PORT", ctx.port.to_string());
        bindings.insert("PROCESS_ROUTE", escape_double_quoted(&ctx.process_route));
        bindings.insert(
            "HEALTHCHECK_ROUTE",
            escape_double_quoted(&ctx.healthcheck_route),
        );
        bindings.insert("TYPE", ctx.algorithm.to_string());

        if self.variant.supports_resolution() {
            bindings.insert(RESOLUTION_PLACEHOLDER, ctx.resolution.to_string());
        } else {
            tracing::warn!(
                variant = %self.variant,
                resolution = ctx.resolution,
                "template variant does not pass a resolution; ignoring it"
            );
        }

        bindings
    }

    pub fn render(&self) -> Result<String, TemplateError> {
        tracing::debug!(variant = %self.variant, "rendering Dockerfile");
        self.variant.render(&self.bindings())
    }
}
