mod doctor;
mod package;

use std::path::Path;

use blockwrap_core::Settings;

pub use doctor::doctor;
pub use package::{PackageOptions, package};

/// Tool settings from `blockwrap.toml` in the working directory.
fn load_settings() -> anyhow::Result<Settings> {
    Ok(Settings::load(Path::new("."))?)
}
