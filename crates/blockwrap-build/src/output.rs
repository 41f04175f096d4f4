//! Writing generated artifacts to the destination directory.

use std::io;
use std::path::{Path, PathBuf};

pub const DOCKERFILE: &str = "Dockerfile";
pub const MANIFEST_FILE: &str = "UP42Manifest.json";
pub const LAUNCH_SCRIPT_FILE: &str = "run_command.sh";
pub const HELPER_SCRIPT_FILE: &str = "run.py";

/// Launch script copied into every package.
pub const LAUNCH_SCRIPT: &str = include_str!("../templates/run_command.sh");
/// Tiling helper the launch script runs in the foreground.
pub const HELPER_SCRIPT: &str = include_str!("../templates/run.py");

/// Rendered content of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub dockerfile: String,
    /// Pretty-printed manifest JSON
    pub manifest: String,
}

/// Write `artifacts` plus the static scripts into `destination`, creating it
/// and any missing parents. Existing files are overwritten.
///
/// Returns the written paths in write order.
pub fn write(destination: &Path, artifacts: &Artifacts) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(destination).map_err(|e| classify(destination, e))?;

    let files: [(&str, &str); 4] = [
        (DOCKERFILE, &artifacts.dockerfile),
        (MANIFEST_FILE, &artifacts.manifest),
        (LAUNCH_SCRIPT_FILE, LAUNCH_SCRIPT),
        (HELPER_SCRIPT_FILE, HELPER_SCRIPT),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = destination.join(name);
        std::fs::write(&path, content).map_err(|e| classify(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote artifact");
        written.push(path);
    }

    make_executable(&destination.join(LAUNCH_SCRIPT_FILE))?;

    tracing::info!(destination = %destination.display(), files = written.len(), "package written");
    Ok(written)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), OutputError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| classify(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), OutputError> {
    Ok(())
}

const ENOSPC: i32 = 28;

fn classify(path: &Path, source: io::Error) -> OutputError {
    let path = path.to_path_buf();
    match source.kind() {
        io::ErrorKind::PermissionDenied => OutputError::PermissionDenied { path, source },
        io::ErrorKind::StorageFull => OutputError::DiskFull { path, source },
        _ if source.raw_os_error() == Some(ENOSPC) => OutputError::DiskFull { path, source },
        _ => OutputError::Io { path, source },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("permission denied writing {path}")]
    PermissionDenied { path: PathBuf, source: io::Error },

    #[error("no space left on device writing {path}")]
    DiskFull { path: PathBuf, source: io::Error },

    #[error("failed to write {path}")]
    Io { path: PathBuf, source: io::Error },
}
