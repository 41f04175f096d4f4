#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("{binary} CLI not found — install Docker: https://docs.docker.com/get-docker/")]
    NotFound {
        binary: String,
        source: std::io::Error,
    },

    #[error("docker command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("docker output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },
}

impl DockerError {
    /// Captured stderr of a failed command, empty for other failures.
    pub fn stderr(&self) -> &str {
        match self {
            Self::CommandFailed { stderr, .. } => stderr,
            _ => "",
        }
    }
}
