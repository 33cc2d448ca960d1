//! Errors raised at the I/O boundary
//!
//! Parsing, diffing and rendering never fail; everything here comes from
//! reading inputs, talking to GitHub or the local repository, and publishing.

/// Failures that abort a run
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub API call failed (network, status or body)
    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("invalid TOML")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
}

impl From<git2::Error> for ReporterError {
    fn from(err: git2::Error) -> Self {
        ReporterError::Git(err.message().to_string())
    }
}

impl From<reqwest::Error> for ReporterError {
    fn from(err: reqwest::Error) -> Self {
        ReporterError::GitHub(err.to_string())
    }
}
