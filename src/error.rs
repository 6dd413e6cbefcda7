use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading the review dataset from disk
///
/// Any of these is fatal for the request that triggered the load: the
/// dashboard has nothing to draw without data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open dataset at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}

/// Failure while reading the dashboard configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// Failure while producing a view or a page
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to serialize chart: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to render: {0}")]
    Render(String),

    #[cfg(feature = "web")]
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
