use thiserror::Error;

/// Application-wide error types for Trawl.
#[derive(Error, Debug)]
pub enum AppError {
    /// The page renderer failed (launch, navigation, script evaluation, snapshot).
    #[error("Renderer error: {0}")]
    RendererError(String),

    /// Fetching a page over plain HTTP failed (non-2xx or transport failure).
    /// Fatal on the static path; per-image failures are reported as
    /// [`DownloadStatus`](crate::models::DownloadStatus) instead.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Connection-level failure while downloading a payload.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Reading or writing the local filesystem failed.
    #[error("Filesystem error: {0}")]
    FilesystemError(String),

    /// Serializing a table to its destination failed.
    #[error("Export error: {0}")]
    ExportError(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}
