//! Error types for grab-dispatch
//!
//! Every failure a dispatch can produce is one variant of the closed [`Error`] enum.
//! The dispatcher classifies these variants to decide tracker bookkeeping and then
//! returns the same value to the caller, so upstream code keeps the full cause.

use crate::types::Protocol;
use thiserror::Error;

/// Result type alias for grab-dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for grab-dispatch
#[derive(Debug, Error)]
pub enum Error {
    /// No download client is registered for the release's protocol
    #[error("{protocol} download client isn't configured yet: {reason}")]
    NoClientAvailable {
        /// Protocol of the release that could not be placed
        protocol: Protocol,
        /// Why selection failed
        reason: String,
    },

    /// The release no longer exists on the indexer (404-equivalent)
    ///
    /// Says nothing about the indexer's health.
    #[error("release {release} is no longer available: {message}")]
    ReleaseUnavailable {
        /// Title of the release
        release: String,
        /// Human-readable detail
        message: String,
    },

    /// Fetching the release from its indexer failed transiently
    #[error("failed to download release {release}: {message}")]
    ReleaseDownload {
        /// Title of the release
        release: String,
        /// Human-readable detail
        message: String,
        /// Indexer-side cause
        #[source]
        source: IndexerFault,
    },

    /// Failure local to the download client (auth, disk, configuration, rejection)
    #[error("download client {client} failed: {message}")]
    DownloadClient {
        /// Name of the download client
        client: String,
        /// Human-readable detail
        message: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "default_indexer_backoff")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Indexer-side cause of a retryable release download failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexerFault {
    /// Connection, DNS, or timeout failure talking to the indexer
    #[error("network error: {0}")]
    Network(String),

    /// Indexer answered with an unexpected HTTP status
    #[error("indexer returned HTTP {status}")]
    Http {
        /// HTTP status code
        status: u16,
    },

    /// Indexer rate limited the request (HTTP 429)
    #[error("too many requests (retry after: {})", .retry_after.as_deref().unwrap_or("unspecified"))]
    TooManyRequests {
        /// Raw `Retry-After` header value, if the indexer sent one
        retry_after: Option<String>,
    },
}

/// Coarse kind of an [`Error`], as surfaced to callers deciding what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No client configured for the protocol
    NoClientAvailable,
    /// The release is gone; do not retry it
    IndexerUnavailable,
    /// Transient indexer failure; the indexer is backed off
    IndexerRetryable,
    /// Problem local to the download client
    ClientFailure,
    /// Invalid configuration or unreadable config file
    Configuration,
}

impl Error {
    /// Build a release download error caused by an indexer fault
    pub fn release_download(
        release: impl Into<String>,
        message: impl Into<String>,
        source: IndexerFault,
    ) -> Self {
        Error::ReleaseDownload {
            release: release.into(),
            message: message.into(),
            source,
        }
    }

    /// Build a release unavailable error
    pub fn release_unavailable(release: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ReleaseUnavailable {
            release: release.into(),
            message: message.into(),
        }
    }

    /// Build a download client error
    pub fn download_client(client: impl Into<String>, message: impl Into<String>) -> Self {
        Error::DownloadClient {
            client: client.into(),
            message: message.into(),
        }
    }

    /// Classify this error into the kind callers act on
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoClientAvailable { .. } => ErrorKind::NoClientAvailable,
            Error::ReleaseUnavailable { .. } => ErrorKind::IndexerUnavailable,
            Error::ReleaseDownload { .. } => ErrorKind::IndexerRetryable,
            Error::DownloadClient { .. } => ErrorKind::ClientFailure,
            Error::Config { .. } | Error::Io(_) | Error::Serialization(_) => {
                ErrorKind::Configuration
            }
        }
    }
}

/// Convert errors to HTTP status codes for embedding APIs
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::ReleaseUnavailable { .. } => 404,
            Error::ReleaseDownload {
                source: IndexerFault::TooManyRequests { .. },
                ..
            } => 429,
            Error::ReleaseDownload { .. } => 502,
            Error::DownloadClient { .. } => 502,
            Error::NoClientAvailable { .. } => 503,
            Error::Io(_) | Error::Serialization(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::NoClientAvailable { .. } => "download_client_unavailable",
            Error::ReleaseUnavailable { .. } => "release_unavailable",
            Error::ReleaseDownload { source, .. } => match source {
                IndexerFault::TooManyRequests { .. } => "indexer_rate_limited",
                IndexerFault::Network(_) | IndexerFault::Http { .. } => "release_download_failed",
            },
            Error::DownloadClient { .. } => "download_client_error",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}
