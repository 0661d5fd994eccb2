//! Failure classification and `Retry-After` parsing
//!
//! A dispatch ends in exactly one [`Outcome`]. Only indexer-retryable failures carry
//! a backoff; it is the *base* window handed to the indexer status tracker, which
//! owns any escalation on top of it.
//!
//! # Example
//!
//! ```
//! use grab_dispatch::backoff::parse_retry_after_at;
//! use chrono::{TimeZone, Utc};
//! use std::time::Duration;
//!
//! let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
//! let default = Duration::from_secs(60);
//!
//! assert_eq!(parse_retry_after_at("300", now, default), Duration::from_secs(300));
//! assert_eq!(
//!     parse_retry_after_at("Mon, 19 Oct 2026 12:05:00 GMT", now, default),
//!     Duration::from_secs(300),
//! );
//! assert_eq!(parse_retry_after_at("soon", now, default), default);
//! ```

use crate::error::{Error, IndexerFault};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How a dispatch ended, as far as tracker bookkeeping is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The client accepted the release
    Success,
    /// Transient indexer failure; back the indexer off for at least `backoff`
    IndexerRetryableFailure {
        /// Base backoff derived from the error
        backoff: Duration,
    },
    /// The release is gone; indexer health is untouched
    IndexerPermanentFailure,
    /// Failure local to the download client; indexer health is untouched
    ClientFailure,
    /// No client was registered for the protocol
    NoClientAvailable,
}

impl Outcome {
    /// Classify a dispatch result, reading the clock once if a date hint must be resolved
    pub fn classify<T>(result: &Result<T, Error>, default_backoff: Duration) -> Self {
        Self::classify_at(result, Utc::now(), default_backoff)
    }

    /// Classify a dispatch result against a fixed clock reading
    pub fn classify_at<T>(
        result: &Result<T, Error>,
        now: DateTime<Utc>,
        default_backoff: Duration,
    ) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(error) => Self::classify_error_at(error, now, default_backoff),
        }
    }

    /// Classify a dispatch error against a fixed clock reading
    pub fn classify_error_at(
        error: &Error,
        now: DateTime<Utc>,
        default_backoff: Duration,
    ) -> Self {
        match error {
            Error::NoClientAvailable { .. } => Outcome::NoClientAvailable,
            Error::ReleaseUnavailable { .. } => Outcome::IndexerPermanentFailure,
            Error::ReleaseDownload { source, .. } => {
                let backoff = match source {
                    IndexerFault::TooManyRequests {
                        retry_after: Some(hint),
                    } => parse_retry_after_at(hint, now, default_backoff),
                    IndexerFault::TooManyRequests { retry_after: None }
                    | IndexerFault::Network(_)
                    | IndexerFault::Http { .. } => default_backoff,
                };
                Outcome::IndexerRetryableFailure { backoff }
            }
            // Configuration and I/O failures raised by a backend are local to it
            Error::DownloadClient { .. }
            | Error::Config { .. }
            | Error::Io(_)
            | Error::Serialization(_) => Outcome::ClientFailure,
        }
    }

    /// Backoff to record against the indexer, if any
    pub fn indexer_backoff(&self) -> Option<Duration> {
        match self {
            Outcome::IndexerRetryableFailure { backoff } => Some(*backoff),
            _ => None,
        }
    }
}

/// Parse a `Retry-After` header value against the current time
pub fn parse_retry_after(hint: &str, default_backoff: Duration) -> Duration {
    parse_retry_after_at(hint, Utc::now(), default_backoff)
}

/// Parse a `Retry-After` header value against a fixed clock reading
///
/// Accepts an integer count of seconds or an HTTP date (RFC 1123, e.g.
/// `Sun, 06 Nov 1994 08:49:37 GMT`). RFC 3339 timestamps are accepted too since
/// some indexers send them. Dates in the past and negative counts yield zero.
/// Anything unparseable yields `default_backoff`.
pub fn parse_retry_after_at(hint: &str, now: DateTime<Utc>, default_backoff: Duration) -> Duration {
    let hint = hint.trim();
    if hint.is_empty() {
        return default_backoff;
    }

    if let Ok(seconds) = hint.parse::<i64>() {
        return Duration::from_secs(seconds.max(0).unsigned_abs());
    }

    let date = DateTime::parse_from_rfc2822(hint)
        .or_else(|_| DateTime::parse_from_rfc3339(hint))
        .map(|date| date.with_timezone(&Utc));

    match date {
        Ok(date) => (date - now).to_std().unwrap_or(Duration::ZERO),
        Err(e) => {
            tracing::debug!(hint, error = %e, "Unparseable Retry-After hint, using default backoff");
            default_backoff
        }
    }
}
