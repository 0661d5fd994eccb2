//! Indexer and download client availability tracking
//!
//! The dispatcher talks to these stores through two narrow traits:
//! - [`IndexerStatusTracker`] - record failures (with a base backoff) and successes
//! - [`DownloadClientStatusTracker`] - report which providers are currently blocked
//!
//! How a failure escalates into a longer disable window is owned entirely by the
//! store. Callers hand in the minimum backoff they derived from the triggering
//! error and nothing else.

mod store;


pub use store::{ProviderStatus, StatusStore};

use crate::types::{IndexerId, ProviderId};
use std::collections::HashSet;
use std::time::Duration;

/// Tracks indexer health on behalf of the discovery subsystem
pub trait IndexerStatusTracker: Send + Sync {
    /// Record a failed grab from `indexer`, disabling it for at least `backoff`
    fn record_failure(&self, indexer: IndexerId, backoff: Duration);

    /// Record a successful grab from `indexer`, relaxing any escalation
    fn record_success(&self, indexer: IndexerId);

    /// Indexers currently inside a disable window
    fn get_blocked(&self) -> HashSet<IndexerId>;
}

/// Exposes download client availability to whoever builds the eligible client set
///
/// Populated by health probes and other signals outside the dispatch path.
pub trait DownloadClientStatusTracker: Send + Sync {
    /// Providers currently inside a disable window
    fn get_blocked_providers(&self) -> HashSet<ProviderId>;
}

/// In-memory indexer status store
pub type IndexerStatusStore = StatusStore<IndexerId>;

/// In-memory download client status store
pub type DownloadClientStatusStore = StatusStore<ProviderId>;

impl IndexerStatusTracker for StatusStore<IndexerId> {
    fn record_failure(&self, indexer: IndexerId, backoff: Duration) {
        StatusStore::record_failure(self, indexer, backoff);
    }

    fn record_success(&self, indexer: IndexerId) {
        StatusStore::record_success(self, indexer);
    }

    fn get_blocked(&self) -> HashSet<IndexerId> {
        self.blocked()
    }
}

impl DownloadClientStatusTracker for StatusStore<ProviderId> {
    fn get_blocked_providers(&self) -> HashSet<ProviderId> {
        self.blocked()
    }
}
