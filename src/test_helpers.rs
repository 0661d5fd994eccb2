//! Shared test doubles for download clients and status trackers.

use crate::client::DownloadClient;
use crate::error::{Error, Result};
use crate::status::IndexerStatusTracker;
use crate::types::{
    DispatchTarget, IndexerId, IndexerRef, LibraryItem, Protocol, ProviderId, Release, TransferId,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Failure = Box<dyn Fn(&Release) -> Error + Send + Sync>;

/// Download client that counts calls and optionally fails
pub(crate) struct MockClient {
    id: ProviderId,
    name: String,
    protocol: Protocol,
    calls: AtomicUsize,
    indexers: Mutex<Vec<Option<IndexerId>>>,
    failure: Mutex<Option<Failure>>,
}

impl MockClient {
    pub(crate) fn new(id: i32, protocol: Protocol) -> Arc<Self> {
        Arc::new(Self {
            id: ProviderId(id),
            name: format!("{protocol}-client-{id}"),
            protocol,
            calls: AtomicUsize::new(0),
            indexers: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        })
    }

    pub(crate) fn usenet(id: i32) -> Arc<Self> {
        Self::new(id, Protocol::Usenet)
    }

    pub(crate) fn torrent(id: i32) -> Arc<Self> {
        Self::new(id, Protocol::Torrent)
    }

    /// Make every subsequent download fail with the error `failure` builds
    pub(crate) fn fail_with(&self, failure: impl Fn(&Release) -> Error + Send + Sync + 'static) {
        *self.failure.lock().unwrap() = Some(Box::new(failure));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn indexers_seen(&self) -> Vec<Option<IndexerId>> {
        self.indexers.lock().unwrap().clone()
    }
}

#[async_trait]
impl DownloadClient for MockClient {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn download(
        &self,
        target: &DispatchTarget,
        indexer: Option<&IndexerRef>,
    ) -> Result<TransferId> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.indexers.lock().unwrap().push(indexer.map(|i| i.id));

        if let Some(failure) = self.failure.lock().unwrap().as_ref() {
            return Err(failure(&target.release));
        }

        Ok(TransferId::new(format!("{}-{}", self.name, call)))
    }
}

/// Indexer tracker that records every call
#[derive(Default)]
pub(crate) struct RecordingIndexerTracker {
    failures: Mutex<Vec<(IndexerId, Duration)>>,
    successes: Mutex<Vec<IndexerId>>,
}

impl RecordingIndexerTracker {
    pub(crate) fn failures(&self) -> Vec<(IndexerId, Duration)> {
        self.failures.lock().unwrap().clone()
    }

    pub(crate) fn successes(&self) -> Vec<IndexerId> {
        self.successes.lock().unwrap().clone()
    }
}

impl IndexerStatusTracker for RecordingIndexerTracker {
    fn record_failure(&self, indexer: IndexerId, backoff: Duration) {
        self.failures.lock().unwrap().push((indexer, backoff));
    }

    fn record_success(&self, indexer: IndexerId) {
        self.successes.lock().unwrap().push(indexer);
    }

    fn get_blocked(&self) -> HashSet<IndexerId> {
        HashSet::new()
    }
}

/// A usenet release from indexer 1, matched to library item 1
pub(crate) fn usenet_target() -> DispatchTarget {
    DispatchTarget::new(
        Release::new(
            "Movie.Title.2020.1080p.BluRay.x264",
            Protocol::Usenet,
            "http://test.site/download1.ext",
        )
        .with_indexer(IndexerRef::new(1, "test indexer")),
        LibraryItem::new(1, "Movie Title"),
    )
}
