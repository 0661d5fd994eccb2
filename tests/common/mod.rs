//! Common test utilities for grab-dispatch integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use grab_dispatch::{
    DispatchTarget, DownloadClient, Error, IndexerFault, IndexerRef, LibraryItem, Protocol,
    ProviderId, Release, Result, TransferId,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a [`FakeClient`] answers a download request
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Accept after an optional delay
    Accept(Duration),
    /// Fail as the indexer rate limiting us
    RateLimited(Option<String>),
    /// Fail as the release being gone
    Gone,
    /// Fail inside the client
    ClientError,
}

/// Download client backend with scripted behavior
pub struct FakeClient {
    id: ProviderId,
    name: String,
    protocol: Protocol,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeClient {
    pub fn new(id: i32, protocol: Protocol, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: ProviderId(id),
            name: format!("fake-{id}"),
            protocol,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadClient for FakeClient {
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
        _indexer: Option<&IndexerRef>,
    ) -> Result<TransferId> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let title = &target.release.title;

        match &self.behavior {
            Behavior::Accept(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(TransferId::new(format!("{}-{call}", self.name)))
            }
            Behavior::RateLimited(retry_after) => Err(Error::release_download(
                title,
                "Error",
                IndexerFault::TooManyRequests {
                    retry_after: retry_after.clone(),
                },
            )),
            Behavior::Gone => Err(Error::release_unavailable(title, "HTTP 404")),
            Behavior::ClientError => Err(Error::download_client(&self.name, "API key incorrect")),
        }
    }
}

/// A release from `indexer` matched to a library item with the same number
pub fn target(n: i32, protocol: Protocol, indexer: i32) -> DispatchTarget {
    DispatchTarget::new(
        Release::new(
            format!("Movie.{n}.2020.1080p"),
            protocol,
            format!("http://indexer{indexer}.test/get/{n}"),
        )
        .with_indexer(IndexerRef::new(indexer, format!("indexer-{indexer}"))),
        LibraryItem::new(n.into(), format!("Movie {n}")),
    )
}
