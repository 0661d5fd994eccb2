//! Download client capability

use crate::error::Result;
use crate::types::{DispatchTarget, IndexerRef, Protocol, ProviderId, TransferId};
use async_trait::async_trait;

/// A download client backend (SABnzbd, NZBGet, qBittorrent, Transmission, ...)
///
/// Backends are plug-ins registered with a [`ClientRegistry`](crate::ClientRegistry).
/// The dispatcher imposes no timeout on [`download`](DownloadClient::download); the
/// backend owns its own.
///
/// # Errors
///
/// `download` must fail with the variant that matches where the fault lies:
/// - [`Error::ReleaseDownload`](crate::Error::ReleaseDownload) when fetching the
///   release from the indexer failed transiently (network, 5xx, 429)
/// - [`Error::ReleaseUnavailable`](crate::Error::ReleaseUnavailable) when the indexer
///   says the release is gone (404)
/// - [`Error::DownloadClient`](crate::Error::DownloadClient) for anything local to
///   the client (authentication, disk, configuration, rejected release)
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Provider id used for status tracking
    fn provider_id(&self) -> ProviderId;

    /// Human-readable name for logging and events
    fn name(&self) -> &str;

    /// Protocol this client serves
    fn protocol(&self) -> Protocol;

    /// Hand the release to the client, returning the client's transfer id
    async fn download(
        &self,
        target: &DispatchTarget,
        indexer: Option<&IndexerRef>,
    ) -> Result<TransferId>;
}
