//! Release dispatch: select a client, hand it the release, book the outcome.
//!
//! One call to [`Dispatcher::dispatch`] runs these steps in order:
//! 1. select a client for the release protocol from the [`ClientRegistry`]
//! 2. invoke the client (the only suspension point)
//! 3. classify the result into an [`Outcome`]
//! 4. update the indexer status tracker for that outcome
//! 5. on success publish [`Event::ReleaseGrabbed`]
//!
//! The error a client raises is returned to the caller untouched. Download client
//! status is never consulted here; a selected client is always attempted.


use crate::backoff::Outcome;
use crate::config::DispatchConfig;
use crate::error::Result;
use crate::registry::ClientRegistry;
use crate::status::IndexerStatusTracker;
use crate::types::{DispatchTarget, Event, Release, TransferId};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Routes releases to download clients (cloneable, all fields are shared)
#[derive(Clone)]
pub struct Dispatcher {
    /// Clients eligible for selection
    registry: Arc<ClientRegistry>,
    /// Indexer health bookkeeping
    indexer_status: Arc<dyn IndexerStatusTracker>,
    /// Grab event broadcast channel (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
    /// Dispatch behavior
    config: Arc<DispatchConfig>,
}

impl Dispatcher {
    /// Create a dispatcher over a registry and an indexer status tracker
    ///
    /// A zero `default_indexer_backoff` is replaced by the stock default so a
    /// generic retryable failure always backs the indexer off.
    pub fn new(
        mut config: DispatchConfig,
        registry: Arc<ClientRegistry>,
        indexer_status: Arc<dyn IndexerStatusTracker>,
    ) -> Self {
        if config.default_indexer_backoff.is_zero() {
            config.default_indexer_backoff = DispatchConfig::default().default_indexer_backoff;
            tracing::warn!(
                backoff_secs = config.default_indexer_backoff.as_secs(),
                "Zero default indexer backoff replaced"
            );
        }

        let (event_tx, _rx) = broadcast::channel(config.event_capacity.max(1));
        Self {
            registry,
            indexer_status,
            event_tx,
            config: Arc::new(config),
        }
    }

    /// Subscribe to grab events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The registry clients are selected from
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Hand a release to the download client serving its protocol
    ///
    /// # Errors
    ///
    /// - [`Error::NoClientAvailable`](crate::Error::NoClientAvailable) if no client
    ///   takes the protocol. Nothing is recorded and no event is published.
    /// - Whatever the selected client raised, unchanged, after the indexer status
    ///   tracker has been updated for it.
    pub async fn dispatch(&self, target: &DispatchTarget) -> Result<TransferId> {
        let release = &target.release;
        let indexer = release.indexer.as_ref();

        let client = self
            .registry
            .select_client(release.protocol, indexer)
            .await?;

        tracing::debug!(
            release = %release,
            protocol = %release.protocol,
            client = client.name(),
            provider_id = %client.provider_id(),
            "Dispatching release to download client"
        );

        let result = client.download(target, indexer).await;

        let outcome = Outcome::classify(&result, self.config.default_indexer_backoff);
        self.record_outcome(release, outcome);

        let transfer_id = match result {
            Ok(transfer_id) => transfer_id,
            Err(e) => {
                tracing::debug!(
                    release = %release,
                    client = client.name(),
                    error = %e,
                    ?outcome,
                    "Dispatch failed"
                );
                return Err(e);
            }
        };

        tracing::info!(
            release = %release,
            client = client.name(),
            transfer_id = %transfer_id,
            "Release grabbed"
        );

        self.emit_event(Event::ReleaseGrabbed {
            release: release.clone(),
            item: target.item.clone(),
            download_client: client.name().to_string(),
            download_client_id: client.provider_id(),
            transfer_id: transfer_id.clone(),
            grabbed_at: Utc::now(),
        });

        Ok(transfer_id)
    }

    /// Apply the indexer status update an outcome calls for
    fn record_outcome(&self, release: &Release, outcome: Outcome) {
        let indexer_id = release.indexer_id();

        match (outcome, indexer_id) {
            (Outcome::Success, Some(indexer_id)) => {
                self.indexer_status.record_success(indexer_id);
            }
            (Outcome::IndexerRetryableFailure { backoff }, Some(indexer_id)) => {
                tracing::warn!(
                    release = %release,
                    indexer_id = %indexer_id,
                    backoff_secs = backoff.as_secs(),
                    "Indexer failed to serve release, backing off"
                );
                self.indexer_status.record_failure(indexer_id, backoff);
            }
            (Outcome::IndexerRetryableFailure { .. }, None) => {
                tracing::warn!(
                    release = %release,
                    "Release download failed but the release has no indexer, nothing to back off"
                );
            }
            (Outcome::IndexerPermanentFailure, _) => {
                tracing::debug!(release = %release, "Release no longer available on indexer");
            }
            (Outcome::Success, None)
            | (Outcome::ClientFailure, _)
            | (Outcome::NoClientAvailable, _) => {}
        }
    }

    fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}
