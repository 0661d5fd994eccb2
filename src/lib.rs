//! # grab-dispatch
//!
//! Routes accepted releases to the download client that serves their protocol,
//! publishes a grab event on success, and classifies every failure to decide
//! whether the indexer that offered the release should be backed off.
//!
//! ## Design Philosophy
//!
//! - **Deterministic selection** - first registered client for the protocol wins
//! - **Errors pass through** - the caller sees exactly the error the client raised
//! - **Narrow tracker contracts** - the dispatcher hands trackers a base backoff;
//!   escalation is theirs
//! - **Event-driven** - consumers subscribe to grab events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use grab_dispatch::{
//!     ClientRegistry, Config, DispatchTarget, Dispatcher, IndexerRef, IndexerStatusStore,
//!     LibraryItem, Protocol, Release,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(sabnzbd: Arc<dyn grab_dispatch::DownloadClient>) -> grab_dispatch::Result<()> {
//! let config = Config::default();
//! let registry = Arc::new(ClientRegistry::from_definitions(&config.clients));
//! registry.register(sabnzbd).await;
//!
//! let indexers = Arc::new(IndexerStatusStore::new(config.status.clone()));
//! let dispatcher = Dispatcher::new(config.dispatch.clone(), registry, indexers.clone());
//!
//! let mut events = dispatcher.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//! });
//!
//! let release = Release::new("Movie.2020.1080p", Protocol::Usenet, "https://indexer/get/1")
//!     .with_indexer(IndexerRef::new(1, "my indexer"));
//! let target = DispatchTarget::new(release, LibraryItem::new(42, "Movie"));
//!
//! let transfer_id = dispatcher.dispatch(&target).await?;
//! println!("grabbed as {transfer_id}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Failure classification and `Retry-After` parsing
pub mod backoff;
/// Download client capability trait
pub mod client;
/// Configuration types
pub mod config;
/// Release dispatch
pub mod dispatcher;
/// Error types
pub mod error;
/// Download client registry
pub mod registry;
/// Indexer and download client status tracking
pub mod status;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use backoff::{Outcome, parse_retry_after};
pub use client::DownloadClient;
pub use config::{ClientDefinition, Config, DispatchConfig, StatusConfig};
pub use dispatcher::Dispatcher;
pub use error::{Error, ErrorKind, IndexerFault, Result, ToHttpStatus};
pub use registry::{ClientDescriptor, ClientRegistry};
pub use status::{
    DownloadClientStatusStore, DownloadClientStatusTracker, IndexerStatusStore,
    IndexerStatusTracker, ProviderStatus, StatusStore,
};
pub use types::{
    DispatchTarget, Event, IndexerId, IndexerRef, LibraryItem, Protocol, ProviderId, Release,
    TransferId,
};
