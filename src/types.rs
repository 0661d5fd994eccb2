//! Core types for grab-dispatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Transfer protocol a release is served over
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// NZB-based Usenet transfer
    Usenet,
    /// BitTorrent transfer (torrent file or magnet)
    Torrent,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Usenet => write!(f, "usenet"),
            Protocol::Torrent => write!(f, "torrent"),
        }
    }
}

/// Numeric identity of an indexer, as used by the indexer status tracker
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexerId(pub i32);

impl std::fmt::Display for IndexerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for IndexerId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Identity of a configured download client provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub i32);

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ProviderId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Identifier a download client hands back for an accepted transfer
///
/// Opaque to this crate: SABnzbd returns an `nzo_id`, torrent clients an info hash, etc.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(pub String);

impl TransferId {
    /// Create a new TransferId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The indexer a release was discovered on
///
/// Supplied by the discovery subsystem alongside the release, never derived here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerRef {
    /// Numeric id used for status tracking
    pub id: IndexerId,
    /// Display name
    pub name: String,
    /// Download client this indexer is pinned to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_client_id: Option<ProviderId>,
}

impl IndexerRef {
    /// Create an indexer reference without a pinned download client
    pub fn new(id: impl Into<IndexerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            download_client_id: None,
        }
    }

    /// Pin this indexer's grabs to a specific download client
    #[must_use]
    pub fn with_download_client(mut self, provider: impl Into<ProviderId>) -> Self {
        self.download_client_id = Some(provider.into());
        self
    }
}

/// A parsed release available for download
///
/// Immutable once handed to the dispatcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Release title as published by the indexer
    pub title: String,
    /// Transfer protocol
    pub protocol: Protocol,
    /// Download URL (NZB link, torrent link, or magnet URI)
    pub download_url: String,
    /// Originating indexer (None for manually added releases)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<IndexerRef>,
    /// Size in bytes, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Publish date reported by the indexer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    /// Arbitrary metadata a backend may need (category, seed ratio, etc.)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Release {
    /// Create a release with no indexer attribution and no metadata
    pub fn new(
        title: impl Into<String>,
        protocol: Protocol,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            protocol,
            download_url: download_url.into(),
            indexer: None,
            size: None,
            publish_date: None,
            metadata: HashMap::new(),
        }
    }

    /// Attribute this release to an indexer
    #[must_use]
    pub fn with_indexer(mut self, indexer: IndexerRef) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Id of the originating indexer, if attributed
    pub fn indexer_id(&self) -> Option<IndexerId> {
        self.indexer.as_ref().map(|i| i.id)
    }
}

impl std::fmt::Display for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Library entity a release resolves to (e.g. a movie)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    /// Library id
    pub id: i64,
    /// Display title
    pub title: String,
    /// Release year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

impl LibraryItem {
    /// Create a library item
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            year: None,
        }
    }
}

/// A release paired with the library item it resolves to
///
/// Borrowed by the dispatcher for the duration of one dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchTarget {
    /// The release to grab
    pub release: Release,
    /// The library item it was matched to
    pub item: LibraryItem,
}

impl DispatchTarget {
    /// Pair a release with its library item
    pub fn new(release: Release, item: LibraryItem) -> Self {
        Self { release, item }
    }
}

/// Event emitted by the dispatcher
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A release was handed to a download client and accepted
    ReleaseGrabbed {
        /// The grabbed release
        release: Release,
        /// Library item the release resolves to
        item: LibraryItem,
        /// Name of the download client that accepted it
        download_client: String,
        /// Provider id of that client
        download_client_id: ProviderId,
        /// Identifier the client assigned to the transfer
        transfer_id: TransferId,
        /// When the grab completed
        grabbed_at: DateTime<Utc>,
    },
}
