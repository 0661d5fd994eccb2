//! Download client registry
//!
//! Holds configured download clients in registration order and answers
//! "which client takes this protocol". Selection is deterministic: the first
//! registered client with a live backend for the protocol wins. There is no
//! priority ordering or load balancing.
//!
//! The registry knows nothing about client health. Callers that want blocked or
//! disabled clients skipped build a filtered view with [`ClientRegistry::eligible`].

use crate::client::DownloadClient;
use crate::config::ClientDefinition;
use crate::error::{Error, Result};
use crate::types::{IndexerRef, Protocol, ProviderId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A configured client plus the backend that performs transfers for it
#[derive(Clone)]
pub struct ClientDescriptor {
    definition: ClientDefinition,
    handle: Option<Arc<dyn DownloadClient>>,
}

impl ClientDescriptor {
    /// Describe an enabled client from its backend
    pub fn new(client: Arc<dyn DownloadClient>) -> Self {
        Self {
            definition: ClientDefinition {
                id: client.provider_id(),
                name: client.name().to_string(),
                protocol: client.protocol(),
                enabled: true,
            },
            handle: Some(client),
        }
    }

    /// Describe a configured client whose backend has not been attached yet
    pub fn from_definition(definition: ClientDefinition) -> Self {
        Self {
            definition,
            handle: None,
        }
    }

    /// Set the enabled flag
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.definition.enabled = enabled;
        self
    }

    /// Configuration identity
    pub fn definition(&self) -> &ClientDefinition {
        &self.definition
    }

    /// Backend handle, if attached
    pub fn handle(&self) -> Option<&Arc<dyn DownloadClient>> {
        self.handle.as_ref()
    }
}

impl std::fmt::Debug for ClientDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientDescriptor")
            .field("definition", &self.definition)
            .field("attached", &self.handle.is_some())
            .finish()
    }
}

/// Registered download clients, in registration order
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<Vec<ClientDescriptor>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from configured definitions, with no backends attached
    pub fn from_definitions(definitions: &[ClientDefinition]) -> Self {
        let clients = definitions
            .iter()
            .cloned()
            .map(ClientDescriptor::from_definition)
            .collect();
        Self {
            clients: RwLock::new(clients),
        }
    }

    /// Register an enabled client backend
    pub async fn register(&self, client: Arc<dyn DownloadClient>) {
        self.register_descriptor(ClientDescriptor::new(client)).await;
    }

    /// Register a descriptor, replacing one with the same provider id in place
    pub async fn register_descriptor(&self, descriptor: ClientDescriptor) {
        let mut clients = self.clients.write().await;
        match clients
            .iter_mut()
            .find(|existing| existing.definition.id == descriptor.definition.id)
        {
            Some(existing) => *existing = descriptor,
            None => clients.push(descriptor),
        }
    }

    /// Attach a backend to a configured definition
    ///
    /// Fails if no definition has the backend's provider id or the protocols differ.
    pub async fn attach(&self, client: Arc<dyn DownloadClient>) -> Result<()> {
        let mut clients = self.clients.write().await;
        let provider_id = client.provider_id();

        let descriptor = clients
            .iter_mut()
            .find(|d| d.definition.id == provider_id)
            .ok_or_else(|| Error::Config {
                message: format!("no download client definition with id {provider_id}"),
                key: Some("clients".into()),
            })?;

        if descriptor.definition.protocol != client.protocol() {
            return Err(Error::Config {
                message: format!(
                    "download client {} serves {}, but definition {} is {}",
                    client.name(),
                    client.protocol(),
                    provider_id,
                    descriptor.definition.protocol
                ),
                key: Some("clients".into()),
            });
        }

        descriptor.handle = Some(client);
        Ok(())
    }

    /// Remove a client, returning whether one was registered
    pub async fn remove(&self, provider_id: ProviderId) -> bool {
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|d| d.definition.id != provider_id);
        clients.len() != before
    }

    /// Snapshot of registered definitions, in registration order
    pub async fn definitions(&self) -> Vec<ClientDefinition> {
        self.clients
            .read()
            .await
            .iter()
            .map(|d| d.definition.clone())
            .collect()
    }

    /// Number of registered clients
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no clients are registered
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Select the client that takes a release of `protocol`
    ///
    /// If the originating indexer is pinned to a download client, that client is
    /// returned or selection fails. Otherwise the first registered client with an
    /// attached backend for the protocol wins. The enabled flag is not consulted.
    pub async fn select_client(
        &self,
        protocol: Protocol,
        indexer: Option<&IndexerRef>,
    ) -> Result<Arc<dyn DownloadClient>> {
        let clients = self.clients.read().await;

        let mut candidates = clients
            .iter()
            .filter(|d| d.definition.protocol == protocol)
            .filter_map(|d| d.handle.as_ref().map(|h| (d.definition.id, h)))
            .peekable();

        if candidates.peek().is_none() {
            return Err(Error::NoClientAvailable {
                protocol,
                reason: "no download client registered for this protocol".into(),
            });
        }

        if let Some(pinned) = indexer.and_then(|i| i.download_client_id) {
            return candidates
                .find(|(id, _)| *id == pinned)
                .map(|(_, handle)| handle.clone())
                .ok_or_else(|| Error::NoClientAvailable {
                    protocol,
                    reason: format!(
                        "indexer specified download client {pinned} is not available"
                    ),
                });
        }

        candidates
            .next()
            .map(|(_, handle)| handle.clone())
            .ok_or_else(|| Error::NoClientAvailable {
                protocol,
                reason: "no download client registered for this protocol".into(),
            })
    }

    /// Build a view holding only enabled clients that are not in `blocked`
    ///
    /// For callers that own the eligible set; the dispatcher never filters.
    pub async fn eligible(&self, blocked: &HashSet<ProviderId>) -> ClientRegistry {
        let clients = self
            .clients
            .read()
            .await
            .iter()
            .filter(|d| d.definition.enabled && !blocked.contains(&d.definition.id))
            .cloned()
            .collect();
        ClientRegistry {
            clients: RwLock::new(clients),
        }
    }
}
