//! End-to-end dispatch through the public API with the in-memory status stores.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Behavior, FakeClient, target};
use grab_dispatch::{
    ClientRegistry, Config, Dispatcher, DownloadClientStatusStore, DownloadClientStatusTracker,
    ErrorKind, Event, IndexerId, IndexerStatusStore, IndexerStatusTracker, Protocol, ProviderId,
};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn build_dispatcher(
    config: &Config,
    registry: Arc<ClientRegistry>,
) -> (Dispatcher, Arc<IndexerStatusStore>) {
    let indexers = Arc::new(IndexerStatusStore::new(config.status.clone()));
    let dispatcher = Dispatcher::new(config.dispatch.clone(), registry, indexers.clone());
    (dispatcher, indexers)
}

#[tokio::test]
async fn configured_clients_take_their_protocols() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "dispatch": {{ "default_indexer_backoff": 90 }},
            "clients": [
                {{ "id": 1, "name": "SABnzbd", "protocol": "usenet" }},
                {{ "id": 2, "name": "qBittorrent", "protocol": "torrent" }}
            ]
        }}"#
    )
    .unwrap();
    let config = Config::from_json_file(file.path()).unwrap();

    let registry = Arc::new(ClientRegistry::from_definitions(&config.clients));
    let usenet = FakeClient::new(1, Protocol::Usenet, Behavior::Accept(Duration::ZERO));
    let torrent = FakeClient::new(2, Protocol::Torrent, Behavior::Accept(Duration::ZERO));
    registry.attach(usenet.clone()).await.unwrap();
    registry.attach(torrent.clone()).await.unwrap();

    let (dispatcher, _) = build_dispatcher(&config, registry);
    let mut events = dispatcher.subscribe();

    dispatcher.dispatch(&target(1, Protocol::Usenet, 10)).await.unwrap();
    dispatcher.dispatch(&target(2, Protocol::Torrent, 10)).await.unwrap();

    assert_eq!(usenet.calls(), 1);
    assert_eq!(torrent.calls(), 1);

    let Event::ReleaseGrabbed {
        download_client, ..
    } = events.recv().await.unwrap();
    assert_eq!(download_client, "fake-1");
    let Event::ReleaseGrabbed {
        download_client, ..
    } = events.recv().await.unwrap();
    assert_eq!(download_client, "fake-2");
}

#[tokio::test]
async fn rate_limited_indexer_is_blocked_for_retry_after() {
    let config = Config::default();
    let registry = Arc::new(ClientRegistry::new());
    registry
        .register(FakeClient::new(
            1,
            Protocol::Usenet,
            Behavior::RateLimited(Some("7200".into())),
        ))
        .await;
    let (dispatcher, indexers) = build_dispatcher(&config, registry);

    let err = dispatcher
        .dispatch(&target(1, Protocol::Usenet, 7))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IndexerRetryable);
    assert!(indexers.get_blocked().contains(&IndexerId(7)));

    let status = indexers.status(IndexerId(7)).unwrap();
    let window = status.disabled_till.unwrap() - status.most_recent_failure.unwrap();
    assert_eq!(window, chrono::Duration::seconds(7200));
}

#[tokio::test]
async fn gone_release_and_client_errors_leave_indexer_healthy() {
    let config = Config::default();

    for behavior in [Behavior::Gone, Behavior::ClientError] {
        let registry = Arc::new(ClientRegistry::new());
        registry
            .register(FakeClient::new(1, Protocol::Usenet, behavior.clone()))
            .await;
        let (dispatcher, indexers) = build_dispatcher(&config, registry);

        let err = dispatcher
            .dispatch(&target(1, Protocol::Usenet, 3))
            .await
            .unwrap_err();

        assert_ne!(err.kind(), ErrorKind::IndexerRetryable, "{behavior:?}");
        assert!(indexers.get_blocked().is_empty(), "{behavior:?}");
        assert!(indexers.status(IndexerId(3)).is_none(), "{behavior:?}");
    }
}

#[tokio::test]
async fn concurrent_dispatches_each_publish_one_event() {
    let config = Config::default();
    let registry = Arc::new(ClientRegistry::new());
    let client = FakeClient::new(
        1,
        Protocol::Torrent,
        Behavior::Accept(Duration::from_millis(10)),
    );
    registry.register(client.clone()).await;
    let (dispatcher, indexers) = build_dispatcher(&config, registry);
    let mut events = dispatcher.subscribe();

    let targets: Vec<_> = (0..16).map(|n| target(n, Protocol::Torrent, n % 4)).collect();
    let results = futures::future::join_all(targets.iter().map(|t| dispatcher.dispatch(t))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(client.calls(), 16);

    let mut transfer_ids = HashSet::new();
    for _ in 0..16 {
        let Event::ReleaseGrabbed { transfer_id, .. } = events.recv().await.unwrap();
        transfer_ids.insert(transfer_id);
    }
    assert_eq!(transfer_ids.len(), 16);
    assert!(events.try_recv().is_err());
    assert!(indexers.get_blocked().is_empty());
}

#[tokio::test]
async fn blocked_client_is_filtered_only_by_eligible_view() {
    let config = Config::default();
    let registry = Arc::new(ClientRegistry::new());
    let primary = FakeClient::new(1, Protocol::Usenet, Behavior::Accept(Duration::ZERO));
    let backup = FakeClient::new(2, Protocol::Usenet, Behavior::Accept(Duration::ZERO));
    registry.register(primary.clone()).await;
    registry.register(backup.clone()).await;

    let client_status = DownloadClientStatusStore::new(config.status.clone());
    client_status.record_failure(ProviderId(1), Duration::from_secs(3 * 3600));

    // The dispatcher over the full registry still uses the blocked client
    let (dispatcher, _) = build_dispatcher(&config, registry.clone());
    dispatcher.dispatch(&target(1, Protocol::Usenet, 1)).await.unwrap();
    assert_eq!(primary.calls(), 1);

    // Whoever builds the eligible set decides to skip it
    let eligible = Arc::new(registry.eligible(&client_status.get_blocked_providers()).await);
    let (filtered, _) = build_dispatcher(&config, eligible);
    filtered.dispatch(&target(2, Protocol::Usenet, 1)).await.unwrap();
    assert_eq!(primary.calls(), 1);
    assert_eq!(backup.calls(), 1);
}
