//! End-to-end acquisition flow: fetch-or-reuse snapshot, then materialize.
//!
//! The upstream API is mocked so the tests pin down exactly when the network
//! is touched and what ends up on disk.

use std::time::Duration;

use httpmock::prelude::*;
use tempfile::tempdir;

use cardvault::{CardApi, CardStore, SnapshotPolicy, SnapshotStore};

fn card_payload() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {
                "id": 46986414,
                "name": "Dark Magician",
                "type": "Normal Monster",
                "humanReadableCardType": "Normal Monster",
                "frameType": "normal",
                "desc": "The ultimate wizard.",
                "race": "Spellcaster",
                "typeline": ["Spellcaster", "Normal"],
                "atk": 2500,
                "def": 2100,
                "level": 7,
                "attribute": "DARK",
                "card_sets": [{"set_name": "LOB"}],
                "card_images": [{"id": 46986414}],
                "card_prices": [{"cardmarket_price": "0.20"}]
            },
            {
                "id": 53129443,
                "name": "Dark Hole",
                "type": "Spell Card",
                "desc": "Destroy all monsters on the field.",
                "race": "Normal",
                "frameType": "spell",
                "banlist_info": {"ban_tcg": "Unlimited"}
            }
        ]
    })
}

#[tokio::test]
async fn fresh_fetch_writes_snapshot_and_materializes_every_row() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v7/cardinfo.php");
            then.status(200).json_body(card_payload());
        })
        .await;

    let dir = tempdir().unwrap();
    let snapshot = SnapshotStore::new(dir.path().join("cards.json"));
    let api = CardApi::new(server.url("/api/v7/cardinfo.php")).unwrap();

    let outcome = snapshot
        .ensure(&api, SnapshotPolicy::ReuseAlways)
        .await
        .unwrap();
    assert!(!outcome.from_cache);
    assert!(snapshot.exists());
    assert_eq!(mock.hits_async().await, 1);

    // Reloading the file reproduces the fetched row count.
    let reloaded = snapshot.load().await.unwrap();
    assert_eq!(reloaded.cards.len(), outcome.cards.len());

    let store = CardStore::open_in_memory().await.unwrap();
    store.materialize(&outcome.cards).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn upstream_failure_leaves_no_snapshot_behind() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v7/cardinfo.php");
            then.status(500).body("upstream exploded");
        })
        .await;

    let dir = tempdir().unwrap();
    let snapshot = SnapshotStore::new(dir.path().join("cards.json"));
    let api = CardApi::new(server.url("/api/v7/cardinfo.php")).unwrap();

    let err = snapshot
        .ensure(&api, SnapshotPolicy::ReuseAlways)
        .await
        .unwrap_err();
    assert!(
        matches!(err, cardvault::CardError::Api { status: 500 }),
        "got {err:?}"
    );
    assert!(!snapshot.exists());
}

#[tokio::test]
async fn existing_snapshot_never_touches_the_network() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v7/cardinfo.php");
            then.status(200).json_body(card_payload());
        })
        .await;

    let dir = tempdir().unwrap();
    let snapshot = SnapshotStore::new(dir.path().join("cards.json"));
    let api = CardApi::new(server.url("/api/v7/cardinfo.php")).unwrap();

    // Seed the cache with one real fetch, then ensure twice more.
    snapshot
        .ensure(&api, SnapshotPolicy::ReuseAlways)
        .await
        .unwrap();
    for _ in 0..2 {
        let outcome = snapshot
            .ensure(&api, SnapshotPolicy::ReuseAlways)
            .await
            .unwrap();
        assert!(outcome.from_cache);
        assert_eq!(outcome.cards.len(), 2);
    }
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn stale_snapshot_refetches_under_max_age_policy() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v7/cardinfo.php");
            then.status(200).json_body(card_payload());
        })
        .await;

    let dir = tempdir().unwrap();
    let path = dir.path().join("cards.json");
    let snapshot = SnapshotStore::new(&path);
    let api = CardApi::new(server.url("/api/v7/cardinfo.php")).unwrap();

    // Backdate a seeded snapshot beyond the allowed age.
    let mut seeded = cardvault::Snapshot::now(vec![]);
    seeded.fetched_at = chrono::Utc::now() - chrono::Duration::days(30);
    snapshot.save(&seeded).await.unwrap();

    let outcome = snapshot
        .ensure(&api, SnapshotPolicy::MaxAge(Duration::from_secs(3600)))
        .await
        .unwrap();
    assert!(!outcome.from_cache);
    assert_eq!(outcome.cards.len(), 2);
    assert_eq!(mock.hits_async().await, 1);

    // The refreshed file is reusable again under the same policy.
    let outcome = snapshot
        .ensure(&api, SnapshotPolicy::MaxAge(Duration::from_secs(3600)))
        .await
        .unwrap();
    assert!(outcome.from_cache);
    assert_eq!(mock.hits_async().await, 1);
}
