use super::*;
use std::sync::atomic::Ordering;

use crate::state::test_helpers::MemoryStore;
use tokio::time::{Duration, timeout};

fn client_with_store() -> (DataClient, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let client = DataClient::new(Arc::clone(&store) as Arc<dyn DataStore>, LiveHub::default());
    (client, store)
}

async fn next(sub: &mut Subscription) -> crate::services::live::Snapshot {
    timeout(Duration::from_millis(500), sub.next_snapshot())
        .await
        .expect("snapshot receive timed out")
        .expect("subscription ended unexpectedly")
}

#[tokio::test]
async fn create_notifies_live_queries() {
    let (client, _store) = client_with_store();
    let mut sub = client.game().observe_query::<&str>(&[]).unwrap();
    assert!(next(&mut sub).await.items.is_empty());

    let game = client
        .game()
        .create(NewGame { name: "Dig Dug".into(), description: "Dig".into() })
        .await
        .unwrap();

    let snapshot = next(&mut sub).await;
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0]["id"], serde_json::json!(game.id));
}

#[tokio::test]
async fn delete_removes_and_notifies() {
    let (client, store) = client_with_store();
    let game = store.seed_game("Qix");
    let mut sub = client.game().observe_query(&["id"]).unwrap();
    assert_eq!(next(&mut sub).await.items.len(), 1);

    client.game().delete(game.id).await.unwrap();

    assert!(next(&mut sub).await.items.is_empty());
    assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn delete_missing_record_is_not_found() {
    let (client, _store) = client_with_store();
    let err = client.location().delete(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: ModelKind::Location, .. }));
}

#[tokio::test]
async fn deleting_game_leaves_join_rows() {
    let (client, store) = client_with_store();
    let game = store.seed_game("Robotron");
    let loc = store.seed_location("Pinball Pete's");
    store.seed_join(game.id, loc.id);

    client.game().delete(game.id).await.unwrap();

    assert_eq!(store.joins().len(), 1);
    let mut sub = client.location().observe_query(&["name", "games.game.name"]).unwrap();
    let snapshot = next(&mut sub).await;
    assert_eq!(snapshot.items[0]["games"], serde_json::json!([{"game": null}]));
}

#[tokio::test]
async fn invalid_selection_is_rejected_before_subscribing() {
    let (client, store) = client_with_store();
    let err = client.game().observe_query(&["locations.nope"]).err().unwrap();
    assert!(matches!(err, SelectionError::UnknownField { kind: ModelKind::GameLocation, .. }));
    tokio::task::yield_now().await;
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn failed_create_does_not_notify() {
    let (client, store) = client_with_store();
    let game_id = Uuid::new_v4();
    store.fail_joins_for(game_id);

    let before = client.hub.version(ModelKind::GameLocation);
    let result = client
        .game_location()
        .create(NewGameLocation { game_id, location_id: Uuid::new_v4() })
        .await;

    assert!(result.is_err());
    assert_eq!(client.hub.version(ModelKind::GameLocation), before);
}
