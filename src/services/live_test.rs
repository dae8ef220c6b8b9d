use super::*;
use crate::state::test_helpers::MemoryStore;
use tokio::time::{Duration, timeout};

async fn next(sub: &mut Subscription) -> Snapshot {
    timeout(Duration::from_millis(500), sub.next_snapshot())
        .await
        .expect("snapshot receive timed out")
        .expect("subscription ended unexpectedly")
}

async fn assert_quiet(sub: &mut Subscription) {
    assert!(
        timeout(Duration::from_millis(80), sub.next_snapshot()).await.is_err(),
        "expected no snapshot"
    );
}

#[tokio::test]
async fn first_snapshot_is_pushed_immediately() {
    let store = Arc::new(MemoryStore::new());
    store.seed_game("Galaga");
    let hub = LiveHub::default();

    let mut sub = hub.observe(store, SelectionSet::scalars(ModelKind::Game));
    let snapshot = next(&mut sub).await;

    assert_eq!(snapshot.items.len(), 1);
    assert!(snapshot.is_synced);
    assert_eq!(snapshot.items[0]["name"], "Galaga");
}

#[tokio::test]
async fn notify_pushes_full_replacement() {
    let store = Arc::new(MemoryStore::new());
    store.seed_game("Galaga");
    let hub = LiveHub::default();

    let mut sub = hub.observe(Arc::clone(&store) as Arc<dyn DataStore>, SelectionSet::scalars(ModelKind::Game));
    assert_eq!(next(&mut sub).await.items.len(), 1);

    store.seed_game("Joust");
    hub.notify(ModelKind::Game);

    let snapshot = next(&mut sub).await;
    let names: Vec<&str> = snapshot.items.iter().filter_map(|i| i["name"].as_str()).collect();
    assert_eq!(names, vec!["Galaga", "Joust"]);
}

#[tokio::test]
async fn unrelated_kind_does_not_wake_query() {
    let store = Arc::new(MemoryStore::new());
    let hub = LiveHub::default();

    let mut sub = hub.observe(store, SelectionSet::scalars(ModelKind::Game));
    next(&mut sub).await;

    hub.notify(ModelKind::Location);
    assert_quiet(&mut sub).await;
}

#[tokio::test]
async fn nested_dependency_wakes_query() {
    let store = Arc::new(MemoryStore::new());
    let game = store.seed_game("Pac-Man");
    let hub = LiveHub::default();
    let selection = SelectionSet::parse(ModelKind::Game, &["name", "locations.location.name"]).unwrap();

    let mut sub = hub.observe(Arc::clone(&store) as Arc<dyn DataStore>, selection);
    let first = next(&mut sub).await;
    assert_eq!(first.items[0]["locations"], serde_json::json!([]));

    let loc = store.seed_location("Barcade");
    store.seed_join(game.id, loc.id);
    hub.notify(ModelKind::GameLocation);

    let second = next(&mut sub).await;
    assert_eq!(second.items[0]["locations"][0]["location"]["name"], "Barcade");
}

#[tokio::test]
async fn burst_of_changes_coalesces() {
    let store = Arc::new(MemoryStore::new());
    let hub = LiveHub::default();

    let mut sub = hub.observe(Arc::clone(&store) as Arc<dyn DataStore>, SelectionSet::scalars(ModelKind::Game));
    next(&mut sub).await;

    store.seed_game("A");
    store.seed_game("B");
    hub.notify(ModelKind::Game);
    hub.notify(ModelKind::Game);

    let latest = next(&mut sub).await;
    assert_eq!(latest.items.len(), 2);
}

#[tokio::test]
async fn dropping_subscription_stops_pump() {
    let store = Arc::new(MemoryStore::new());
    let hub = LiveHub::default();

    let mut sub = hub.observe(Arc::clone(&store) as Arc<dyn DataStore>, SelectionSet::scalars(ModelKind::Game));
    next(&mut sub).await;
    drop(sub);
    tokio::task::yield_now().await;

    let before = store.lists.load(std::sync::atomic::Ordering::SeqCst);
    hub.notify(ModelKind::Game);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.lists.load(std::sync::atomic::Ordering::SeqCst), before);
}

#[test]
fn notify_bumps_version() {
    let hub = LiveHub::new(4);
    assert_eq!(hub.version(ModelKind::Game), 0);
    hub.notify(ModelKind::Game);
    hub.notify(ModelKind::Game);
    assert_eq!(hub.version(ModelKind::Game), 2);
    assert_eq!(hub.version(ModelKind::Location), 0);
}

#[test]
fn snapshot_serializes_camel_case() {
    let snapshot = Snapshot { items: vec![], is_synced: true };
    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value, serde_json::json!({"items": [], "isSynced": true}));
}

#[tokio::test]
async fn subscription_is_a_snapshot_stream() {
    use futures::StreamExt;

    let store = Arc::new(MemoryStore::new());
    store.seed_location("Barcade");
    let hub = LiveHub::default();

    let sub = hub.observe(Arc::clone(&store) as Arc<dyn DataStore>, SelectionSet::scalars(ModelKind::Location));
    let mut counts = sub.map(|snapshot| snapshot.items.len());

    assert_eq!(timeout(Duration::from_millis(500), counts.next()).await.unwrap(), Some(1));
    store.seed_location("Ground Kontrol");
    hub.notify(ModelKind::Location);
    assert_eq!(timeout(Duration::from_millis(500), counts.next()).await.unwrap(), Some(2));
}
