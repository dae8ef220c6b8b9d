use super::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::services::live::LiveHub;
use crate::services::store::DataStore;
use crate::state::test_helpers::MemoryStore;

fn client_with_store() -> (DataClient, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let client = DataClient::new(Arc::clone(&store) as Arc<dyn DataStore>, LiveHub::default());
    (client, store)
}

async fn settle(joins: Vec<JoinHandle<()>>) {
    for join in joins {
        join.await.expect("join task panicked");
    }
}

// =============================================================================
// game form
// =============================================================================

#[tokio::test]
async fn game_without_name_fails_before_store_call() {
    let (client, store) = client_with_store();
    let err = submit_game(&client, GameFormInput { name: String::new(), description: "Maze chase".into() })
        .await
        .unwrap_err();

    assert!(matches!(err, FormError::MissingFields(GAME_FIELDS_REQUIRED)));
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn game_without_description_fails_before_store_call() {
    let (client, store) = client_with_store();
    let err = submit_game(&client, GameFormInput { name: "Pac-Man".into(), description: String::new() })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "name and description are required!");
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn game_submit_creates_once() {
    let (client, store) = client_with_store();
    let game = submit_game(&client, GameFormInput { name: "Pac-Man".into(), description: "Maze chase".into() })
        .await
        .unwrap();

    assert_eq!(game.name, "Pac-Man");
    assert_eq!(store.game_creates.load(Ordering::SeqCst), 1);
}

// =============================================================================
// location form
// =============================================================================

#[tokio::test]
async fn location_without_games_fails_before_location_create() {
    let (client, store) = client_with_store();
    let err = submit_location(&client, LocationFormInput { name: "Barcade".into(), games: vec![] })
        .await
        .err()
        .unwrap();

    assert!(matches!(err, FormError::MissingFields(LOCATION_FIELDS_REQUIRED)));
    assert_eq!(store.location_creates.load(Ordering::SeqCst), 0);
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn location_without_name_fails_before_location_create() {
    let (client, store) = client_with_store();
    let game = store.seed_game("Joust");
    let result = submit_location(&client, LocationFormInput { name: String::new(), games: vec![game.id.to_string()] }).await;

    assert!(matches!(result, Err(FormError::MissingFields(_))));
    assert_eq!(store.location_creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn location_with_bad_game_id_fails_before_location_create() {
    let (client, store) = client_with_store();
    let result = submit_location(&client, LocationFormInput { name: "Barcade".into(), games: vec!["not-a-uuid".into()] }).await;

    assert!(matches!(result, Err(FormError::InvalidGameId(raw)) if raw == "not-a-uuid"));
    assert_eq!(store.location_creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn location_with_n_games_issues_one_location_and_n_joins() {
    let (client, store) = client_with_store();
    let games: Vec<_> = ["Galaga", "Joust", "Qix"].iter().map(|n| store.seed_game(n)).collect();
    let input = LocationFormInput { name: "Barcade".into(), games: games.iter().map(|g| g.id.to_string()).collect() };

    let created = submit_location(&client, input).await.unwrap();
    assert_eq!(created.joins.len(), 3);
    settle(created.joins).await;

    assert_eq!(store.location_creates.load(Ordering::SeqCst), 1);
    assert_eq!(store.join_creates.load(Ordering::SeqCst), 3);
    let joins = store.joins();
    assert!(joins.iter().all(|j| j.location_id == created.location.id));
    for game in &games {
        assert!(joins.iter().any(|j| j.game_id == game.id));
    }
}

#[tokio::test]
async fn failed_join_is_not_surfaced_or_rolled_back() {
    let (client, store) = client_with_store();
    let ok = store.seed_game("Galaga");
    let bad = store.seed_game("Joust");
    store.fail_joins_for(bad.id);

    let input = LocationFormInput { name: "Barcade".into(), games: vec![ok.id.to_string(), bad.id.to_string()] };
    let created = submit_location(&client, input).await.unwrap();
    settle(created.joins).await;

    assert_eq!(store.join_creates.load(Ordering::SeqCst), 2);
    assert_eq!(store.locations().len(), 1, "location is kept");
    let joins = store.joins();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].game_id, ok.id);
}

// =============================================================================
// options
// =============================================================================

#[tokio::test]
async fn game_options_list_current_games() {
    let (client, store) = client_with_store();
    let a = store.seed_game("Asteroids");
    let b = store.seed_game("Berzerk");

    let options = load_game_options(&client).await.unwrap();
    assert_eq!(
        options,
        vec![GameOption { id: a.id, name: "Asteroids".into() }, GameOption { id: b.id, name: "Berzerk".into() }]
    );
}
