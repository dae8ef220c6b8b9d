use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tokio::time::{Duration, timeout};

use crate::state::test_helpers::{MemoryStore, test_app_state};

struct Harness {
    state: AppState,
    store: Arc<MemoryStore>,
    streams: Streams,
    tx: mpsc::Sender<Frame>,
    rx: mpsc::Receiver<Frame>,
}

impl Harness {
    fn new() -> Self {
        let (state, store) = test_app_state();
        let (tx, rx) = mpsc::channel(64);
        Self { state, store, streams: Streams::default(), tx, rx }
    }

    async fn send(&mut self, frame: &Frame) -> Vec<Frame> {
        let text = serde_json::to_string(frame).unwrap();
        process_inbound_text(&self.state, &mut self.streams, Uuid::new_v4(), Uuid::new_v4(), &self.tx, &text).await
    }

    async fn next_item(&mut self) -> Frame {
        timeout(Duration::from_millis(500), self.rx.recv())
            .await
            .expect("stream item timed out")
            .expect("stream channel closed unexpectedly")
    }
}

fn request(syscall: &str, data: serde_json::Value) -> Frame {
    let data: Data = serde_json::from_value(data).unwrap();
    Frame::request(syscall, data)
}

/// Cancel frame for an open stream, as a browser would send it.
fn cancel(target: Uuid) -> Frame {
    let mut frame = Frame::request("", Data::new());
    frame.parent_id = Some(target);
    frame.status = Status::Cancel;
    frame
}

fn single(frames: Vec<Frame>) -> Frame {
    assert_eq!(frames.len(), 1, "expected exactly one reply: {frames:?}");
    frames.into_iter().next().unwrap()
}

// =============================================================================
// sending
// =============================================================================

#[tokio::test]
async fn send_frames_writes_text_in_order() {
    let mut sent: Vec<Message> = Vec::new();
    let frames = vec![Frame::request("game:create", Data::new()), Frame::request("game:delete", Data::new())];
    send_frames(&mut sent, &frames).await.unwrap();

    let syscalls: Vec<String> = sent
        .iter()
        .map(|msg| match msg {
            Message::Text(text) => serde_json::from_str::<Frame>(text.as_str()).unwrap().syscall,
            other => panic!("expected text message, got {other:?}"),
        })
        .collect();
    assert_eq!(syscalls, vec!["game:create", "game:delete"]);
}

#[tokio::test]
async fn send_frames_stops_at_first_failed_send() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let mut closed = Box::pin(futures::sink::unfold((), move |(), _msg: Message| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("socket closed")
        }
    }));

    let frames = vec![Frame::request("a:one", Data::new()), Frame::request("a:two", Data::new())];
    assert_eq!(send_frames(&mut closed, &frames).await, Err("socket closed"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

// =============================================================================
// gateway
// =============================================================================

#[tokio::test]
async fn invalid_json_returns_gateway_error() {
    let mut h = Harness::new();
    let text = "{not json";
    let reply = single(process_inbound_text(&h.state, &mut h.streams, Uuid::new_v4(), Uuid::new_v4(), &h.tx, text).await);
    assert_eq!(reply.syscall, "gateway:error");
    assert!(reply.str_field("message").unwrap().starts_with("invalid json"));
}

#[tokio::test]
async fn unknown_prefix_is_an_error() {
    let mut h = Harness::new();
    let req = request("board:join", json!({}));
    let reply = single(h.send(&req).await);
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.parent_id, Some(req.id));
    assert_eq!(reply.str_field("message"), Some("unknown prefix: board"));
}

// =============================================================================
// records
// =============================================================================

#[tokio::test]
async fn game_create_replies_with_record() {
    let mut h = Harness::new();
    let reply = single(h.send(&request("game:create", json!({"name": "Tempest", "description": "Tube shooter"}))).await);

    assert_eq!(reply.status, Status::Done);
    assert_eq!(reply.data["record"]["name"], "Tempest");
    assert_eq!(reply.data["record"]["description"], "Tube shooter");
    assert!(reply.data["record"]["createdAt"].is_string());
    assert_eq!(h.store.game_creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn game_location_create_uses_camel_case_keys() {
    let mut h = Harness::new();
    let game = h.store.seed_game("Tempest");
    let location = h.store.seed_location("Barcade");
    let req = request("gamelocation:create", json!({"gameId": game.id, "locationId": location.id}));

    let reply = single(h.send(&req).await);
    assert_eq!(reply.status, Status::Done);
    assert_eq!(h.store.joins().len(), 1);
    assert_eq!(h.store.joins()[0].game_id, game.id);
}

#[tokio::test]
async fn create_with_missing_input_is_an_error_without_store_call() {
    let mut h = Harness::new();
    let reply = single(h.send(&request("location:create", json!({}))).await);
    assert_eq!(reply.status, Status::Error);
    assert!(reply.str_field("message").unwrap().starts_with("invalid Location input"));
    assert_eq!(h.store.total_calls(), 0);
}

#[tokio::test]
async fn delete_missing_record_reports_not_found() {
    let mut h = Harness::new();
    let reply = single(h.send(&request("game:delete", json!({"id": Uuid::new_v4()}))).await);
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.str_field("code"), Some("E_NOT_FOUND"));
    assert_eq!(reply.data["retryable"], false);
}

#[tokio::test]
async fn delete_replies_with_id() {
    let mut h = Harness::new();
    let location = h.store.seed_location("Barcade");
    let reply = single(h.send(&request("location:delete", json!({"id": location.id}))).await);
    assert_eq!(reply.status, Status::Done);
    assert_eq!(reply.uuid_field("id"), Some(location.id));
    assert!(h.store.locations().is_empty());
}

// =============================================================================
// query:observe
// =============================================================================

#[tokio::test]
async fn observe_streams_snapshots_until_cancel() {
    let mut h = Harness::new();
    h.store.seed_game("Asteroids");
    let req = request("query:observe", json!({"model": "Game", "selectionSet": ["name"]}));

    assert!(h.send(&req).await.is_empty());
    assert_eq!(h.streams.len(), 1);

    let first = h.next_item().await;
    assert_eq!(first.status, Status::Item);
    assert_eq!(first.parent_id, Some(req.id));
    assert_eq!(first.data["items"], json!([{"name": "Asteroids"}]));
    assert_eq!(first.data["isSynced"], true);

    h.send(&request("game:create", json!({"name": "Berzerk", "description": "Robots"}))).await;
    let second = h.next_item().await;
    assert_eq!(second.data["items"].as_array().unwrap().len(), 2);

    let done = single(h.send(&cancel(req.id)).await);
    assert_eq!(done.status, Status::Done);
    assert_eq!(done.parent_id, Some(req.id));
    assert_eq!(h.streams.len(), 0);
}

#[tokio::test]
async fn observe_rejects_bad_selection() {
    let mut h = Harness::new();
    let reply = single(h.send(&request("query:observe", json!({"model": "Game", "selectionSet": ["score"]}))).await);
    assert_eq!(reply.str_field("code"), Some("E_SELECTION"));
    assert_eq!(h.streams.len(), 0);
}

#[tokio::test]
async fn observe_requires_known_model() {
    let mut h = Harness::new();
    let reply = single(h.send(&request("query:observe", json!({"model": "Event"}))).await);
    assert_eq!(reply.status, Status::Error);
}

#[tokio::test]
async fn cancel_unknown_stream_is_an_error() {
    let mut h = Harness::new();
    let reply = single(h.send(&cancel(Uuid::new_v4())).await);
    assert_eq!(reply.status, Status::Error);
}

// =============================================================================
// view:subscribe / view:delete
// =============================================================================

#[tokio::test]
async fn view_subscribe_streams_rendered_html() {
    let mut h = Harness::new();
    let galaga = h.store.seed_game("Galaga");
    let barcade = h.store.seed_location("Barcade");
    h.store.seed_join(galaga.id, barcade.id);

    assert!(h.send(&request("view:subscribe", json!({"view": "games"}))).await.is_empty());
    let item = h.next_item().await;
    assert_eq!(item.data["count"], 1);
    let html = item.str_field("html").unwrap();
    assert!(html.contains("<h2>Galaga</h2>"));
    assert!(html.contains("Where to play: Barcade"));
}

#[tokio::test]
async fn view_delete_only_changes_view_through_next_snapshot() {
    let mut h = Harness::new();
    let a = h.store.seed_location("Arcade A");
    h.store.seed_location("Arcade B");

    h.send(&request("view:subscribe", json!({"view": "locations"}))).await;
    assert_eq!(h.next_item().await.data["count"], 2);

    let done = single(h.send(&request("view:delete", json!({"view": "locations", "id": a.id}))).await);
    assert_eq!(done.status, Status::Done);
    assert!(done.data.is_empty());

    let next = h.next_item().await;
    assert_eq!(next.data["count"], 1);
    assert!(!next.str_field("html").unwrap().contains("Arcade A"));
}

#[tokio::test]
async fn unknown_view_is_an_error() {
    let mut h = Harness::new();
    let reply = single(h.send(&request("view:subscribe", json!({"view": "events"}))).await);
    assert_eq!(reply.status, Status::Error);
    assert_eq!(h.streams.len(), 0);
}
