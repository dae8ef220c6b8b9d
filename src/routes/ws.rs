//! WebSocket handler — the data API and live views.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Frames from this connection's live streams → forward to client
//!
//! Handler functions validate, call the data client and return an
//! `Outcome`. The dispatch layer turns that into reply frames. Live queries
//! and list views are streams: a spawned forwarder turns each snapshot into
//! an `item` frame until the client cancels the request or disconnects.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (session cookie required) → send `session:connected`
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. `query:observe` / `view:subscribe` keep streaming `item` frames
//! 4. `cancel` (parent_id = request id) → stream stops, `done` sent
//! 5. Close → every stream is aborted

use std::collections::HashMap;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame, Status};
use crate::model::{Game, GameLocation, Location, ModelKind};
use crate::routes::auth::AuthUser;
use crate::services::client::{DataClient, Model};
use crate::state::AppState;
use crate::views::list::{GameItem, ListItem, ListKind, ListView, LocationItem};

/// Outbound frames buffered per connection.
const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. Handlers never send frames
/// directly.
enum Outcome {
    /// Send done+data to sender.
    Reply(Data),
    /// Send empty done to sender.
    Done,
    /// A forwarder is now streaming `item` frames for this request.
    Stream(JoinHandle<()>),
}

/// Open streams on one connection, keyed by request id.
#[derive(Default)]
pub(crate) struct Streams {
    open: HashMap<Uuid, (Frame, JoinHandle<()>)>,
}

impl Streams {
    fn insert(&mut self, req: &Frame, task: JoinHandle<()>) {
        if let Some((_, old)) = self.open.insert(req.id, (req.clone(), task)) {
            old.abort();
        }
    }

    /// Stop a stream and return the request that opened it.
    fn cancel(&mut self, id: Uuid) -> Option<Frame> {
        let (req, task) = self.open.remove(&id)?;
        task.abort();
        Some(req)
    }

    pub(crate) fn len(&self) -> usize {
        self.open.len()
    }

    fn abort_all(&mut self) {
        for (_, (_, task)) in self.open.drain() {
            task.abort();
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, auth: AuthUser, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state, auth.user.id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_CHANNEL_CAPACITY);
    let mut streams = Streams::default();

    let welcome = Frame::request("session:connected", Data::new())
        .with_data("client_id", client_id.to_string())
        .with_data("user_id", user_id.to_string());
    if send_frames(&mut socket, std::slice::from_ref(&welcome)).await.is_err() {
        return;
    }

    info!(%client_id, %user_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&state, &mut streams, client_id, user_id, &client_tx, &text).await;
                        if send_frames(&mut socket, &replies).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frames(&mut socket, std::slice::from_ref(&frame)).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(%client_id, open_streams = streams.len(), "ws: client disconnected");
    streams.abort_all();
}

/// Send frames in order, stopping at the first failed send.
async fn send_frames<S>(sink: &mut S, frames: &[Frame]) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
{
    for frame in frames {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "ws: frame encode failed");
                continue;
            }
        };
        sink.send(Message::Text(json.into())).await?;
    }
    Ok(())
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the
/// sender. Streamed items arrive later on `client_tx`.
pub(crate) async fn process_inbound_text(
    state: &AppState,
    streams: &mut Streams,
    client_id: Uuid,
    user_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let mut req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };
    req.from = Some(user_id.to_string());

    if req.status == Status::Cancel {
        return handle_cancel(streams, client_id, &req);
    }

    info!(%client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    let prefix = req.prefix();
    let result = match prefix {
        "query" => handle_query(state, client_tx, &req),
        "view" => handle_view(state, client_tx, &req).await,
        _ => match ModelKind::from_syscall_prefix(prefix) {
            Some(ModelKind::Game) => handle_record::<Game>(&state.data, &req).await,
            Some(ModelKind::Location) => handle_record::<Location>(&state.data, &req).await,
            Some(ModelKind::GameLocation) => handle_record::<GameLocation>(&state.data, &req).await,
            None => Err(req.error(format!("unknown prefix: {prefix}"))),
        },
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Ok(Outcome::Stream(task)) => {
            streams.insert(&req, task);
            vec![]
        }
        Err(err_frame) => vec![err_frame],
    }
}

fn handle_cancel(streams: &mut Streams, client_id: Uuid, req: &Frame) -> Vec<Frame> {
    let Some(target) = req.parent_id else {
        return vec![req.error("cancel requires parent_id")];
    };
    match streams.cancel(target) {
        Some(original) => {
            info!(%client_id, id = %target, syscall = %original.syscall, "ws: stream cancelled");
            vec![original.done()]
        }
        None => vec![req.error(format!("no open stream: {target}"))],
    }
}

// =============================================================================
// RECORD HANDLERS
// =============================================================================

async fn handle_record<M>(client: &DataClient, req: &Frame) -> Result<Outcome, Frame>
where
    M: Model + Serialize,
    M::Input: DeserializeOwned,
{
    let model = client.model::<M>();
    match req.op() {
        "create" => {
            let payload = serde_json::Value::Object(req.data.clone().into_iter().collect());
            let input: M::Input =
                serde_json::from_value(payload).map_err(|e| req.error(format!("invalid {} input: {e}", M::KIND)))?;

            let record = model.create(input).await.map_err(|e| req.error_from(&e))?;
            let record = serde_json::to_value(&record).map_err(|e| req.error(format!("encode failed: {e}")))?;

            let mut data = Data::new();
            data.insert("record".into(), record);
            Ok(Outcome::Reply(data))
        }
        "delete" => {
            let Some(id) = req.uuid_field("id") else {
                return Err(req.error("id required"));
            };
            model.delete(id).await.map_err(|e| req.error_from(&e))?;
            let mut data = Data::new();
            data.insert("id".into(), serde_json::json!(id));
            Ok(Outcome::Reply(data))
        }
        op => Err(req.error(format!("unknown {} op: {op}", M::KIND.syscall_prefix()))),
    }
}

// =============================================================================
// LIVE QUERY HANDLERS
// =============================================================================

fn handle_query(state: &AppState, client_tx: &mpsc::Sender<Frame>, req: &Frame) -> Result<Outcome, Frame> {
    if req.op() != "observe" {
        return Err(req.error(format!("unknown query op: {}", req.op())));
    }
    let Some(kind) = req.str_field("model").and_then(ModelKind::from_name) else {
        return Err(req.error("model required: Game, Location or GameLocation"));
    };
    let paths: Vec<String> = match req.data.get("selectionSet") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| req.error(format!("selectionSet must be an array of strings: {e}")))?,
    };
    let subscription = match kind {
        ModelKind::Game => state.data.game().observe_query(&paths),
        ModelKind::Location => state.data.location().observe_query(&paths),
        ModelKind::GameLocation => state.data.game_location().observe_query(&paths),
    };
    let mut subscription = subscription.map_err(|e| req.error_from(&e))?;
    let tx = client_tx.clone();
    let req = req.clone();
    let task = tokio::spawn(async move {
        while let Some(snapshot) = subscription.next().await {
            let mut data = Data::new();
            data.insert("items".into(), serde_json::Value::Array(snapshot.items));
            data.insert("isSynced".into(), serde_json::Value::Bool(snapshot.is_synced));
            if tx.send(req.item(data)).await.is_err() {
                break;
            }
        }
    });
    Ok(Outcome::Stream(task))
}

async fn handle_view(state: &AppState, client_tx: &mpsc::Sender<Frame>, req: &Frame) -> Result<Outcome, Frame> {
    let Some(view) = req.str_field("view").and_then(ListKind::from_name) else {
        return Err(req.error("view required: games or locations"));
    };

    match req.op() {
        "subscribe" => match view {
            ListKind::Games => stream_view::<GameItem>(&state.data, client_tx, req),
            ListKind::Locations => stream_view::<LocationItem>(&state.data, client_tx, req),
        },
        "delete" => {
            let Some(id) = req.uuid_field("id") else {
                return Err(req.error("id required"));
            };
            let deleted = match view {
                ListKind::Games => ListView::<GameItem>::delete(&state.data, id).await,
                ListKind::Locations => ListView::<LocationItem>::delete(&state.data, id).await,
            };
            deleted.map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Done)
        }
        op => Err(req.error(format!("unknown view op: {op}"))),
    }
}

/// Mount a list view and stream its rendered items on every snapshot.
fn stream_view<T: ListItem>(client: &DataClient, client_tx: &mpsc::Sender<Frame>, req: &Frame) -> Result<Outcome, Frame> {
    let mut view = ListView::<T>::mount(client).map_err(|e| req.error_from(&e))?;
    let tx = client_tx.clone();
    let req = req.clone();
    let task = tokio::spawn(async move {
        loop {
            match view.next_update().await {
                Ok(true) => {
                    let mut data = Data::new();
                    data.insert("html".into(), serde_json::Value::String(view.render_items()));
                    data.insert("count".into(), serde_json::json!(view.items().len()));
                    if tx.send(req.item(data)).await.is_err() {
                        break;
                    }
                }
                Ok(false) => break,
                Err(e) => warn!(model = %T::KIND, error = %e, "ws: view snapshot did not decode"),
            }
        }
    });
    Ok(Outcome::Stream(task))
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
