//! Live queries — push full snapshots whenever underlying data changes.
//!
//! DESIGN
//! ======
//! The hub keeps one `watch` counter per record kind. Every successful
//! mutation bumps the counter of the kind it touched. A subscription is a
//! pump task that loads a snapshot, sends it, then waits until any kind its
//! selection depends on changes, and repeats. Snapshots always carry the
//! complete result set; subscribers replace their state wholesale.
//!
//! LIFECYCLE
//! =========
//! Counters are marked seen before each load, so a mutation that lands
//! while a snapshot is being read triggers one more reload instead of being
//! lost. Dropping the `Subscription` aborts the pump task. A failed load is
//! logged and the subscription waits for the next change rather than ending.

use std::collections::{BTreeSet, HashMap};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::ModelKind;
use crate::selection::{RecordGraph, SelectionSet};
use crate::services::store::{DataStore, StoreError};

pub const DEFAULT_LIVE_CHANNEL_CAPACITY: usize = 16;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One complete result set of a live query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub items: Vec<serde_json::Value>,
    /// Always `true`: the server reads the authoritative store directly.
    pub is_synced: bool,
}

// =============================================================================
// HUB
// =============================================================================

#[derive(Clone)]
pub struct LiveHub {
    counters: Arc<HashMap<ModelKind, watch::Sender<u64>>>,
    capacity: usize,
}

impl LiveHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let counters = ModelKind::ALL
            .into_iter()
            .map(|kind| (kind, watch::channel(0).0))
            .collect();
        Self { counters: Arc::new(counters), capacity: capacity.max(1) }
    }

    /// Record that `kind` changed. Wakes every subscription depending on it.
    pub fn notify(&self, kind: ModelKind) {
        if let Some(tx) = self.counters.get(&kind) {
            tx.send_modify(|version| *version = version.wrapping_add(1));
        }
    }

    /// Current change counter for `kind`.
    #[must_use]
    pub fn version(&self, kind: ModelKind) -> u64 {
        self.counters.get(&kind).map_or(0, |tx| *tx.borrow())
    }

    fn watchers(&self, kinds: &BTreeSet<ModelKind>) -> Vec<watch::Receiver<u64>> {
        kinds
            .iter()
            .filter_map(|kind| self.counters.get(kind).map(watch::Sender::subscribe))
            .collect()
    }

    /// Start a live query. The first snapshot is sent immediately.
    #[must_use]
    pub fn observe(&self, store: Arc<dyn DataStore>, selection: SelectionSet) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let watchers = self.watchers(&selection.dependencies());
        let task = tokio::spawn(pump(store, selection, watchers, tx));
        Subscription { rx, task }
    }
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_CHANNEL_CAPACITY)
    }
}

async fn pump(
    store: Arc<dyn DataStore>,
    selection: SelectionSet,
    mut watchers: Vec<watch::Receiver<u64>>,
    tx: mpsc::Sender<Snapshot>,
) {
    let root = selection.root();
    loop {
        for watcher in &mut watchers {
            watcher.borrow_and_update();
        }

        match load_snapshot(store.as_ref(), &selection).await {
            Ok(snapshot) => {
                debug!(model = %root, items = snapshot.items.len(), "live: push snapshot");
                if tx.send(snapshot).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(model = %root, error = %e, "live: snapshot load failed"),
        }

        if watchers.is_empty() {
            break;
        }
        let changed = watchers.iter_mut().map(|w| Box::pin(w.changed()));
        let (result, _, _) = futures::future::select_all(changed).await;
        if result.is_err() {
            break;
        }
    }
}

/// Load every table `selection` reads and project the root records.
///
/// # Errors
///
/// Returns a [`StoreError`] if any table read fails.
pub async fn load_snapshot(store: &dyn DataStore, selection: &SelectionSet) -> Result<Snapshot, StoreError> {
    let mut graph = RecordGraph::new();
    for kind in selection.dependencies() {
        match kind {
            ModelKind::Game => graph.insert_table(kind, &store.list_games().await?)?,
            ModelKind::Location => graph.insert_table(kind, &store.list_locations().await?)?,
            ModelKind::GameLocation => graph.insert_table(kind, &store.list_game_locations().await?)?,
        }
    }
    Ok(Snapshot { items: selection.project_all(&graph), is_synced: true })
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle to a running live query. Dropping it stops the query.
pub struct Subscription {
    rx: mpsc::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Wait for the next snapshot. `None` once the query has stopped.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "live_test.rs"]
mod tests;
