//! Data client — typed create/delete/observe per record kind.
//!
//! DESIGN
//! ======
//! `DataClient` pairs a `DataStore` with the `LiveHub`. Each record kind
//! gets a `ModelClient<M>` (`client.game()`, `client.location()`,
//! `client.game_location()`) exposing `create`, `delete` and
//! `observe_query`. Mutations write through the store and then bump the
//! hub counter for that kind, which is what makes live queries re-run.
//!
//! Nothing here cascades: deleting a game leaves its join rows behind.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::model::{Game, GameLocation, Location, ModelKind, NewGame, NewGameLocation, NewLocation};
use crate::selection::{SelectionError, SelectionSet};
use crate::services::live::{LiveHub, Snapshot, Subscription, load_snapshot};
use crate::services::store::{DataStore, StoreError};

// =============================================================================
// MODEL TRAIT
// =============================================================================

/// A record kind the client can create.
#[async_trait::async_trait]
pub trait Model: Sized + Send + Sync + 'static {
    const KIND: ModelKind;
    type Input: Send + 'static;

    async fn insert(store: &dyn DataStore, input: Self::Input) -> Result<Self, StoreError>;

    fn id(&self) -> Uuid;
}

#[async_trait::async_trait]
impl Model for Game {
    const KIND: ModelKind = ModelKind::Game;
    type Input = NewGame;

    async fn insert(store: &dyn DataStore, input: NewGame) -> Result<Self, StoreError> {
        store.create_game(input).await
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[async_trait::async_trait]
impl Model for Location {
    const KIND: ModelKind = ModelKind::Location;
    type Input = NewLocation;

    async fn insert(store: &dyn DataStore, input: NewLocation) -> Result<Self, StoreError> {
        store.create_location(input).await
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[async_trait::async_trait]
impl Model for GameLocation {
    const KIND: ModelKind = ModelKind::GameLocation;
    type Input = NewGameLocation;

    async fn insert(store: &dyn DataStore, input: NewGameLocation) -> Result<Self, StoreError> {
        store.create_game_location(input).await
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct DataClient {
    store: Arc<dyn DataStore>,
    hub: LiveHub,
}

impl DataClient {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, hub: LiveHub) -> Self {
        Self { store, hub }
    }

    /// Client for a kind picked by type, e.g. from a generic frame handler.
    #[must_use]
    pub fn model<M: Model>(&self) -> ModelClient<M> {
        ModelClient::new(self.clone())
    }

    #[must_use]
    pub fn game(&self) -> ModelClient<Game> {
        self.model()
    }

    #[must_use]
    pub fn location(&self) -> ModelClient<Location> {
        self.model()
    }

    #[must_use]
    pub fn game_location(&self) -> ModelClient<GameLocation> {
        self.model()
    }

    /// Delete by kind chosen at runtime (websocket `*:delete` frames).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the record is missing or the delete fails.
    pub async fn delete(&self, kind: ModelKind, id: Uuid) -> Result<(), StoreError> {
        self.store.delete(kind, id).await?;
        self.hub.notify(kind);
        info!(model = %kind, %id, version = self.hub.version(kind), "data: deleted");
        Ok(())
    }

    /// Start a live query with an already-parsed selection.
    #[must_use]
    pub fn observe(&self, selection: SelectionSet) -> Subscription {
        self.hub.observe(Arc::clone(&self.store), selection)
    }

    /// One-shot read of the current result set for `selection`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if any table read fails.
    pub async fn snapshot(&self, selection: &SelectionSet) -> Result<Snapshot, StoreError> {
        load_snapshot(self.store.as_ref(), selection).await
    }
}

// =============================================================================
// MODEL CLIENT
// =============================================================================

pub struct ModelClient<M> {
    client: DataClient,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> ModelClient<M> {
    fn new(client: DataClient) -> Self {
        Self { client, _model: PhantomData }
    }

    /// Create one record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the insert fails.
    pub async fn create(&self, input: M::Input) -> Result<M, StoreError> {
        let record = M::insert(self.client.store.as_ref(), input).await?;
        self.client.hub.notify(M::KIND);
        info!(model = %M::KIND, id = %record.id(), version = self.client.hub.version(M::KIND), "data: created");
        Ok(record)
    }

    /// Remove one record by id. Related join rows are left in place.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the record is missing or the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.client.delete(M::KIND, id).await
    }

    /// Subscribe to every record of this kind, projected through
    /// `selection_set`. An empty selection set returns all scalar fields.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if a path is invalid for this kind.
    pub fn observe_query<S: AsRef<str>>(&self, selection_set: &[S]) -> Result<Subscription, SelectionError> {
        let selection = SelectionSet::parse(M::KIND, selection_set)?;
        Ok(self.client.observe(selection))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
