//! List views — live-subscribed lists of games and locations.
//!
//! DESIGN
//! ======
//! A `ListView` owns one live query and the latest decoded snapshot. Each
//! snapshot replaces the item list wholesale. `delete` only sends the
//! request; the item disappears when the store change comes back as the next
//! snapshot, so the view never drifts from what the backend reports.
//!
//! Nested join entries whose target record was deleted arrive as `null`
//! and are dropped at render time. The join rows themselves stay in the
//! store.

use leptos::prelude::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::app::render_detached;
use crate::components::cards::{GameCard, LocationCard};
use crate::frame::ErrorCode;
use crate::model::ModelKind;
use crate::selection::{SelectionError, SelectionSet};
use crate::services::client::DataClient;
use crate::services::live::{Snapshot, Subscription};
use crate::services::store::StoreError;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ErrorCode for ViewError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Selection(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Decode(_) => "E_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.retryable())
    }
}

// =============================================================================
// ITEMS
// =============================================================================

/// One row of a list view, decoded from a projected snapshot item.
pub trait ListItem: DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ModelKind;
    const SELECTION: &'static [&'static str];

    fn id(&self) -> Uuid;

    /// The `.item` card for this row, including its delete form.
    fn into_card(self) -> AnyView;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationLink {
    pub location: Option<Named>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameLink {
    pub game: Option<Named>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub locations: Vec<LocationLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub games: Vec<GameLink>,
}

impl GameItem {
    /// Names of locations that still exist.
    #[must_use]
    pub fn location_names(&self) -> Vec<&str> {
        self.locations
            .iter()
            .filter_map(|link| link.location.as_ref())
            .map(|l| l.name.as_str())
            .collect()
    }
}

impl LocationItem {
    /// Names of games that still exist.
    #[must_use]
    pub fn game_names(&self) -> Vec<&str> {
        self.games
            .iter()
            .filter_map(|link| link.game.as_ref())
            .map(|g| g.name.as_str())
            .collect()
    }
}

impl ListItem for GameItem {
    const KIND: ModelKind = ModelKind::Game;
    const SELECTION: &'static [&'static str] = &["id", "name", "description", "locations.location.name"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn into_card(self) -> AnyView {
        view! { <GameCard item=self/> }.into_any()
    }
}

impl ListItem for LocationItem {
    const KIND: ModelKind = ModelKind::Location;
    const SELECTION: &'static [&'static str] = &["id", "name", "games.game.*"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn into_card(self) -> AnyView {
        view! { <LocationCard item=self/> }.into_any()
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// Which list a websocket client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Games,
    Locations,
}

impl ListKind {
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw {
            "games" => Some(Self::Games),
            "locations" => Some(Self::Locations),
            _ => None,
        }
    }
}

pub struct ListView<T> {
    items: Vec<T>,
    subscription: Option<Subscription>,
}

impl<T: ListItem> ListView<T> {
    /// A view with no subscription, fed snapshots by hand.
    #[must_use]
    pub fn detached() -> Self {
        Self { items: Vec::new(), subscription: None }
    }

    /// The selection set every `T` view queries with.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if `T::SELECTION` is invalid for `T::KIND`.
    pub fn selection() -> Result<SelectionSet, SelectionError> {
        SelectionSet::parse(T::KIND, T::SELECTION)
    }

    /// Mount: start the live query for `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if `T::SELECTION` is invalid for `T::KIND`.
    pub fn mount(client: &DataClient) -> Result<Self, SelectionError> {
        Ok(Self { items: Vec::new(), subscription: Some(client.observe(Self::selection()?)) })
    }

    /// A detached view holding the current result set, for one-shot page
    /// renders.
    ///
    /// # Errors
    ///
    /// Returns a [`ViewError`] if the read fails or does not decode.
    pub async fn load(client: &DataClient) -> Result<Self, ViewError> {
        let mut view = Self::detached();
        view.apply(client.snapshot(&Self::selection()?).await?)?;
        Ok(view)
    }

    /// Replace all items with the decoded snapshot. On a decode error the
    /// previous items are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if any snapshot item does not decode as `T`.
    pub fn apply(&mut self, snapshot: Snapshot) -> Result<(), serde_json::Error> {
        let items = snapshot
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        self.items = items;
        Ok(())
    }

    /// Wait for the next snapshot and apply it. `Ok(false)` once the
    /// subscription has ended (or was never started).
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot does not decode.
    pub async fn next_update(&mut self) -> Result<bool, serde_json::Error> {
        let Some(subscription) = self.subscription.as_mut() else {
            return Ok(false);
        };
        let Some(snapshot) = subscription.next_snapshot().await else {
            return Ok(false);
        };
        self.apply(snapshot)?;
        Ok(true)
    }

    /// Ask the backend to delete `id`. Local items are untouched until the
    /// resulting snapshot arrives.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the delete fails.
    pub async fn delete(client: &DataClient, id: Uuid) -> Result<(), StoreError> {
        client.delete(T::KIND, id).await
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The `.items` container contents: one card per snapshot item.
    #[must_use]
    pub fn render_items(&self) -> String {
        let items = self.items.clone();
        render_detached(move || items.into_iter().map(T::into_card).collect::<Vec<_>>())
    }

    /// Hand the current items to a page.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
#[path = "list_test.rs"]
mod tests;
