//! Create views — the game and location forms and their submit flows.
//!
//! DESIGN
//! ======
//! Validation happens before any store call: a game needs a name and a
//! description, a location needs a name and at least one selected game.
//!
//! TRADE-OFFS
//! ==========
//! A location is created first, then one join record per selected game.
//! Each join create is its own spawned task and nobody awaits them: the
//! submit flow returns as soon as the location exists. A failed join is
//! logged and otherwise invisible, and nothing is rolled back. Callers that
//! need to observe completion (tests) can await the returned handles.

use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::model::{Game, Location, ModelKind, NewGame, NewGameLocation, NewLocation};
use crate::selection::SelectionSet;
use crate::services::client::DataClient;
use crate::services::store::StoreError;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("{0}")]
    MissingFields(&'static str),
    #[error("invalid game id: {0}")]
    InvalidGameId(String),
    #[error("invalid location")]
    InvalidLocation,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ErrorCode for FormError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) | Self::InvalidGameId(_) => "E_VALIDATION",
            Self::InvalidLocation => "E_INVALID_LOCATION",
            Self::Store(e) => e.error_code(),
            Self::Decode(_) => "E_DECODE",
        }
    }
}

pub const GAME_FIELDS_REQUIRED: &str = "name and description are required!";
pub const LOCATION_FIELDS_REQUIRED: &str = "name and games are required!";

// =============================================================================
// INPUTS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `games` repeats once per selected `<option>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub games: Vec<String>,
}

impl GameFormInput {
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] if either field is empty.
    pub fn validate(self) -> Result<NewGame, FormError> {
        if self.name.is_empty() || self.description.is_empty() {
            return Err(FormError::MissingFields(GAME_FIELDS_REQUIRED));
        }
        Ok(NewGame { name: self.name, description: self.description })
    }
}

impl LocationFormInput {
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] if the name is empty or no game
    /// is selected, [`FormError::InvalidGameId`] if a selection is not a UUID.
    pub fn validate(self) -> Result<(NewLocation, Vec<Uuid>), FormError> {
        if self.name.is_empty() || self.games.is_empty() {
            return Err(FormError::MissingFields(LOCATION_FIELDS_REQUIRED));
        }
        let game_ids = self
            .games
            .iter()
            .map(|raw| raw.parse::<Uuid>().map_err(|_| FormError::InvalidGameId(raw.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((NewLocation { name: self.name }, game_ids))
    }
}

// =============================================================================
// SUBMIT
// =============================================================================

/// Validate and create a game.
///
/// # Errors
///
/// Returns a [`FormError`] on validation failure (no store call is made) or
/// if the create fails.
pub async fn submit_game(client: &DataClient, input: GameFormInput) -> Result<Game, FormError> {
    let new_game = input.validate()?;
    Ok(client.game().create(new_game).await?)
}

/// Result of the location flow. `joins` are the in-flight join creates.
pub struct LocationCreated {
    pub location: Location,
    pub joins: Vec<JoinHandle<()>>,
}

/// Validate, create the location, then fire one join create per game.
///
/// # Errors
///
/// Returns a [`FormError`] on validation failure (no store call is made),
/// if the location create fails, or if it comes back without an id. Join
/// failures are never returned.
pub async fn submit_location(client: &DataClient, input: LocationFormInput) -> Result<LocationCreated, FormError> {
    let (new_location, game_ids) = input.validate()?;

    let location = client.location().create(new_location).await?;
    if location.id.is_nil() {
        error!(?location, "location create returned no id");
        return Err(FormError::InvalidLocation);
    }

    let location_id = location.id;
    let joins = game_ids
        .into_iter()
        .map(|game_id| {
            let client = client.clone();
            tokio::spawn(async move {
                if let Err(e) = client
                    .game_location()
                    .create(NewGameLocation { game_id, location_id })
                    .await
                {
                    error!(%game_id, %location_id, error = %e, "game location create failed");
                }
            })
        })
        .collect::<Vec<_>>();

    info!(%location_id, joins = joins.len(), "location created");
    Ok(LocationCreated { location, joins })
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Game choice in the location form's multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameOption {
    pub id: Uuid,
    pub name: String,
}

/// Current games for the multi-select, read with the default selection.
///
/// # Errors
///
/// Returns a [`FormError`] if the read fails or the snapshot does not decode.
pub async fn load_game_options(client: &DataClient) -> Result<Vec<GameOption>, FormError> {
    let snapshot = client.snapshot(&SelectionSet::scalars(ModelKind::Game)).await?;
    let options = snapshot
        .items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<GameOption>, _>>()?;
    Ok(options)
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
