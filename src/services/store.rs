//! Record store — per-kind list/create/delete over Postgres.
//!
//! DESIGN
//! ======
//! `DataStore` is the seam between the data client and persistence. The
//! Postgres implementation maps each kind to one table. The join table
//! carries no foreign keys: deleting a game or location leaves its
//! `game_locations` rows in place, and readers see the missing side as
//! `null`.
//!
//! Lists are ordered by `created_at, id` so snapshots are stable between
//! pushes.

use sqlx::PgPool;
use uuid::Uuid;

use crate::model::{Game, GameLocation, Location, ModelKind, NewGame, NewGameLocation, NewLocation};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ModelKind, id: Uuid },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl crate::frame::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
            Self::Encoding(_) => "E_ENCODING",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    async fn list_games(&self) -> Result<Vec<Game>, StoreError>;
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError>;
    async fn list_game_locations(&self) -> Result<Vec<GameLocation>, StoreError>;

    async fn create_game(&self, input: NewGame) -> Result<Game, StoreError>;
    async fn create_location(&self, input: NewLocation) -> Result<Location, StoreError>;
    async fn create_game_location(&self, input: NewGameLocation) -> Result<GameLocation, StoreError>;

    /// Remove one record by id. Fails with `NotFound` if nothing was deleted.
    async fn delete(&self, kind: ModelKind, id: Uuid) -> Result<(), StoreError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgDataStore {
    pool: PgPool,
}

impl PgDataStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn table_name(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Game => "games",
        ModelKind::Location => "locations",
        ModelKind::GameLocation => "game_locations",
    }
}

#[async_trait::async_trait]
impl DataStore for PgDataStore {
    async fn list_games(&self) -> Result<Vec<Game>, StoreError> {
        let rows = sqlx::query_as::<_, Game>(
            "SELECT id, name, description, created_at, updated_at FROM games ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let rows =
            sqlx::query_as::<_, Location>("SELECT id, name, created_at, updated_at FROM locations ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn list_game_locations(&self) -> Result<Vec<GameLocation>, StoreError> {
        let rows = sqlx::query_as::<_, GameLocation>(
            "SELECT id, game_id, location_id, created_at, updated_at FROM game_locations ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_game(&self, input: NewGame) -> Result<Game, StoreError> {
        let row = sqlx::query_as::<_, Game>(
            "INSERT INTO games (id, name, description) VALUES ($1, $2, $3)
             RETURNING id, name, description, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_location(&self, input: NewLocation) -> Result<Location, StoreError> {
        let row = sqlx::query_as::<_, Location>(
            "INSERT INTO locations (id, name) VALUES ($1, $2)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_game_location(&self, input: NewGameLocation) -> Result<GameLocation, StoreError> {
        let row = sqlx::query_as::<_, GameLocation>(
            "INSERT INTO game_locations (id, game_id, location_id) VALUES ($1, $2, $3)
             RETURNING id, game_id, location_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(input.game_id)
        .bind(input.location_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, kind: ModelKind, id: Uuid) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table_name(kind));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind, id });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
