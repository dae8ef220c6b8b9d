//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool (sessions and sign-in codes), the data client
//! (records and live queries), file storage and the parsed configuration.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::client::DataClient;
use crate::services::live::LiveHub;
use crate::services::storage::FileStorage;
use crate::services::store::{DataStore, PgDataStore};

/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub data: DataClient,
    pub storage: FileStorage,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by Postgres for both records and sessions.
    #[must_use]
    pub fn new(pool: PgPool, config: Config) -> Self {
        let store: Arc<dyn DataStore> = Arc::new(PgDataStore::new(pool.clone()));
        Self::with_store(pool, store, config)
    }

    #[must_use]
    pub fn with_store(pool: PgPool, store: Arc<dyn DataStore>, config: Config) -> Self {
        let hub = LiveHub::new(config.live_channel_capacity);
        let storage = FileStorage::new(&config.storage_dir);
        Self { pool, data: DataClient::new(store, hub), storage, config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
