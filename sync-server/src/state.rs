//! Application state
//!
//! Holds the shared handles every request needs: configuration, the
//! store, the commerce bridge, and the reconciliation engine. `Clone` is
//! shallow (Arc handles).

use std::sync::Arc;

use sqlx::PgPool;

use crate::commerce::{CommerceApi, CommerceClient};
use crate::config::Config;
use crate::store::{PgStore, SyncStore};
use crate::sync::SyncEngine;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SyncStore>,
    pub commerce: Arc<dyn CommerceApi>,
    pub engine: SyncEngine,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations, and wire up the engine
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let store: Arc<dyn SyncStore> = Arc::new(PgStore::new(pool));
        let commerce: Arc<dyn CommerceApi> = Arc::new(CommerceClient::new(
            &config.commerce_base_url,
            &config.commerce_access_token,
        )?);

        Ok(Self::with_parts(config.clone(), store, commerce))
    }

    /// Assemble state from pre-built parts (tests plug in `MemStore` and
    /// a commerce mock here)
    pub fn with_parts(
        config: Config,
        store: Arc<dyn SyncStore>,
        commerce: Arc<dyn CommerceApi>,
    ) -> Self {
        let engine = SyncEngine::new(store.clone(), commerce.clone());
        Self {
            config,
            store,
            commerce,
            engine,
        }
    }
}
