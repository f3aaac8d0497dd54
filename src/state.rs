use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::tracking::store::{PgTrackingStore, TrackingStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn TrackingStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let store = Arc::new(PgTrackingStore::new(db.clone())) as Arc<dyn TrackingStore>;

        Ok(Self {
            db,
            config,
            store,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        store: Arc<dyn TrackingStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            config,
            store,
            clock,
        }
    }
}
