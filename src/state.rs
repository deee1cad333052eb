use std::sync::Arc;

use sqlx::SqlitePool;

use players_core::{PlayerService, SystemClock};
use players_db::{SqliteOutboxStore, SqlitePlayerStore, SqliteStatusEventStore, SqliteUnitOfWork};

use crate::config::Config;

pub type Service = PlayerService<SqliteUnitOfWork>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub players: Arc<Service>,
}

impl AppState {
    pub fn new(service: Service) -> Self {
        Self {
            players: Arc::new(service),
        }
    }

    /// Wire the SQLite stores into a player service as `config` asks.
    pub fn from_pool(pool: SqlitePool, config: &Config) -> Self {
        let mut service = PlayerService::new(
            Arc::new(SqliteUnitOfWork::new(pool.clone())),
            Arc::new(SqlitePlayerStore::new(pool.clone())),
            Arc::new(SqliteStatusEventStore::new(pool.clone())),
            Arc::new(SystemClock),
        );
        if config.outbox_enabled {
            service = service.with_outbox(Arc::new(SqliteOutboxStore::new(pool)));
        }
        if let Some(limit) = config.transaction_timeout {
            service = service.with_transaction_timeout(limit);
        }
        Self::new(service)
    }
}
