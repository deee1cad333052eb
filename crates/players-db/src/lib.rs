//! Players DB - SQLite implementation of the storage ports.

pub mod event_store;
pub mod outbox_store;
pub mod player_store;
pub mod unit_of_work;

pub use event_store::SqliteStatusEventStore;
pub use outbox_store::SqliteOutboxStore;
pub use player_store::SqlitePlayerStore;
pub use unit_of_work::SqliteUnitOfWork;

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use players_core::{Session, StorageError};

/// Transaction handle the SQLite stores bind to.
pub type SqliteTx = sqlx::Transaction<'static, Sqlite>;

/// Initialize database connection pool with recommended pragmas.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .synchronous(SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
}

/// Run database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../migrations/001_create_players.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

/// The connection a store call runs on: a fresh one from the pool, or the
/// caller's open transaction.
pub(crate) enum Conn<'a> {
    Pooled(PoolConnection<Sqlite>),
    Tx(&'a mut SqliteConnection),
}

impl Deref for Conn<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        match self {
            Conn::Pooled(conn) => conn,
            Conn::Tx(conn) => conn,
        }
    }
}

impl DerefMut for Conn<'_> {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        match self {
            Conn::Pooled(conn) => conn,
            Conn::Tx(conn) => conn,
        }
    }
}

pub(crate) async fn connection<'a>(
    pool: &SqlitePool,
    session: Session<'a, SqliteTx>,
) -> Result<Conn<'a>, StorageError> {
    match session {
        Session::Detached => Ok(Conn::Pooled(pool.acquire().await.map_err(storage_error)?)),
        Session::Bound(tx) => Ok(Conn::Tx(&mut **tx)),
    }
}

/// SQLITE_BUSY and SQLITE_LOCKED, including their extended codes.
fn is_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, 5 | 6))
}

/// Translate a sqlx error into the storage taxonomy.
pub(crate) fn storage_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StorageError::DuplicateKey(db.message().to_string());
        }
        if is_contention(db.code().as_deref()) {
            return StorageError::Conflict(db.message().to_string());
        }
    }
    StorageError::Database(err.to_string())
}

pub(crate) fn corrupt(what: impl std::fmt::Display) -> StorageError {
    StorageError::Corrupt(what.to_string())
}
