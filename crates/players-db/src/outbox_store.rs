use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use players_core::{OutboxMessage, OutboxStore, Session, StorageError};

use crate::{connection, storage_error, SqliteTx};

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: Uuid,
    aggregate: String,
    aggregate_id: Uuid,
    #[sqlx(rename = "type")]
    message_type: String,
    key: String,
    payload: Vec<u8>,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl From<OutboxRow> for OutboxMessage {
    fn from(row: OutboxRow) -> Self {
        OutboxMessage {
            id: row.id,
            aggregate: row.aggregate,
            aggregate_id: row.aggregate_id,
            message_type: row.message_type,
            key: row.key,
            payload: row.payload,
            created_at: row.created_at,
            published_at: row.published_at,
        }
    }
}

/// SQLite implementation of OutboxStore.
///
/// Only stages messages. Publishing and setting `published_at` belong to the
/// relay that reads this table.
#[derive(Clone)]
pub struct SqliteOutboxStore {
    pool: SqlitePool,
}

impl SqliteOutboxStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Staged messages not yet relayed, oldest first.
    pub async fn unpublished(&self, limit: i64) -> Result<Vec<OutboxMessage>, StorageError> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            SELECT id, aggregate, aggregate_id, type, key, payload, created_at, published_at
            FROM outbox
            WHERE published_at IS NULL
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(OutboxMessage::from).collect())
    }
}

#[async_trait]
impl OutboxStore<SqliteTx> for SqliteOutboxStore {
    async fn enqueue(
        &self,
        session: Session<'_, SqliteTx>,
        message: &OutboxMessage,
    ) -> Result<(), StorageError> {
        let mut conn = connection(&self.pool, session).await?;

        sqlx::query(
            r#"
            INSERT INTO outbox (id, aggregate, aggregate_id, type, key, payload, created_at, published_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(message.id)
        .bind(&message.aggregate)
        .bind(message.aggregate_id)
        .bind(&message.message_type)
        .bind(&message.key)
        .bind(&message.payload)
        .bind(message.created_at)
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;

        tracing::debug!(
            message_id = %message.id,
            message_type = %message.message_type,
            "Staged outbox message"
        );
        Ok(())
    }
}
