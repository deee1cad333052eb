use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use players_core::{ActorType, Session, Status, StatusEvent, StatusEventStore, StorageError};

use crate::{connection, corrupt, storage_error, SqliteTx};

#[derive(Debug, sqlx::FromRow)]
struct StatusEventRow {
    id: Uuid,
    player_id: Uuid,
    from_status: i16,
    to_status: i16,
    reason: String,
    actor_type: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<StatusEventRow> for StatusEvent {
    type Error = StorageError;

    fn try_from(row: StatusEventRow) -> Result<Self, StorageError> {
        let status = |code: i16| {
            Status::from_code(code)
                .ok_or_else(|| corrupt(format!("status event {}: unknown status code {code}", row.id)))
        };
        Ok(StatusEvent {
            id: row.id,
            player_id: row.player_id,
            from: status(row.from_status)?,
            to: status(row.to_status)?,
            actor: ActorType::from_code(row.actor_type).ok_or_else(|| {
                corrupt(format!(
                    "status event {}: unknown actor code {}",
                    row.id, row.actor_type
                ))
            })?,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

/// SQLite implementation of StatusEventStore.
#[derive(Clone)]
pub struct SqliteStatusEventStore {
    pool: SqlitePool,
}

impl SqliteStatusEventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Status history of one player, oldest first.
    pub async fn list_for_player(&self, player_id: Uuid) -> Result<Vec<StatusEvent>, StorageError> {
        let rows = sqlx::query_as::<_, StatusEventRow>(
            r#"
            SELECT id, player_id, from_status, to_status, reason, actor_type, created_at
            FROM player_status_events
            WHERE player_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(StatusEvent::try_from).collect()
    }
}

#[async_trait]
impl StatusEventStore<SqliteTx> for SqliteStatusEventStore {
    async fn append(
        &self,
        session: Session<'_, SqliteTx>,
        event: &StatusEvent,
    ) -> Result<(), StorageError> {
        let mut conn = connection(&self.pool, session).await?;

        sqlx::query(
            r#"
            INSERT INTO player_status_events
                (id, player_id, from_status, to_status, reason, actor_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id)
        .bind(event.player_id)
        .bind(event.from.code())
        .bind(event.to.code())
        .bind(&event.reason)
        .bind(event.actor.code())
        .bind(event.created_at)
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;

        Ok(())
    }
}
