use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use players_core::{
    Address, Gender, Metadata, Player, PlayerSnapshot, PlayerStore, Session, Status, StorageError,
};

use crate::{connection, corrupt, storage_error, SqliteTx};

const SELECT_PLAYER: &str = r#"
    SELECT id, email, phone, status, status_reason, country_code, locale, time_zone,
           first_name, last_name, birth_date, gender, registration_ip, registered_at,
           last_login_at, metadata, version, created_at, updated_at
    FROM players
"#;

/// A `players` row as stored.
#[derive(Debug, sqlx::FromRow)]
struct PlayerRow {
    id: Uuid,
    email: String,
    phone: Option<String>,
    status: i16,
    status_reason: Option<String>,
    country_code: Option<String>,
    locale: Option<String>,
    time_zone: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    birth_date: Option<NaiveDate>,
    gender: i16,
    registration_ip: Option<String>,
    registered_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    metadata: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlayerRow> for Player {
    type Error = StorageError;

    fn try_from(row: PlayerRow) -> Result<Self, StorageError> {
        let id = row.id;
        let status = Status::from_code(row.status)
            .ok_or_else(|| corrupt(format!("player {id}: unknown status code {}", row.status)))?;
        let gender = Gender::from_code(row.gender)
            .ok_or_else(|| corrupt(format!("player {id}: unknown gender code {}", row.gender)))?;
        let registration_ip = row
            .registration_ip
            .map(|ip| {
                ip.parse::<IpAddr>()
                    .map_err(|e| corrupt(format!("player {id}: registration_ip {ip}: {e}")))
            })
            .transpose()?;
        let metadata: Metadata = serde_json::from_str(&row.metadata)
            .map_err(|e| corrupt(format!("player {id}: metadata: {e}")))?;

        Player::restore(PlayerSnapshot {
            id,
            email: row.email,
            phone: row.phone,
            status,
            status_reason: row.status_reason,
            address: Address {
                country_code: row.country_code,
                locale: row.locale,
                time_zone: row.time_zone,
            },
            first_name: row.first_name,
            last_name: row.last_name,
            birth_date: row.birth_date,
            gender,
            registration_ip,
            registered_at: row.registered_at,
            last_login_at: row.last_login_at,
            metadata,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .map_err(|e| corrupt(format!("player {id}: {e}")))
    }
}

fn encode_metadata(player: &Player) -> Result<String, StorageError> {
    serde_json::to_string(player.metadata())
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// SQLite implementation of PlayerStore.
#[derive(Clone)]
pub struct SqlitePlayerStore {
    pool: SqlitePool,
}

impl SqlitePlayerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerStore<SqliteTx> for SqlitePlayerStore {
    async fn get_by_id(&self, session: Session<'_, SqliteTx>, id: Uuid) -> Result<Player, StorageError> {
        let mut conn = connection(&self.pool, session).await?;
        let sql = format!("{SELECT_PLAYER} WHERE id = ?");

        let row = sqlx::query_as::<_, PlayerRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(storage_error)?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StorageError::NotFound(format!("player {id}"))),
        }
    }

    async fn get_by_email(
        &self,
        session: Session<'_, SqliteTx>,
        email: &str,
    ) -> Result<Player, StorageError> {
        let mut conn = connection(&self.pool, session).await?;
        let sql = format!("{SELECT_PLAYER} WHERE email = ?");

        let row = sqlx::query_as::<_, PlayerRow>(&sql)
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
            .map_err(storage_error)?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StorageError::NotFound(format!("player with email {email}"))),
        }
    }

    async fn create(&self, session: Session<'_, SqliteTx>, player: &Player) -> Result<(), StorageError> {
        let metadata = encode_metadata(player)?;
        let mut conn = connection(&self.pool, session).await?;

        sqlx::query(
            r#"
            INSERT INTO players (
                id, email, phone, status, status_reason, country_code, locale, time_zone,
                first_name, last_name, birth_date, gender, registration_ip, registered_at,
                last_login_at, metadata, version, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(player.id())
        .bind(player.email())
        .bind(player.phone())
        .bind(player.status().code())
        .bind(player.status_reason())
        .bind(player.address().country_code.as_deref())
        .bind(player.address().locale.as_deref())
        .bind(player.address().time_zone.as_deref())
        .bind(player.first_name())
        .bind(player.last_name())
        .bind(player.birth_date())
        .bind(player.gender().code())
        .bind(player.registration_ip().map(|ip| ip.to_string()))
        .bind(player.registered_at())
        .bind(player.last_login_at())
        .bind(metadata)
        .bind(player.version())
        .bind(player.created_at())
        .bind(player.updated_at())
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;

        tracing::debug!(player_id = %player.id(), "Inserted player row");
        Ok(())
    }

    async fn update(&self, session: Session<'_, SqliteTx>, player: &Player) -> Result<(), StorageError> {
        let metadata = encode_metadata(player)?;
        let expected = player.loaded_version();
        let mut conn = connection(&self.pool, session).await?;

        let result = sqlx::query(
            r#"
            UPDATE players
            SET phone = ?, status = ?, status_reason = ?, country_code = ?,
                locale = ?, time_zone = ?, first_name = ?, last_name = ?, birth_date = ?,
                gender = ?, registration_ip = ?, registered_at = ?, last_login_at = ?,
                metadata = ?, version = ?, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(player.phone())
        .bind(player.status().code())
        .bind(player.status_reason())
        .bind(player.address().country_code.as_deref())
        .bind(player.address().locale.as_deref())
        .bind(player.address().time_zone.as_deref())
        .bind(player.first_name())
        .bind(player.last_name())
        .bind(player.birth_date())
        .bind(player.gender().code())
        .bind(player.registration_ip().map(|ip| ip.to_string()))
        .bind(player.registered_at())
        .bind(player.last_login_at())
        .bind(metadata)
        .bind(player.version())
        .bind(player.updated_at())
        .bind(player.id())
        .bind(expected)
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::VersionConflict {
                id: player.id(),
                expected,
            });
        }
        Ok(())
    }
}
