use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use players_core::{
    ActorType, ChangeStatus, CreatePlayer, Gender, Metadata, Player, PlayerError, Status,
    StatusEvent,
};

/// Request to register a player.
#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub email: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// YYYY-MM-DD
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub country_code: Option<String>,
    pub locale: Option<String>,
    pub time_zone: Option<String>,
    pub registration_ip: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// RFC 3339
    pub registered_at: Option<String>,
}

/// Blank means absent.
fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

impl TryFrom<CreatePlayerRequest> for CreatePlayer {
    type Error = ApiError;

    fn try_from(req: CreatePlayerRequest) -> Result<Self, ApiError> {
        let birth_date = non_blank(req.birth_date)
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|_| ApiError::BadBirthDate(raw))
            })
            .transpose()?;
        let registered_at = non_blank(req.registered_at)
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw.trim())
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|_| ApiError::BadRegisteredAt(raw))
            })
            .transpose()?;

        Ok(CreatePlayer {
            email: req.email,
            phone: req.phone,
            first_name: req.first_name,
            last_name: req.last_name,
            birth_date,
            gender: req.gender,
            country_code: req.country_code,
            locale: req.locale,
            time_zone: req.time_zone,
            registration_ip: req.registration_ip,
            metadata: req.metadata,
            registered_at,
        })
    }
}

/// Request to move a player to another status.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub to_status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub actor: String,
}

impl ChangeStatusRequest {
    pub fn into_command(self, player_id: Uuid) -> ChangeStatus {
        ChangeStatus {
            player_id,
            to_status: self.to_status,
            reason: self.reason,
            actor: parse_actor(&self.actor),
        }
    }
}

/// Lenient actor parsing: anything unrecognized is the system.
pub fn parse_actor(raw: &str) -> ActorType {
    match raw.trim().to_lowercase().as_str() {
        "player" => ActorType::Player,
        "admin" | "administrator" => ActorType::Administrator,
        _ => ActorType::System,
    }
}

/// A player as returned by the API.
#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub status: Status,
    pub status_reason: Option<String>,
    pub country_code: Option<String>,
    pub locale: Option<String>,
    pub time_zone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    pub registration_ip: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Player> for PlayerResponse {
    fn from(player: &Player) -> Self {
        let address = player.address();
        PlayerResponse {
            id: player.id(),
            email: player.email().to_string(),
            phone: player.phone().map(str::to_string),
            status: player.status(),
            status_reason: player.status_reason().map(str::to_string),
            country_code: address.country_code.clone(),
            locale: address.locale.clone(),
            time_zone: address.time_zone.clone(),
            first_name: player.first_name().map(str::to_string),
            last_name: player.last_name().map(str::to_string),
            birth_date: player.birth_date(),
            gender: player.gender(),
            registration_ip: player.registration_ip().map(|ip| ip.to_string()),
            registered_at: player.registered_at(),
            last_login_at: player.last_login_at(),
            metadata: player.metadata().clone(),
            version: player.version(),
            created_at: player.created_at(),
            updated_at: player.updated_at(),
        }
    }
}

/// Response for a status change.
#[derive(Debug, Serialize)]
pub struct ChangeStatusResponse {
    pub player: PlayerResponse,
    pub event: StatusEvent,
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid player id: {0}")]
    BadId(String),

    #[error("invalid request body: {0}")]
    BadJson(String),

    #[error("invalid birth_date, expected YYYY-MM-DD: {0}")]
    BadBirthDate(String),

    #[error("invalid registered_at, expected RFC 3339: {0}")]
    BadRegisteredAt(String),

    #[error(transparent)]
    Player(#[from] PlayerError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadJson(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadId(_) => (StatusCode::BAD_REQUEST, "bad_id"),
            ApiError::BadJson(_) => (StatusCode::BAD_REQUEST, "bad_json"),
            ApiError::BadBirthDate(_) => (StatusCode::BAD_REQUEST, "bad_birth_date"),
            ApiError::BadRegisteredAt(_) => (StatusCode::BAD_REQUEST, "bad_registered_at"),
            ApiError::Player(PlayerError::Validation(_)) => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::Player(PlayerError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Player(PlayerError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Player(PlayerError::Internal(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = match &self {
            ApiError::Player(PlayerError::Internal(detail)) => {
                tracing::error!("Request failed: {}", detail);
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: kind, message })).into_response()
    }
}
