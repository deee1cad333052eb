use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::models::{
    ApiError, ChangeStatusRequest, ChangeStatusResponse, CreatePlayerRequest, PlayerResponse,
};
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadId(raw.to_string()))
}

/// POST /players - Register a new player.
pub async fn create_player(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlayerRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let player = state.players.create_player(req.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(PlayerResponse::from(&player))).into_response())
}

/// GET /players/{id} - Latest committed state of a player.
pub async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = state.players.get_player(parse_id(&id)?).await?;
    Ok(Json(PlayerResponse::from(&player)))
}

/// POST /players/{id}/status - Move a player to another status.
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<ChangeStatusResponse>, ApiError> {
    let player_id = parse_id(&id)?;
    let Json(req) = payload?;
    let (player, event) = state
        .players
        .change_status(req.into_command(player_id))
        .await?;

    Ok(Json(ChangeStatusResponse {
        player: PlayerResponse::from(&player),
        event,
    }))
}

/// POST /players/{id}/login - Record a login.
pub async fn record_login(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = state.players.record_login(parse_id(&id)?).await?;
    Ok(Json(PlayerResponse::from(&player)))
}
