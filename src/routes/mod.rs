pub mod players;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Player lifecycle
        .route("/players", post(players::create_player))
        .route("/players/{id}", get(players::get_player))
        .route("/players/{id}/status", post(players::change_status))
        .route("/players/{id}/login", post(players::record_login))
        // Health check
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
