pub mod config;
pub mod models;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use models::{ApiError, ChangeStatusRequest, CreatePlayerRequest, PlayerResponse};
pub use players_db::{init_pool, run_migrations};
pub use routes::create_router;
pub use state::AppState;
