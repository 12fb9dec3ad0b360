use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;

use crate::models::error::GameError;
use crate::state::AppState;

mod game;
mod session;

pub fn create_routes(state: AppState) -> Router {
    Router::new().nest(
        "/api/session",
        session::routes(state.clone()).merge(game::routes(state)),
    )
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = match &self {
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::WrongPhase(_) | GameError::NameConflict(_) | GameError::AlreadyResolved(_) => {
                StatusCode::CONFLICT
            }
            GameError::Unauthorized => StatusCode::FORBIDDEN,
            GameError::InvalidTarget(_)
            | GameError::RepeatTarget
            | GameError::ConfigInvalid(_)
            | GameError::InvalidName(_)
            | GameError::ActionNotAllowed(_) => StatusCode::BAD_REQUEST,
            GameError::CodeSpaceExhausted => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
