use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::state::AppState;
use crate::{
    models::{error::GameError, night::NightAction},
    services::game_service,
};

#[derive(Debug, Deserialize)]
pub struct NightActionRequest {
    player_id: String,
    #[serde(flatten)]
    action: NightAction,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    voter_id: String,
    target_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HostRequest {
    player_id: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:session_id",
            Router::new()
                // Night
                .route("/night-action", post(night_action_handler))
                .route("/night/status", get(night_status_handler))
                .route("/night/force-end", post(force_end_night_handler))
                // Day
                .route("/voting/start", post(start_voting_handler))
                .route("/voting/vote", post(vote_handler))
                .route("/voting/end", post(end_voting_handler))
                .route("/next-round", post(next_round_handler)),
        )
        .with_state(state)
}

async fn night_action_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<NightActionRequest>,
) -> Result<impl IntoResponse, GameError> {
    let submission =
        game_service::submit_night_action(&state, &session_id, &request.player_id, request.action)
            .await?;
    Ok(Json(submission))
}

async fn night_status_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let completion = game_service::night_status(&state, &session_id).await?;
    Ok(Json(completion))
}

async fn force_end_night_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<HostRequest>,
) -> Result<impl IntoResponse, GameError> {
    let outcome = game_service::force_end_night(&state, &session_id, &request.player_id).await?;
    Ok(Json(outcome))
}

async fn start_voting_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<HostRequest>,
) -> Result<impl IntoResponse, GameError> {
    let view = game_service::start_voting(&state, &session_id, &request.player_id).await?;
    Ok(Json(view))
}

async fn vote_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<impl IntoResponse, GameError> {
    let view =
        game_service::submit_vote(&state, &session_id, &request.voter_id, &request.target_id)
            .await?;
    Ok(Json(view))
}

async fn end_voting_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<HostRequest>,
) -> Result<impl IntoResponse, GameError> {
    let outcome = game_service::end_voting(&state, &session_id, &request.player_id).await?;
    Ok(Json(outcome))
}

async fn next_round_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<HostRequest>,
) -> Result<impl IntoResponse, GameError> {
    let view = game_service::next_round(&state, &session_id, &request.player_id).await?;
    Ok(Json(view))
}
