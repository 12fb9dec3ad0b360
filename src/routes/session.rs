use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    models::{error::GameError, role::RoleConfig},
    services::session_service,
    state::AppState,
    utils::websocket,
};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    host_name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct HostRequest {
    player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleConfigRequest {
    player_id: String,
    config: RoleConfig,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // curl -X POST http://localhost:8080/api/session/create -H 'Content-Type: application/json' -d '{"host_name":"Ann"}'
        .route("/create", post(create_session))
        // curl -X POST http://localhost:8080/api/session/join -H 'Content-Type: application/json' -d '{"code":"AB12CD","name":"Bob"}'
        .route("/join", post(join_session))
        .route("/:session_id/state/:player_id", get(get_session_state))
        .route("/:session_id/config", post(update_role_config))
        .route("/:session_id/start", post(start_game))
        .route("/:session_id/restart", post(restart_game))
        .route("/:session_id/leave/:player_id", post(leave_session))
        // websocat ws://localhost:8080/api/session/{session_id}/ws/{player_id}
        .route("/:session_id/ws/:player_id", get(websocket::handler))
        .with_state(state)
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, GameError> {
    let created = session_service::create_session(&state, &request.host_name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn join_session(
    State(state): State<AppState>,
    Json(request): Json<JoinSessionRequest>,
) -> Result<impl IntoResponse, GameError> {
    let joined = session_service::join_session(&state, &request.code, &request.name).await?;
    Ok(Json(joined))
}

async fn get_session_state(
    State(state): State<AppState>,
    Path((session_id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, GameError> {
    let view = session_service::get_session_view(&state, &session_id, &player_id).await?;
    Ok(Json(view))
}

async fn update_role_config(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<RoleConfigRequest>,
) -> Result<impl IntoResponse, GameError> {
    let view = session_service::update_role_config(
        &state,
        &session_id,
        &request.player_id,
        request.config,
    )
    .await?;
    Ok(Json(view))
}

async fn start_game(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<HostRequest>,
) -> Result<impl IntoResponse, GameError> {
    let view = session_service::start_game(&state, &session_id, &request.player_id).await?;
    Ok(Json(view))
}

async fn restart_game(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<HostRequest>,
) -> Result<impl IntoResponse, GameError> {
    let view = session_service::restart_game(&state, &session_id, &request.player_id).await?;
    Ok(Json(view))
}

async fn leave_session(
    State(state): State<AppState>,
    Path((session_id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, GameError> {
    session_service::leave_session(&state, &session_id, &player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_setup::{setup_test_env, test_state};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_create_session() {
        setup_test_env();
        let app = routes(test_state());

        let (status, body) = send(&app, "POST", "/create", json!({ "host_name": "Ann" })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["session"]["phase"], "lobby");
        assert_eq!(body["session"]["code"].as_str().unwrap().len(), 6);
        assert_eq!(body["player_id"], body["session"]["host_id"]);
    }

    #[tokio::test]
    async fn test_create_session_rejects_blank_name() {
        setup_test_env();
        let app = routes(test_state());

        let (status, body) = send(&app, "POST", "/create", json!({ "host_name": "   " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid name"));
    }

    #[tokio::test]
    async fn test_join_with_lowercase_code() {
        setup_test_env();
        let app = routes(test_state());

        let (_, created) = send(&app, "POST", "/create", json!({ "host_name": "Ann" })).await;
        let code = created["session"]["code"].as_str().unwrap().to_lowercase();

        let (status, joined) =
            send(&app, "POST", "/join", json!({ "code": code, "name": "Bob" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(joined["session_id"], created["session_id"]);
        assert_eq!(joined["session"]["players"].as_array().unwrap().len(), 2);

        let (status, _) = send(&app, "POST", "/join", json!({ "code": code, "name": "bob" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_join_unknown_code() {
        setup_test_env();
        let app = routes(test_state());

        let (status, _) =
            send(&app, "POST", "/join", json!({ "code": "ZZZZZZ", "name": "Bob" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_only_host_can_start() {
        setup_test_env();
        let app = routes(test_state());

        let (_, created) = send(&app, "POST", "/create", json!({ "host_name": "Ann" })).await;
        let session_id = created["session_id"].as_str().unwrap();
        let code = created["session"]["code"].as_str().unwrap();
        let (_, joined) = send(&app, "POST", "/join", json!({ "code": code, "name": "Bob" })).await;

        let uri = format!("/{}/start", session_id);
        let (status, _) = send(&app, "POST", &uri, json!({ "player_id": joined["player_id"] })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_leave_last_player_closes_session() {
        setup_test_env();
        let state = test_state();
        let app = routes(state.clone());

        let (_, created) = send(&app, "POST", "/create", json!({ "host_name": "Ann" })).await;
        let session_id = created["session_id"].as_str().unwrap();
        let host_id = created["player_id"].as_str().unwrap();

        let uri = format!("/{}/leave/{}", session_id, host_id);
        let (status, _) = send(&app, "POST", &uri, Value::Null).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.directory.is_empty().await);

        let uri = format!("/{}/state/{}", session_id, host_id);
        let (status, _) = send(&app, "GET", &uri, Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
