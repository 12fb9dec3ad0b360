use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::models::night::NightAction;
use crate::models::notification::{Envelope, Notification};
use crate::models::player::PlayerId;
use crate::services::{game_service, session_service};
use crate::state::AppState;

/// What a connected player may send over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
enum ClientMessage {
    NightAction(NightAction),
    Vote {
        target_id: PlayerId,
    },
}

pub async fn handler(
    State(state): State<AppState>,
    Path((session_id, player_id)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    // Only members get a socket.
    if let Err(e) = session_service::get_session_view(&state, &session_id, &player_id).await {
        return e.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id, player_id))
}

pub async fn handle_socket(ws: WebSocket, state: AppState, session_id: String, player_id: String) {
    info!(
        "WebSocket connected: player {} in session {}",
        player_id, session_id
    );
    let mut rx = state
        .get_or_create_session_channel(&session_id)
        .await
        .subscribe();
    let (mut sender, mut receiver) = ws.split();

    greet(&state, &session_id, &player_id).await;

    let send_session_id = session_id.clone();
    let send_player_id = player_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let envelope = match rx.recv().await {
                Ok(envelope) => envelope,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Player {} lagged behind by {} notifications",
                        send_player_id, skipped
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if envelope.session_id != send_session_id || !envelope.is_for(&send_player_id) {
                continue;
            }

            let text = match serde_json::to_string(&envelope) {
                Ok(text) => text,
                Err(e) => {
                    log::error!("Failed to serialize notification: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let receive_state = state.clone();
    let receive_session_id = session_id.clone();
    let receive_player_id = player_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    handle_client_message(
                        &receive_state,
                        &receive_session_id,
                        &receive_player_id,
                        &text,
                    )
                    .await
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }
    info!(
        "WebSocket closed: player {} in session {}",
        player_id, session_id
    );
}

/// Current state and role card for a freshly connected player.
async fn greet(state: &AppState, session_id: &str, player_id: &str) {
    let Ok(shared) = state.directory.get(session_id).await else {
        return;
    };
    let session = shared.lock().await;

    let view = session.view_for(player_id);
    state
        .publish(Envelope::private(
            session_id,
            player_id,
            Notification::SessionUpdate { session: view },
        ))
        .await;
    if let Some(reveal) = session.role_reveal_for(player_id) {
        state
            .publish(Envelope::private(
                session_id,
                player_id,
                Notification::RoleReveal { reveal },
            ))
            .await;
    }
}

async fn handle_client_message(state: &AppState, session_id: &str, player_id: &str, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            state
                .send_error(session_id, player_id, format!("malformed message: {}", e))
                .await;
            return;
        }
    };

    let result = match message {
        ClientMessage::NightAction(action) => {
            game_service::submit_night_action(state, session_id, player_id, action)
                .await
                .map(|_| ())
        }
        ClientMessage::Vote { target_id } => {
            game_service::submit_vote(state, session_id, player_id, &target_id)
                .await
                .map(|_| ())
        }
    };

    if let Err(e) = result {
        log::debug!("Rejected message from {}: {}", player_id, e);
        state.send_error(session_id, player_id, e.to_string()).await;
    }
}
