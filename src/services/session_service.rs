use serde::Serialize;

use crate::{
    models::{
        error::GameResult,
        player::PlayerId,
        role::RoleConfig,
        session::{Session, SessionId},
        view::SessionView,
    },
    services::night_timer,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct JoinedSession {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub session: SessionView,
}

pub async fn create_session(state: &AppState, host_name: &str) -> GameResult<JoinedSession> {
    let created = state
        .directory
        .create(
            host_name,
            state.config.code_length,
            state.config.max_code_attempts,
        )
        .await?;
    let session = created.session.lock().await;

    log::info!(
        "Session {} created with code {} by {}",
        session.id,
        session.code,
        host_name.trim()
    );
    Ok(JoinedSession {
        session_id: created.session_id,
        player_id: created.host_id.clone(),
        session: session.view_for(&created.host_id),
    })
}

pub async fn join_session(state: &AppState, code: &str, name: &str) -> GameResult<JoinedSession> {
    let shared = state.directory.find_by_code(code).await?;
    let mut session = shared.lock().await;
    if session.is_empty() {
        // Lost a race with the last player leaving.
        return Err(crate::models::error::GameError::NotFound("session"));
    }

    let player_id = session.add_player(name)?;
    state
        .directory
        .register_player(&session.id, &player_id)
        .await;
    log::info!("{} joined session {}", name.trim(), session.id);

    state.broadcast_session_update(&session).await;
    Ok(JoinedSession {
        session_id: session.id.clone(),
        player_id: player_id.clone(),
        session: session.view_for(&player_id),
    })
}

pub async fn get_session_view(
    state: &AppState,
    session_id: &str,
    player_id: &str,
) -> GameResult<SessionView> {
    let shared = state.directory.get(session_id).await?;
    let session = shared.lock().await;
    session.player(player_id)?;
    Ok(session.view_for(player_id))
}

pub async fn update_role_config(
    state: &AppState,
    session_id: &str,
    caller: &str,
    config: RoleConfig,
) -> GameResult<SessionView> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    session.update_role_config(caller, config)?;

    log::debug!("Session {} role config: {:?}", session_id, config);
    state.broadcast_session_update(&session).await;
    Ok(session.view_for(caller))
}

pub async fn start_game(state: &AppState, session_id: &str, caller: &str) -> GameResult<SessionView> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    session.start(caller, &mut rand::thread_rng())?;

    log::info!(
        "Session {} started with {} players",
        session_id,
        session.players.len()
    );
    state.send_role_reveals(&session).await;
    state.broadcast_session_update(&session).await;
    night_timer::schedule(state, session_id, session.round).await;
    Ok(session.view_for(caller))
}

pub async fn restart_game(
    state: &AppState,
    session_id: &str,
    caller: &str,
) -> GameResult<SessionView> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    session.restart(caller)?;
    state.night_timers.cancel(session_id).await;

    log::info!("Session {} restarted", session_id);
    state.broadcast_session_update(&session).await;
    Ok(session.view_for(caller))
}

/// Removes a player. The session is torn down once nobody is left in it.
pub async fn leave_session(state: &AppState, session_id: &str, player_id: &str) -> GameResult<()> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    let was_ended = session.phase == crate::models::session::Phase::Ended;
    let now_empty = session.remove_player(player_id)?;
    state.directory.unregister_player(player_id).await;
    log::info!("Player {} left session {}", player_id, session_id);

    if now_empty {
        teardown(state, &session).await;
        return Ok(());
    }

    state.broadcast_session_update(&session).await;
    if !was_ended {
        state.broadcast_game_end(&session).await;
        if session.winner.is_some() {
            state.night_timers.cancel(session_id).await;
        }
    }
    Ok(())
}

async fn teardown(state: &AppState, session: &Session) {
    state.night_timers.cancel(&session.id).await;
    state.directory.remove(&session.id).await;
    state.close_session_channel(&session.id).await;
    log::info!("Session {} closed", session.id);
}
