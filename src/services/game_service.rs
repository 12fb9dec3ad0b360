use crate::{
    models::{
        error::GameResult,
        night::{NightAction, NightCompletion, NightOutcome, NightSubmission},
        notification::{Envelope, Notification},
        session::{Phase, Session},
        view::SessionView,
        voting::VoteOutcome,
    },
    services::night_timer,
    state::AppState,
};

pub async fn submit_night_action(
    state: &AppState,
    session_id: &str,
    player_id: &str,
    action: NightAction,
) -> GameResult<NightSubmission> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    let submission = session.submit_night_action(player_id, action)?;
    log::debug!(
        "Night action accepted in session {} round {} from {}",
        session_id,
        session.round,
        player_id
    );

    if let Some(result) = &submission.detective_result {
        let notification = Notification::DetectiveResult {
            result: result.clone(),
        };
        state
            .publish(Envelope::private(session_id, player_id, notification))
            .await;
    }
    if submission.mafia_vote_cast {
        state.send_mafia_votes(&session).await;
    }

    match &submission.outcome {
        Some(outcome) => {
            state.night_timers.cancel(session_id).await;
            announce_night(state, &session, outcome).await;
        }
        None => state.broadcast_session_update(&session).await,
    }
    Ok(submission)
}

pub async fn night_status(state: &AppState, session_id: &str) -> GameResult<NightCompletion> {
    let shared = state.directory.get(session_id).await?;
    let session = shared.lock().await;
    session.ensure_phase(Phase::Night)?;
    Ok(session.night_completion())
}

/// Host-triggered end of the night, resolving with whatever has been submitted.
pub async fn force_end_night(
    state: &AppState,
    session_id: &str,
    caller: &str,
) -> GameResult<NightOutcome> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    session.ensure_host(caller)?;
    let outcome = session.force_end_night(None)?;
    state.night_timers.cancel(session_id).await;

    announce_night(state, &session, &outcome).await;
    Ok(outcome)
}

/// Fired by the night timer. A night that already ended is left alone.
pub async fn end_night_on_timeout(state: &AppState, session_id: &str, round: u32) {
    let shared = match state.directory.get(session_id).await {
        Ok(shared) => shared,
        Err(_) => {
            log::debug!("Night timer fired for closed session {}", session_id);
            return;
        }
    };
    let mut session = shared.lock().await;

    match session.force_end_night(Some(round)) {
        Ok(outcome) => {
            log::info!(
                "Night {} of session {} ended by timeout",
                round,
                session_id
            );
            announce_night(state, &session, &outcome).await;
        }
        Err(e) => log::debug!("Night timer for session {} ignored: {}", session_id, e),
    }
}

async fn announce_night(state: &AppState, session: &Session, outcome: &NightOutcome) {
    log::info!(
        "Night {} of session {} resolved: {} death(s), winner {:?}",
        outcome.round,
        session.id,
        outcome.deaths.len(),
        outcome.winner
    );
    state.broadcast_night_outcome(session, outcome).await;
}

pub async fn start_voting(state: &AppState, session_id: &str, caller: &str) -> GameResult<SessionView> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    session.start_voting(caller)?;

    log::info!("Voting opened in session {} round {}", session_id, session.round);
    state.broadcast_session_update(&session).await;
    Ok(session.view_for(caller))
}

pub async fn submit_vote(
    state: &AppState,
    session_id: &str,
    voter_id: &str,
    target_id: &str,
) -> GameResult<SessionView> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    session.submit_vote(voter_id, target_id)?;

    log::debug!("{} voted for {} in session {}", voter_id, target_id, session_id);
    state.broadcast_session_update(&session).await;
    Ok(session.view_for(voter_id))
}

pub async fn end_voting(state: &AppState, session_id: &str, caller: &str) -> GameResult<VoteOutcome> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    let outcome = session.end_voting(caller)?;

    log::info!(
        "Voting closed in session {}: eliminated {:?}, tied {}",
        session_id,
        outcome.eliminated.as_ref().map(|p| p.name.as_str()),
        outcome.tied
    );
    let notification = Notification::VoteResult {
        outcome: outcome.clone(),
    };
    state
        .publish(Envelope::broadcast(session_id, notification))
        .await;
    state.broadcast_session_update(&session).await;

    if session.phase == Phase::Night {
        state.send_role_reveals(&session).await;
        night_timer::schedule(state, session_id, session.round).await;
    } else {
        state.broadcast_game_end(&session).await;
    }
    Ok(outcome)
}

pub async fn next_round(state: &AppState, session_id: &str, caller: &str) -> GameResult<SessionView> {
    let shared = state.directory.get(session_id).await?;
    let mut session = shared.lock().await;
    session.next_round(caller)?;

    log::info!("Session {} moved on to night {}", session_id, session.round);
    state.broadcast_session_update(&session).await;
    night_timer::schedule(state, session_id, session.round).await;
    Ok(session.view_for(caller))
}
