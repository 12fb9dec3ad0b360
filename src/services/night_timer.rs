use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::models::session::SessionId;
use crate::services::game_service;
use crate::state::AppState;

/// Pending night timeouts, at most one per session.
#[derive(Clone, Default)]
pub struct NightTimers {
    handles: Arc<Mutex<HashMap<SessionId, AbortHandle>>>,
}

impl NightTimers {
    pub fn new() -> Self {
        Self::default()
    }

    async fn arm(&self, session_id: &str, handle: AbortHandle) {
        let mut handles = self.handles.lock().await;
        if let Some(previous) = handles.insert(session_id.to_string(), handle) {
            previous.abort();
        }
    }

    pub async fn cancel(&self, session_id: &str) {
        if let Some(handle) = self.handles.lock().await.remove(session_id) {
            handle.abort();
        }
    }

    pub async fn is_armed(&self, session_id: &str) -> bool {
        self.handles
            .lock()
            .await
            .get(session_id)
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Forces the night of `round` to end once the configured duration has elapsed.
///
/// The timer carries the round it was scheduled for, so firing after the night already
/// ended is rejected by the session rather than resolving a later night early.
pub async fn schedule(state: &AppState, session_id: &str, round: u32) {
    if !state.config.auto_end_night {
        return;
    }

    let duration = state.config.night_duration();
    let task_state = state.clone();
    let task_session_id = session_id.to_string();
    let task = tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        game_service::end_night_on_timeout(&task_state, &task_session_id, round).await;
    });

    log::debug!(
        "Night timer armed for session {} round {} ({:?})",
        session_id,
        round,
        duration
    );
    state
        .night_timers
        .arm(session_id, task.abort_handle())
        .await;
}
