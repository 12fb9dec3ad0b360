use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex};

use crate::models::config::ServerConfig;
use crate::models::night::NightOutcome;
use crate::models::notification::{Envelope, Notification};
use crate::models::session::{Phase, Session};
use crate::services::night_timer::NightTimers;
use crate::services::session_directory::SessionDirectory;

#[derive(Clone)]
pub struct AppState {
    pub directory: SessionDirectory,
    pub channel: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
    pub night_timers: NightTimers,
    pub config: Arc<ServerConfig>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::from_env())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        AppState {
            directory: SessionDirectory::new(),
            channel: Arc::new(Mutex::new(HashMap::new())),
            night_timers: NightTimers::new(),
            config: Arc::new(config),
        }
    }

    pub async fn get_or_create_session_channel(
        &self,
        session_id: &str,
    ) -> broadcast::Sender<Envelope> {
        let mut channels = self.channel.lock().await;
        if let Some(channel) = channels.get(session_id) {
            channel.clone()
        } else {
            let (tx, _) = broadcast::channel(self.config.channel_capacity);
            channels.insert(session_id.to_string(), tx.clone());
            tx
        }
    }

    pub async fn close_session_channel(&self, session_id: &str) {
        self.channel.lock().await.remove(session_id);
    }

    pub async fn publish(&self, envelope: Envelope) {
        let tx = self.get_or_create_session_channel(&envelope.session_id).await;
        // Nobody listening is not an error: clients may reconnect later and fetch state.
        if tx.send(envelope).is_err() {
            log::trace!("No subscribers for notification");
        }
    }

    /// Sends every member their own sanitized copy of the session.
    pub async fn broadcast_session_update(&self, session: &Session) {
        for player in &session.players {
            let notification = Notification::SessionUpdate {
                session: session.view_for(&player.id),
            };
            self.publish(Envelope::private(&session.id, &player.id, notification))
                .await;
        }
    }

    pub async fn send_role_reveals(&self, session: &Session) {
        for player in &session.players {
            if let Some(reveal) = session.role_reveal_for(&player.id) {
                let notification = Notification::RoleReveal { reveal };
                self.publish(Envelope::private(&session.id, &player.id, notification))
                    .await;
            }
        }
    }

    /// Live mafia vote tally, only for the players voting in it.
    pub async fn send_mafia_votes(&self, session: &Session) {
        let player_names = session.player_names();
        for member in session.living_mafia_faction() {
            let notification = Notification::MafiaVoteUpdate {
                votes: session.night_actions.mafia_votes.clone(),
                player_names: player_names.clone(),
            };
            self.publish(Envelope::private(&session.id, &member.id, notification))
                .await;
        }
    }

    pub async fn broadcast_night_outcome(&self, session: &Session, outcome: &NightOutcome) {
        let notification = Notification::NightResult {
            outcome: outcome.clone(),
        };
        self.publish(Envelope::broadcast(&session.id, notification))
            .await;
        self.broadcast_session_update(session).await;
        self.send_role_reveals(session).await;
        self.broadcast_game_end(session).await;
    }

    /// Announces the winner and every role, if the game is over.
    pub async fn broadcast_game_end(&self, session: &Session) {
        if session.phase != Phase::Ended {
            return;
        }
        if let Some(winner) = session.winner {
            let notification = Notification::GameEnd {
                winner,
                roles: session.role_map(),
            };
            self.publish(Envelope::broadcast(&session.id, notification))
                .await;
        }
    }

    pub async fn send_error(&self, session_id: &str, player_id: &str, message: String) {
        let notification = Notification::Error { message };
        self.publish(Envelope::private(session_id, player_id, notification))
            .await;
    }
}
