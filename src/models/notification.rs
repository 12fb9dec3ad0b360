use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::night::{DetectiveResult, NightOutcome};
use super::player::PlayerId;
use super::role::Role;
use super::session::{SessionId, Winner};
use super::view::{RoleReveal, SessionView};
use super::voting::VoteOutcome;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Notification {
    SessionUpdate {
        session: SessionView,
    },
    RoleReveal {
        reveal: RoleReveal,
    },
    DetectiveResult {
        result: DetectiveResult,
    },
    MafiaVoteUpdate {
        votes: HashMap<PlayerId, PlayerId>,
        player_names: HashMap<PlayerId, String>,
    },
    NightResult {
        outcome: NightOutcome,
    },
    VoteResult {
        outcome: VoteOutcome,
    },
    GameEnd {
        winner: Winner,
        roles: BTreeMap<String, Role>,
    },
    Error {
        message: String,
    },
}

/// A notification addressed to the whole session or to a single player.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub session_id: SessionId,
    pub recipient: Option<PlayerId>,
    pub timestamp: String,
    #[serde(flatten)]
    pub notification: Notification,
}

impl Envelope {
    pub fn broadcast(session_id: &str, notification: Notification) -> Self {
        Self::new(session_id, None, notification)
    }

    pub fn private(session_id: &str, player_id: &str, notification: Notification) -> Self {
        Self::new(session_id, Some(player_id.to_string()), notification)
    }

    fn new(session_id: &str, recipient: Option<PlayerId>, notification: Notification) -> Self {
        Envelope {
            session_id: session_id.to_string(),
            recipient,
            timestamp: chrono::Utc::now().to_rfc3339(),
            notification,
        }
    }

    pub fn is_for(&self, player_id: &str) -> bool {
        self.recipient
            .as_deref()
            .map_or(true, |recipient| recipient == player_id)
    }
}
