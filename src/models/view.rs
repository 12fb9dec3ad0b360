use serde::Serialize;
use std::collections::HashMap;

use super::night::{ActionsCompleted, PlayerRef};
use super::player::{Player, PlayerId};
use super::role::{Role, RoleConfig, RoleInfo};
use super::session::{LastKill, Phase, Session, SessionId, Winner};

/// A player as seen by someone else in the session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    /// Only ever set on the viewer's own entry.
    pub role: Option<Role>,
    pub is_alive: bool,
    pub is_muted: bool,
    pub is_host: bool,
}

/// Session state safe to send to one particular player.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: SessionId,
    pub code: String,
    pub host_id: PlayerId,
    pub players: Vec<PlayerView>,
    pub phase: Phase,
    pub role_config: RoleConfig,
    pub round: u32,
    pub actions_completed: ActionsCompleted,
    pub votes: HashMap<PlayerId, PlayerId>,
    pub voting_active: bool,
    pub last_kill: Option<LastKill>,
    pub winner: Option<Winner>,
    pub escort_became_mafia: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RevealedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub is_alive: bool,
    pub role: Option<Role>,
}

/// Private payload telling a player their role and what it lets them know.
#[derive(Debug, Clone, Serialize)]
pub struct RoleReveal {
    pub role: Role,
    pub info: RoleInfo,
    pub allies: Vec<PlayerRef>,
    pub players: Vec<RevealedPlayer>,
}

impl Session {
    pub fn view_for(&self, viewer: &str) -> SessionView {
        let players = self
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id.clone(),
                name: p.name.clone(),
                role: if p.id == viewer { p.role } else { None },
                is_alive: p.is_alive,
                is_muted: p.is_muted,
                is_host: p.is_host,
            })
            .collect();

        SessionView {
            id: self.id.clone(),
            code: self.code.clone(),
            host_id: self.host_id.clone(),
            players,
            phase: self.phase,
            role_config: self.role_config,
            round: self.round,
            actions_completed: self.night_actions.actions_completed.clone(),
            votes: self.voting.votes.clone(),
            voting_active: self.voting.is_active,
            last_kill: self.last_kill.clone(),
            winner: self.winner,
            escort_became_mafia: self.escort_became_mafia,
        }
    }

    /// Dead players see every role. Living players see the other living players, and
    /// mafia-faction members additionally see their living allies.
    pub fn role_reveal_for(&self, player_id: &str) -> Option<RoleReveal> {
        let player = self.player(player_id).ok()?;
        let role = player.role?;
        let others = self.players.iter().filter(|p| p.id != player.id);

        let players = if player.is_alive {
            others
                .filter(|p| p.is_alive)
                .map(|p| RevealedPlayer {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    is_alive: true,
                    role: None,
                })
                .collect()
        } else {
            others
                .map(|p| RevealedPlayer {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    is_alive: p.is_alive,
                    role: p.role,
                })
                .collect()
        };

        let allies = if player.is_alive && self.is_mafia_faction(player) {
            self.living_mafia_faction()
                .filter(|p| p.id != player.id)
                .map(PlayerRef::from)
                .collect()
        } else {
            Vec::new()
        };

        Some(RoleReveal {
            role,
            info: role.info(),
            allies,
            players,
        })
    }

    /// Display names by id, sent alongside mafia vote tallies.
    pub fn player_names(&self) -> HashMap<PlayerId, String> {
        self.players
            .iter()
            .map(|p: &Player| (p.id.clone(), p.name.clone()))
            .collect()
    }
}
