use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::assignment::assign_roles;
use super::error::{GameError, GameResult};
use super::night::NightActions;
use super::player::{Player, PlayerId};
use super::role::{Role, RoleConfig, Team};
use super::voting::VotingState;

pub type SessionId = String;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Night,
    Day,
    Voting,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lobby => "lobby",
            Phase::Night => "night",
            Phase::Day => "day",
            Phase::Voting => "voting",
            Phase::Ended => "ended",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Town,
    Mafia,
    Jester,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KillCause {
    Mafia,
    Witch,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastKill {
    pub player_name: String,
    pub cause: KillCause,
}

/// One game instance. All rule enforcement happens through methods on this type; callers
/// are expected to hold the session lock for the duration of each call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub code: String,
    pub host_id: PlayerId,
    pub players: Vec<Player>,
    pub phase: Phase,
    pub role_config: RoleConfig,
    pub round: u32,
    pub night_actions: NightActions,
    pub voting: VotingState,
    pub last_kill: Option<LastKill>,
    pub winner: Option<Winner>,
    pub escort_became_mafia: bool,
    /// Last round whose night has been resolved. Guards against resolving twice.
    pub resolved_round: Option<u32>,
}

impl Session {
    pub fn new(code: String, host_name: &str) -> GameResult<Self> {
        let host = Player::new(validate_name(host_name)?, true);
        Ok(Session {
            id: uuid::Uuid::new_v4().to_string(),
            code,
            host_id: host.id.clone(),
            players: vec![host],
            phase: Phase::Lobby,
            role_config: RoleConfig::default(),
            round: 0,
            night_actions: NightActions::default(),
            voting: VotingState::default(),
            last_kill: None,
            winner: None,
            escort_became_mafia: false,
            resolved_round: None,
        })
    }

    pub fn player(&self, player_id: &str) -> GameResult<&Player> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .ok_or(GameError::NotFound("player"))
    }

    pub fn player_mut(&mut self, player_id: &str) -> GameResult<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(GameError::NotFound("player"))
    }

    pub fn player_name(&self, player_id: &str) -> Option<&str> {
        self.player(player_id).ok().map(|p| p.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn ensure_phase(&self, phase: Phase) -> GameResult<()> {
        if self.phase != phase {
            return Err(GameError::WrongPhase(self.phase.to_string()));
        }
        Ok(())
    }

    pub fn ensure_host(&self, caller: &str) -> GameResult<()> {
        self.player(caller)?;
        if self.host_id != caller {
            return Err(GameError::Unauthorized);
        }
        Ok(())
    }

    /// Mafia-faction membership: mafia and godfather always, the escort once converted.
    pub fn is_mafia_faction(&self, player: &Player) -> bool {
        match player.role {
            Some(Role::Escort) => self.escort_became_mafia,
            Some(role) => role.team() == Team::Mafia,
            None => false,
        }
    }

    pub fn living_mafia_faction(&self) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(move |p| p.is_alive && self.is_mafia_faction(p))
    }

    pub fn add_player(&mut self, name: &str) -> GameResult<PlayerId> {
        self.ensure_phase(Phase::Lobby)?;
        let name = validate_name(name)?;
        if self
            .players
            .iter()
            .any(|p| p.name.to_lowercase() == name.to_lowercase())
        {
            return Err(GameError::NameConflict(name));
        }

        let player = Player::new(name, false);
        let player_id = player.id.clone();
        self.players.push(player);
        Ok(player_id)
    }

    pub fn update_role_config(&mut self, caller: &str, config: RoleConfig) -> GameResult<()> {
        self.ensure_host(caller)?;
        self.ensure_phase(Phase::Lobby)?;
        self.role_config = config;
        Ok(())
    }

    pub fn start<R: Rng + ?Sized>(&mut self, caller: &str, rng: &mut R) -> GameResult<()> {
        self.ensure_host(caller)?;
        self.ensure_phase(Phase::Lobby)?;
        self.role_config
            .validate(self.players.len())
            .map_err(GameError::ConfigInvalid)?;

        assign_roles(&self.role_config, &mut self.players, rng);
        self.phase = Phase::Night;
        self.round = 1;
        self.night_actions = NightActions::default();
        self.voting = VotingState::default();
        self.resolved_round = None;
        Ok(())
    }

    /// Removes a player, promoting the next player to host when the host leaves.
    /// Returns `true` when the session is now empty and should be discarded.
    pub fn remove_player(&mut self, player_id: &str) -> GameResult<bool> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::NotFound("player"))?;
        self.players.remove(index);

        // Stale references to the departed player.
        self.voting.forget(player_id);
        self.night_actions.forget(player_id);

        if self.players.is_empty() {
            return Ok(true);
        }

        if self.host_id == player_id {
            let next = &mut self.players[0];
            next.is_host = true;
            self.host_id = next.id.clone();
        }

        if matches!(self.phase, Phase::Night | Phase::Day | Phase::Voting) {
            self.evaluate_win();
        }
        Ok(false)
    }

    pub fn restart(&mut self, caller: &str) -> GameResult<()> {
        self.ensure_host(caller)?;

        for player in &mut self.players {
            player.reset();
        }
        self.phase = Phase::Lobby;
        self.round = 0;
        self.night_actions = NightActions::default();
        self.voting = VotingState::default();
        self.last_kill = None;
        self.winner = None;
        self.escort_became_mafia = false;
        self.resolved_round = None;
        Ok(())
    }

    /// Every player's role keyed by display name, revealed when the game ends.
    pub fn role_map(&self) -> BTreeMap<String, Role> {
        self.players
            .iter()
            .filter_map(|p| p.role.map(|role| (p.name.clone(), role)))
            .collect()
    }

    /// Clears mutes and prepares a fresh night, keeping the doctor's last heal.
    pub(crate) fn begin_next_night(&mut self) {
        for player in &mut self.players {
            player.is_muted = false;
        }
        self.night_actions = self.night_actions.next_round();
        self.phase = Phase::Night;
        self.round += 1;
    }
}

fn validate_name(name: &str) -> GameResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidName("name must not be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lobby(names: &[&str]) -> Session {
        let mut session = Session::new("ABC123".to_string(), names[0]).unwrap();
        for name in &names[1..] {
            session.add_player(name).unwrap();
        }
        session
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new("ABC123".to_string(), "Ana").unwrap();
        assert_eq!(session.phase, Phase::Lobby);
        assert_eq!(session.round, 0);
        assert_eq!(session.players.len(), 1);
        assert!(session.players[0].is_host);
        assert_eq!(session.host_id, session.players[0].id);
        assert_eq!(session.role_config, RoleConfig::default());
    }

    #[test]
    fn test_empty_host_name_rejected() {
        assert_eq!(
            Session::new("ABC123".to_string(), "   ").unwrap_err(),
            GameError::InvalidName("name must not be empty")
        );
    }

    #[test]
    fn test_duplicate_name_is_case_insensitive() {
        let mut session = lobby(&["Ana", "Boris"]);
        assert_eq!(
            session.add_player("bORIS").unwrap_err(),
            GameError::NameConflict("bORIS".to_string())
        );
        assert_eq!(session.players.len(), 2);
    }

    #[test]
    fn test_join_outside_lobby_rejected() {
        let mut session = lobby(&["Ana", "Boris", "Cvijeta"]);
        let host = session.host_id.clone();
        session
            .start(&host, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(matches!(
            session.add_player("Dino"),
            Err(GameError::WrongPhase(_))
        ));
    }

    #[test]
    fn test_start_requires_host_and_valid_config() {
        let mut session = lobby(&["Ana", "Boris"]);
        let guest = session.players[1].id.clone();
        let host = session.host_id.clone();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(session.start(&guest, &mut rng), Err(GameError::Unauthorized));
        // Default config needs three seats.
        assert!(matches!(
            session.start(&host, &mut rng),
            Err(GameError::ConfigInvalid(_))
        ));
        assert_eq!(session.phase, Phase::Lobby);
        assert!(session.players.iter().all(|p| p.role.is_none()));

        session.add_player("Cvijeta").unwrap();
        session.start(&host, &mut rng).unwrap();
        assert_eq!(session.phase, Phase::Night);
        assert_eq!(session.round, 1);
        assert!(session.players.iter().all(|p| p.role.is_some()));
    }

    #[test]
    fn test_update_config_only_in_lobby_by_host() {
        let mut session = lobby(&["Ana", "Boris", "Cvijeta"]);
        let host = session.host_id.clone();
        let guest = session.players[1].id.clone();
        let config = RoleConfig {
            mafia: 0,
            godfather: 1,
            ..RoleConfig::default()
        };

        assert_eq!(
            session.update_role_config(&guest, config),
            Err(GameError::Unauthorized)
        );
        session.update_role_config(&host, config).unwrap();
        assert_eq!(session.role_config, config);

        session
            .start(&host, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert!(matches!(
            session.update_role_config(&host, RoleConfig::default()),
            Err(GameError::WrongPhase(_))
        ));
    }

    #[test]
    fn test_host_leaving_promotes_next_player() {
        let mut session = lobby(&["Ana", "Boris", "Cvijeta"]);
        let host = session.host_id.clone();
        let boris = session.players[1].id.clone();

        assert!(!session.remove_player(&host).unwrap());
        assert_eq!(session.host_id, boris);
        assert!(session.players[0].is_host);
        assert_eq!(session.players.iter().filter(|p| p.is_host).count(), 1);
    }

    #[test]
    fn test_last_player_leaving_empties_session() {
        let mut session = lobby(&["Ana"]);
        let host = session.host_id.clone();
        assert!(session.remove_player(&host).unwrap());
        assert!(session.is_empty());
        assert_eq!(
            session.remove_player(&host),
            Err(GameError::NotFound("player"))
        );
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut session = lobby(&["Ana", "Boris", "Cvijeta"]);
        let host = session.host_id.clone();
        session
            .start(&host, &mut StdRng::seed_from_u64(9))
            .unwrap();
        session.players[1].is_alive = false;
        session.players[2].is_muted = true;
        session.players[2].is_poisoned = true;
        session.escort_became_mafia = true;
        session.winner = Some(Winner::Town);
        session.phase = Phase::Ended;

        session.restart(&host).unwrap();
        assert_eq!(session.phase, Phase::Lobby);
        assert_eq!(session.round, 0);
        assert!(session.winner.is_none());
        assert!(!session.escort_became_mafia);
        assert!(session.resolved_round.is_none());
        for player in &session.players {
            assert!(player.is_alive && !player.is_muted && !player.is_poisoned);
            assert!(player.role.is_none());
        }
    }
}
