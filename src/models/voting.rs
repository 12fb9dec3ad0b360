use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::{GameError, GameResult};
use super::night::PlayerRef;
use super::player::PlayerId;
use super::role::Role;
use super::session::{Phase, Session, Winner};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VotingState {
    /// voter -> target; a later vote by the same voter replaces the earlier one.
    pub votes: HashMap<PlayerId, PlayerId>,
    pub is_active: bool,
}

impl VotingState {
    pub(crate) fn forget(&mut self, player_id: &str) {
        self.votes
            .retain(|voter, target| voter != player_id && target != player_id);
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteOutcome {
    pub round: u32,
    pub eliminated: Option<PlayerRef>,
    pub eliminated_role: Option<Role>,
    /// No elimination: either a tie for the top weight or no votes at all.
    pub tied: bool,
    pub escort_converted: bool,
    pub winner: Option<Winner>,
}

/// Returns the key with the strictly highest count. Any tie at the top, or an empty
/// tally, yields `None`.
pub(crate) fn strict_leader<'a>(tally: &HashMap<&'a str, u32>) -> Option<&'a str> {
    let top = tally.values().copied().max()?;
    let mut leaders = tally.iter().filter(|(_, &count)| count == top);
    let (leader, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(*leader)
}

pub fn vote_weight(role: Option<Role>) -> u32 {
    match role {
        Some(Role::Mayor) => 2,
        _ => 1,
    }
}

impl Session {
    pub fn start_voting(&mut self, caller: &str) -> GameResult<()> {
        self.ensure_host(caller)?;
        self.ensure_phase(Phase::Day)?;
        self.voting = VotingState {
            votes: HashMap::new(),
            is_active: true,
        };
        self.phase = Phase::Voting;
        Ok(())
    }

    pub fn submit_vote(&mut self, voter_id: &str, target_id: &str) -> GameResult<()> {
        self.ensure_phase(Phase::Voting)?;
        if !self.voting.is_active {
            return Err(GameError::WrongPhase("closed voting".to_string()));
        }
        if !self.player(voter_id)?.is_alive {
            return Err(GameError::ActionNotAllowed("dead players cannot vote"));
        }
        if voter_id == target_id {
            return Err(GameError::InvalidTarget("cannot vote for yourself"));
        }
        let target = self
            .player(target_id)
            .map_err(|_| GameError::InvalidTarget("no such player"))?;
        if !target.is_alive {
            return Err(GameError::InvalidTarget("target is dead"));
        }

        self.voting
            .votes
            .insert(voter_id.to_string(), target_id.to_string());
        Ok(())
    }

    /// Weighted tally per target, mayor counting double.
    pub fn vote_tally(&self) -> HashMap<&str, u32> {
        let mut tally: HashMap<&str, u32> = HashMap::new();
        for (voter_id, target_id) in &self.voting.votes {
            let role = self.player(voter_id).ok().and_then(|p| p.role);
            *tally.entry(target_id.as_str()).or_default() += vote_weight(role);
        }
        tally
    }

    pub fn end_voting(&mut self, caller: &str) -> GameResult<VoteOutcome> {
        self.ensure_host(caller)?;
        self.resolve_voting()
    }

    pub fn resolve_voting(&mut self) -> GameResult<VoteOutcome> {
        self.ensure_phase(Phase::Voting)?;

        let tally = self.vote_tally();
        let leader = strict_leader(&tally).map(str::to_string);
        let mut outcome = VoteOutcome {
            round: self.round,
            tied: leader.is_none(),
            ..VoteOutcome::default()
        };

        if let Some(target_id) = leader {
            let was_mafia_faction = self.is_mafia_faction(self.player(&target_id)?);
            let target = self.player_mut(&target_id)?;
            target.is_alive = false;
            outcome.eliminated = Some(PlayerRef::from(&*target));
            outcome.eliminated_role = target.role;

            if target.has_role(Role::Jester) {
                self.voting = VotingState::default();
                self.winner = Some(Winner::Jester);
                self.phase = Phase::Ended;
                outcome.winner = self.winner;
                return Ok(outcome);
            }

            if was_mafia_faction
                && !self.escort_became_mafia
                && self.living_mafia_faction().next().is_none()
                && self
                    .players
                    .iter()
                    .any(|p| p.is_alive && p.has_role(Role::Escort))
            {
                self.escort_became_mafia = true;
                outcome.escort_converted = true;
            }
        }

        self.voting = VotingState::default();
        for player in &mut self.players {
            player.is_muted = false;
        }

        outcome.winner = self.evaluate_win();
        if outcome.winner.is_none() {
            self.begin_next_night();
        }
        Ok(outcome)
    }

    /// Host skips the rest of the day straight into the next night.
    pub fn next_round(&mut self, caller: &str) -> GameResult<()> {
        self.ensure_host(caller)?;
        self.ensure_phase(Phase::Day)?;
        self.last_kill = None;
        self.begin_next_night();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voting_session(roles: &[Role]) -> Session {
        let mut session = Session::new("VOTE01".to_string(), "P0").unwrap();
        for i in 1..roles.len() {
            session.add_player(&format!("P{}", i)).unwrap();
        }
        for (player, role) in session.players.iter_mut().zip(roles) {
            player.role = Some(*role);
        }
        session.round = 1;
        session.phase = Phase::Day;
        let host = session.host_id.clone();
        session.start_voting(&host).unwrap();
        session
    }

    fn id(session: &Session, index: usize) -> PlayerId {
        session.players[index].id.clone()
    }

    #[test]
    fn test_strict_leader() {
        let tally: HashMap<&str, u32> = [("a", 3), ("b", 2)].into_iter().collect();
        assert_eq!(strict_leader(&tally), Some("a"));

        let tally: HashMap<&str, u32> = [("a", 2), ("b", 2), ("c", 1)].into_iter().collect();
        assert_eq!(strict_leader(&tally), None);

        assert_eq!(strict_leader(&HashMap::new()), None);
    }

    #[test]
    fn test_mayor_vote_counts_double() {
        use Role::*;
        let mut session = voting_session(&[Mayor, Citizen, Citizen, Mafia, Citizen, Citizen]);
        let (mayor, c1, c2) = (id(&session, 0), id(&session, 1), id(&session, 2));
        let (x, y, z) = (id(&session, 3), id(&session, 4), id(&session, 5));

        session.submit_vote(&mayor, &x).unwrap();
        session.submit_vote(&c1, &y).unwrap();
        session.submit_vote(&c2, &z).unwrap();

        let outcome = session.resolve_voting().unwrap();
        assert!(!outcome.tied);
        assert_eq!(outcome.eliminated.map(|p| p.id), Some(x));
    }

    #[test]
    fn test_revote_overwrites() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Citizen, Citizen, Citizen, Citizen]);
        let voter = id(&session, 1);
        let (first, second) = (id(&session, 2), id(&session, 0));

        session.submit_vote(&voter, &first).unwrap();
        session.submit_vote(&voter, &second).unwrap();
        assert_eq!(session.voting.votes.len(), 1);
        assert_eq!(session.voting.votes[&voter], second);
    }

    #[test]
    fn test_tie_or_no_votes_eliminates_nobody() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Citizen, Citizen, Citizen, Citizen]);
        let outcome = session.resolve_voting().unwrap();
        assert!(outcome.tied);
        assert!(outcome.eliminated.is_none());
        assert_eq!(session.phase, Phase::Night);
        assert_eq!(session.round, 2);

        session.phase = Phase::Day;
        let host = session.host_id.clone();
        session.start_voting(&host).unwrap();
        let (a, b) = (id(&session, 3), id(&session, 4));
        session.submit_vote(&id(&session, 1), &a).unwrap();
        session.submit_vote(&id(&session, 2), &b).unwrap();
        let outcome = session.resolve_voting().unwrap();
        assert!(outcome.tied);
        assert!(session.players.iter().all(|p| p.is_alive));
    }

    #[test]
    fn test_vote_validation() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Citizen, Citizen, Citizen]);
        let (voter, target) = (id(&session, 1), id(&session, 2));

        assert!(matches!(
            session.submit_vote(&voter, &voter),
            Err(GameError::InvalidTarget(_))
        ));
        session.players[2].is_alive = false;
        assert!(matches!(
            session.submit_vote(&voter, &target),
            Err(GameError::InvalidTarget(_))
        ));
        assert!(matches!(
            session.submit_vote(&target, &voter),
            Err(GameError::ActionNotAllowed(_))
        ));
        assert_eq!(
            session.submit_vote("ghost", &voter),
            Err(GameError::NotFound("player"))
        );

        session.voting.is_active = false;
        assert!(matches!(
            session.submit_vote(&voter, &id(&session, 0)),
            Err(GameError::WrongPhase(_))
        ));
    }

    #[test]
    fn test_jester_elimination_ends_game() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Jester, Citizen, Citizen, Citizen, Citizen]);
        let jester = id(&session, 1);
        for voter in [0, 2, 3] {
            session.submit_vote(&id(&session, voter), &jester).unwrap();
        }

        let outcome = session.resolve_voting().unwrap();
        assert_eq!(outcome.winner, Some(Winner::Jester));
        assert_eq!(session.winner, Some(Winner::Jester));
        assert_eq!(session.phase, Phase::Ended);
        assert_eq!(session.round, 1);
    }

    #[test]
    fn test_last_mafia_eliminated_converts_escort() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Escort, Citizen, Citizen, Citizen, Citizen]);
        let mafia = id(&session, 0);
        let escort = id(&session, 1);
        for voter in 1..4 {
            session.submit_vote(&id(&session, voter), &mafia).unwrap();
        }

        let outcome = session.resolve_voting().unwrap();
        assert!(outcome.escort_converted);
        assert!(session.escort_became_mafia);
        assert!(outcome.winner.is_none());
        assert_eq!(session.phase, Phase::Night);
        assert_eq!(session.round, 2);

        // The escort now votes with the mafia and counts against the town.
        assert!(session.is_mafia_faction(session.player(&escort).unwrap()));
        let target = id(&session, 2);
        let submission = session
            .submit_night_action(
                &escort,
                crate::models::night::NightAction::MafiaVote { target_id: target },
            )
            .unwrap();
        assert!(submission.mafia_vote_cast);
    }

    #[test]
    fn test_no_conversion_while_mafia_remain() {
        use Role::*;
        let mut session = voting_session(&[
            Mafia, Godfather, Escort, Citizen, Citizen, Citizen, Citizen,
        ]);
        let mafia = id(&session, 0);
        for voter in 2..5 {
            session.submit_vote(&id(&session, voter), &mafia).unwrap();
        }

        let outcome = session.resolve_voting().unwrap();
        assert!(!outcome.escort_converted);
        assert!(!session.escort_became_mafia);
    }

    #[test]
    fn test_last_mafia_without_escort_is_town_win() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Citizen, Citizen, Citizen]);
        let mafia = id(&session, 0);
        session.submit_vote(&id(&session, 1), &mafia).unwrap();

        let outcome = session.resolve_voting().unwrap();
        assert_eq!(outcome.winner, Some(Winner::Town));
        assert_eq!(session.phase, Phase::Ended);
    }

    #[test]
    fn test_resolution_clears_mutes_and_keeps_doctor_memory() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Doctor, Citizen, Citizen, Citizen]);
        session.players[2].is_muted = true;
        session.night_actions.doctor_last_target = Some(id(&session, 3));
        session.night_actions.actions_completed.doctor = true;

        session.resolve_voting().unwrap();
        assert!(session.players.iter().all(|p| !p.is_muted));
        assert!(session.voting.votes.is_empty());
        assert!(!session.voting.is_active);
        assert_eq!(session.night_actions.doctor_last_target, Some(id(&session, 3)));
        assert!(!session.night_actions.actions_completed.doctor);
    }

    #[test]
    fn test_next_round_requires_day() {
        use Role::*;
        let mut session = voting_session(&[Mafia, Citizen, Citizen, Citizen]);
        let host = session.host_id.clone();
        assert!(matches!(
            session.next_round(&host),
            Err(GameError::WrongPhase(_))
        ));

        session.phase = Phase::Day;
        session.players[1].is_muted = true;
        session.next_round(&host).unwrap();
        assert_eq!(session.phase, Phase::Night);
        assert_eq!(session.round, 2);
        assert!(!session.players[1].is_muted);
    }
}
