use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::{GameError, GameResult};
use super::player::{Player, PlayerId};
use super::role::Role;
use super::session::{KillCause, LastKill, Phase, Session, Winner};
use super::voting::strict_leader;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WitchChoice {
    Protect,
    Poison,
    None,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaveSource {
    Doctor,
    Witch,
}

/// Role groups whose submission gates the end of the night.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoleGroup {
    Mafia,
    Doctor,
    Detective,
    Escort,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionsCompleted {
    pub mafia: bool,
    pub doctor: bool,
    pub detective: bool,
    pub escort: bool,
    pub witch: bool,
}

/// Per-round scratch record of night submissions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NightActions {
    pub mafia_votes: HashMap<PlayerId, PlayerId>,
    pub mafia_target: Option<PlayerId>,
    pub doctor_target: Option<PlayerId>,
    pub doctor_last_target: Option<PlayerId>,
    pub detective_target: Option<PlayerId>,
    pub detective_result: Option<bool>,
    pub escort_target: Option<PlayerId>,
    pub witch_action: Option<WitchChoice>,
    pub witch_target: Option<PlayerId>,
    pub actions_completed: ActionsCompleted,
}

impl NightActions {
    /// Fresh record for the next night. Only the doctor's last heal carries over.
    pub fn next_round(&self) -> Self {
        NightActions {
            doctor_last_target: self.doctor_last_target.clone(),
            ..NightActions::default()
        }
    }

    pub(crate) fn forget(&mut self, player_id: &str) {
        self.mafia_votes
            .retain(|voter, target| voter != player_id && target != player_id);
        for target in [
            &mut self.doctor_target,
            &mut self.detective_target,
            &mut self.escort_target,
            &mut self.witch_target,
        ] {
            if target.as_deref() == Some(player_id) {
                *target = None;
            }
        }
        // Surviving mafia must vote again if every recorded vote was dropped.
        self.actions_completed.mafia = !self.mafia_votes.is_empty();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NightAction {
    MafiaVote {
        target_id: PlayerId,
    },
    Heal {
        target_id: PlayerId,
    },
    Investigate {
        target_id: PlayerId,
    },
    Mute {
        target_id: PlayerId,
    },
    Witch {
        choice: WitchChoice,
        #[serde(default)]
        target_id: Option<PlayerId>,
    },
    Skip,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

impl From<&Player> for PlayerRef {
    fn from(player: &Player) -> Self {
        PlayerRef {
            id: player.id.clone(),
            name: player.name.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Death {
    pub player: PlayerRef,
    pub cause: KillCause,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectiveResult {
    pub target: PlayerRef,
    pub is_mafia: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NightOutcome {
    pub round: u32,
    /// Headline death: the mafia victim if there is one, otherwise the poison victim.
    pub killed: Option<Death>,
    pub deaths: Vec<Death>,
    pub saved: bool,
    pub saved_by: Option<SaveSource>,
    pub muted: Option<PlayerRef>,
    pub poisoned: Option<PlayerRef>,
    pub winner: Option<Winner>,
}

/// What an accepted night submission produced.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct NightSubmission {
    pub detective_result: Option<DetectiveResult>,
    pub mafia_vote_cast: bool,
    /// Present when the submission completed the night and it was resolved.
    pub outcome: Option<NightOutcome>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct NightCompletion {
    pub missing: Vec<RoleGroup>,
}

impl NightCompletion {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Session {
    /// Validates and records a night action, resolving the night if it is now complete.
    pub fn submit_night_action(
        &mut self,
        actor_id: &str,
        action: NightAction,
    ) -> GameResult<NightSubmission> {
        let mut submission = self.record_night_action(actor_id, action)?;
        if self.night_completion().is_complete() {
            submission.outcome = Some(self.resolve_night()?);
        }
        Ok(submission)
    }

    fn record_night_action(
        &mut self,
        actor_id: &str,
        action: NightAction,
    ) -> GameResult<NightSubmission> {
        self.ensure_phase(Phase::Night)?;
        let actor = self.player(actor_id)?;
        if !actor.is_alive {
            return Err(GameError::ActionNotAllowed("dead players cannot act"));
        }
        let role = actor.role;
        let in_mafia_faction = self.is_mafia_faction(actor);
        let mut submission = NightSubmission::default();

        match action {
            NightAction::MafiaVote { target_id } => {
                if !in_mafia_faction {
                    return Err(GameError::ActionNotAllowed("only the mafia vote at night"));
                }
                self.validate_night_target(actor_id, &target_id)?;
                self.night_actions
                    .mafia_votes
                    .insert(actor_id.to_string(), target_id);
                self.night_actions.actions_completed.mafia = true;
                submission.mafia_vote_cast = true;
            }
            NightAction::Heal { target_id } => {
                if role != Some(Role::Doctor) {
                    return Err(GameError::ActionNotAllowed("only the doctor can heal"));
                }
                self.validate_night_target(actor_id, &target_id)?;
                if self.night_actions.doctor_last_target.as_ref() == Some(&target_id) {
                    return Err(GameError::RepeatTarget);
                }
                self.night_actions.doctor_target = Some(target_id);
                self.night_actions.actions_completed.doctor = true;
            }
            NightAction::Investigate { target_id } => {
                if role != Some(Role::Detective) {
                    return Err(GameError::ActionNotAllowed("only the detective can investigate"));
                }
                self.validate_night_target(actor_id, &target_id)?;
                let target = self.player(&target_id)?;
                // The godfather reads innocent; a converted escort does not.
                let is_mafia = target.has_role(Role::Mafia)
                    || (target.has_role(Role::Escort) && self.escort_became_mafia);
                submission.detective_result = Some(DetectiveResult {
                    target: PlayerRef::from(target),
                    is_mafia,
                });
                self.night_actions.detective_target = Some(target_id);
                self.night_actions.detective_result = Some(is_mafia);
                self.night_actions.actions_completed.detective = true;
            }
            NightAction::Mute { target_id } => {
                if role != Some(Role::Escort) {
                    return Err(GameError::ActionNotAllowed("only the escort can mute"));
                }
                if self.escort_became_mafia {
                    return Err(GameError::ActionNotAllowed(
                        "the escort has joined the mafia and can no longer mute",
                    ));
                }
                self.validate_night_target(actor_id, &target_id)?;
                self.night_actions.escort_target = Some(target_id);
                self.night_actions.actions_completed.escort = true;
            }
            NightAction::Witch { choice, target_id } => {
                if role != Some(Role::Witch) {
                    return Err(GameError::ActionNotAllowed("only the witch can cast"));
                }
                let target_id = match choice {
                    WitchChoice::Poison => {
                        let target_id = target_id
                            .ok_or(GameError::InvalidTarget("poison needs a target"))?;
                        self.validate_night_target(actor_id, &target_id)?;
                        Some(target_id)
                    }
                    WitchChoice::Protect | WitchChoice::None => None,
                };
                self.night_actions.witch_action = Some(choice);
                self.night_actions.witch_target = target_id;
                self.night_actions.actions_completed.witch = true;
            }
            NightAction::Skip => {
                if !role.is_some_and(Role::has_night_action) {
                    return Err(GameError::ActionNotAllowed("nothing to skip"));
                }
                let completed = &mut self.night_actions.actions_completed;
                match role {
                    _ if in_mafia_faction => {
                        return Err(GameError::ActionNotAllowed("the mafia cannot skip"));
                    }
                    Some(Role::Doctor) => completed.doctor = true,
                    Some(Role::Escort) => completed.escort = true,
                    Some(Role::Witch) => completed.witch = true,
                    // Only the detective is left.
                    _ => {
                        return Err(GameError::ActionNotAllowed("the detective cannot skip"));
                    }
                }
            }
        }

        Ok(submission)
    }

    fn validate_night_target(&self, actor_id: &str, target_id: &str) -> GameResult<()> {
        if actor_id == target_id {
            return Err(GameError::InvalidTarget("cannot target yourself"));
        }
        let target = self
            .player(target_id)
            .map_err(|_| GameError::InvalidTarget("no such player"))?;
        if !target.is_alive {
            return Err(GameError::InvalidTarget("target is dead"));
        }
        Ok(())
    }

    /// Which role groups still owe a submission. The witch never gates the night.
    pub fn night_completion(&self) -> NightCompletion {
        let completed = &self.night_actions.actions_completed;
        let alive_with = |role: Role| self.players.iter().any(|p| p.is_alive && p.has_role(role));
        let mut missing = Vec::new();

        if self.living_mafia_faction().next().is_some() && !completed.mafia {
            missing.push(RoleGroup::Mafia);
        }
        if alive_with(Role::Doctor) && !completed.doctor {
            missing.push(RoleGroup::Doctor);
        }
        if alive_with(Role::Detective) && !completed.detective {
            missing.push(RoleGroup::Detective);
        }
        if alive_with(Role::Escort) && !self.escort_became_mafia && !completed.escort {
            missing.push(RoleGroup::Escort);
        }

        NightCompletion { missing }
    }

    /// Timer entry point: resolves the night whether or not everyone has acted.
    ///
    /// `expected_round` is the round the caller scheduled for; a mismatch means the night
    /// it was meant for is already over.
    pub fn force_end_night(&mut self, expected_round: Option<u32>) -> GameResult<NightOutcome> {
        if let Some(round) = expected_round {
            if round != self.round || self.resolved_round == Some(round) {
                return Err(GameError::AlreadyResolved(round));
            }
        }
        self.resolve_night()
    }

    /// Folds the round's submissions into one outcome. Runs at most once per round.
    pub fn resolve_night(&mut self) -> GameResult<NightOutcome> {
        self.ensure_phase(Phase::Night)?;
        if self.resolved_round == Some(self.round) {
            return Err(GameError::AlreadyResolved(self.round));
        }

        let mut outcome = NightOutcome {
            round: self.round,
            ..NightOutcome::default()
        };

        // Poison laid down on an earlier night takes effect before anything else.
        for player in &mut self.players {
            if player.is_poisoned && player.is_alive {
                player.is_alive = false;
                outcome.deaths.push(Death {
                    player: PlayerRef::from(&*player),
                    cause: KillCause::Witch,
                });
            }
            player.is_poisoned = false;
        }

        // Mafia target: strict plurality, any tie means no attempt.
        let mut tally: HashMap<&str, u32> = HashMap::new();
        for target in self.night_actions.mafia_votes.values() {
            *tally.entry(target.as_str()).or_default() += 1;
        }
        let mafia_target = strict_leader(&tally).map(str::to_string);
        self.night_actions.mafia_target = mafia_target.clone();

        let witch_protects = self.night_actions.witch_action == Some(WitchChoice::Protect);
        let doctor_target = self.night_actions.doctor_target.clone();

        if let Some(target_id) = mafia_target {
            if let Ok(target) = self.player_mut(&target_id) {
                if target.is_alive {
                    if witch_protects {
                        outcome.saved = true;
                        outcome.saved_by = Some(SaveSource::Witch);
                    } else if doctor_target.as_deref() == Some(target_id.as_str()) {
                        outcome.saved = true;
                        outcome.saved_by = Some(SaveSource::Doctor);
                    } else {
                        target.is_alive = false;
                        outcome.deaths.push(Death {
                            player: PlayerRef::from(&*target),
                            cause: KillCause::Mafia,
                        });
                    }
                }
            }
        }

        // Tonight's poison kills on the next night.
        if self.night_actions.witch_action == Some(WitchChoice::Poison) {
            if let Some(target_id) = self.night_actions.witch_target.clone() {
                if let Ok(target) = self.player_mut(&target_id) {
                    if target.is_alive {
                        target.is_poisoned = true;
                        outcome.poisoned = Some(PlayerRef::from(&*target));
                    }
                }
            }
        }

        if let Some(target_id) = self.night_actions.escort_target.clone() {
            if let Ok(target) = self.player_mut(&target_id) {
                if target.is_alive {
                    target.is_muted = true;
                    outcome.muted = Some(PlayerRef::from(&*target));
                }
            }
        }

        if let Some(target_id) = doctor_target {
            self.night_actions.doctor_last_target = Some(target_id);
        }

        outcome.killed = outcome
            .deaths
            .iter()
            .find(|death| death.cause == KillCause::Mafia)
            .or_else(|| outcome.deaths.first())
            .cloned();
        self.last_kill = outcome.killed.as_ref().map(|death| LastKill {
            player_name: death.player.name.clone(),
            cause: death.cause,
        });

        self.resolved_round = Some(self.round);
        self.phase = Phase::Day;
        outcome.winner = self.evaluate_win();
        Ok(outcome)
    }
}
