use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    Mafia,
    Godfather,
    Detective,
    Doctor,
    Escort,
    Jester,
    Witch,
    Mayor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Town,
    Mafia,
    Neutral,
}

/// Static catalog entry shown to players on the role card.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoleInfo {
    pub role: Role,
    pub name: &'static str,
    pub team: Team,
    pub description: &'static str,
    pub ability: &'static str,
}

impl Role {
    /// Special roles in the order they are dealt from a [`RoleConfig`].
    pub const SPECIAL: [Role; 8] = [
        Role::Mafia,
        Role::Godfather,
        Role::Detective,
        Role::Doctor,
        Role::Escort,
        Role::Jester,
        Role::Witch,
        Role::Mayor,
    ];

    pub fn info(self) -> RoleInfo {
        match self {
            Role::Citizen => RoleInfo {
                role: self,
                name: "Citizen",
                team: Team::Town,
                description: "An ordinary resident of the town with no special abilities.",
                ability: "No night action. Relies on logic and intuition during the day.",
            },
            Role::Mafia => RoleInfo {
                role: self,
                name: "Mafia",
                team: Team::Mafia,
                description: "A member of the criminal organisation trying to take over the town.",
                ability: "Chooses a victim each night together with the other mafia members.",
            },
            Role::Godfather => RoleInfo {
                role: self,
                name: "Godfather",
                team: Team::Mafia,
                description: "Head of the mafia. A seasoned criminal who knows how to hide.",
                ability: "Acts as mafia, but the detective sees them as innocent.",
            },
            Role::Detective => RoleInfo {
                role: self,
                name: "Detective",
                team: Team::Town,
                description: "An investigator working to expose the criminals.",
                ability: "Investigates one player each night and learns whether they are mafia.",
            },
            Role::Doctor => RoleInfo {
                role: self,
                name: "Doctor",
                team: Team::Town,
                description: "A medic who can save lives.",
                ability: "Protects one player from attack each night. Never the same player twice in a row.",
            },
            Role::Escort => RoleInfo {
                role: self,
                name: "Escort",
                team: Team::Town,
                description: "Uses charm to distract and disable others.",
                ability: "Mutes a player for the following day. Joins the mafia if they are voted out.",
            },
            Role::Jester => RoleInfo {
                role: self,
                name: "Jester",
                team: Team::Neutral,
                description: "An unstable soul who wants to be noticed at any cost.",
                ability: "Wins if the town votes them out.",
            },
            Role::Witch => RoleInfo {
                role: self,
                name: "Witch",
                team: Team::Town,
                description: "A mystic with the power to protect and to curse.",
                ability: "Can shield everyone from the attack, poison someone, or do nothing.",
            },
            Role::Mayor => RoleInfo {
                role: self,
                name: "Mayor",
                team: Team::Town,
                description: "The elected leader of the town.",
                ability: "Their vote counts twice during the day.",
            },
        }
    }

    pub fn team(self) -> Team {
        self.info().team
    }

    /// Whether the role has anything to submit during the night.
    pub fn has_night_action(self) -> bool {
        !matches!(self, Role::Citizen | Role::Jester | Role::Mayor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info().name)
    }
}

/// Desired number of each special role. Citizens fill whatever is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub mafia: usize,
    pub godfather: usize,
    pub detective: usize,
    pub doctor: usize,
    pub escort: usize,
    pub jester: usize,
    pub witch: usize,
    pub mayor: usize,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            mafia: 1,
            godfather: 0,
            detective: 1,
            doctor: 1,
            escort: 0,
            jester: 0,
            witch: 0,
            mayor: 0,
        }
    }
}

impl RoleConfig {
    pub fn count(&self, role: Role) -> usize {
        match role {
            Role::Citizen => 0,
            Role::Mafia => self.mafia,
            Role::Godfather => self.godfather,
            Role::Detective => self.detective,
            Role::Doctor => self.doctor,
            Role::Escort => self.escort,
            Role::Jester => self.jester,
            Role::Witch => self.witch,
            Role::Mayor => self.mayor,
        }
    }

    pub fn total(&self) -> usize {
        Role::SPECIAL.iter().map(|&role| self.count(role)).sum()
    }

    pub fn mafia_faction(&self) -> usize {
        self.mafia + self.godfather
    }

    /// Checks the configuration against the number of seated players.
    pub fn validate(&self, player_count: usize) -> Result<(), String> {
        if self.total() > player_count {
            return Err(format!(
                "{} special roles configured for {} players",
                self.total(),
                player_count
            ));
        }
        if self.mafia_faction() < 1 {
            return Err("at least one mafia or godfather is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_teams() {
        assert_eq!(Role::Godfather.team(), Team::Mafia);
        assert_eq!(Role::Escort.team(), Team::Town);
        assert_eq!(Role::Jester.team(), Team::Neutral);
        assert_eq!(Role::Mayor.to_string(), "Mayor");
    }

    #[test]
    fn test_default_config() {
        let config = RoleConfig::default();
        assert_eq!(config.total(), 3);
        assert_eq!(config.mafia_faction(), 1);
    }

    #[test]
    fn test_validate_config() {
        let config = RoleConfig::default();
        assert!(config.validate(3).is_ok());
        assert!(config.validate(2).is_err());

        let no_mafia = RoleConfig {
            mafia: 0,
            ..RoleConfig::default()
        };
        assert!(no_mafia.validate(5).is_err());

        let godfather_only = RoleConfig {
            mafia: 0,
            godfather: 1,
            ..RoleConfig::default()
        };
        assert!(godfather_only.validate(5).is_ok());
    }
}
