use super::player::Player;
use super::role::Role;
use super::session::{Phase, Session, Winner};

/// Living mafia-faction and town counts. The jester counts for neither side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub mafia: usize,
    pub town: usize,
}

impl Standing {
    /// Mafia parity is checked before mafia elimination, so a board with one mafia member
    /// and nobody else alive is a mafia win, and an empty board is a town win.
    pub fn winner(self) -> Option<Winner> {
        if self.mafia > 0 && self.mafia >= self.town {
            return Some(Winner::Mafia);
        }
        if self.mafia == 0 {
            return Some(Winner::Town);
        }
        None
    }
}

impl Session {
    pub fn standing(&self) -> Standing {
        let alive: Vec<&Player> = self.players.iter().filter(|p| p.is_alive).collect();
        let mafia = alive.iter().filter(|p| self.is_mafia_faction(p)).count();
        let town = alive
            .iter()
            .filter(|p| !self.is_mafia_faction(p) && !p.has_role(Role::Jester))
            .count();
        Standing { mafia, town }
    }

    /// Ends the game if a side has won. Leaves the session untouched otherwise.
    pub fn evaluate_win(&mut self) -> Option<Winner> {
        let winner = self.standing().winner()?;
        self.winner = Some(winner);
        self.phase = Phase::Ended;
        Some(winner)
    }
}
