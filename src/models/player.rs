use serde::{Deserialize, Serialize};

use super::role::Role;

pub type PlayerId = String;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<Role>,
    pub is_alive: bool,
    pub is_muted: bool,
    pub is_host: bool,
    pub is_poisoned: bool,
}

impl Player {
    pub fn new(name: String, is_host: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            role: None,
            is_alive: true,
            is_muted: false,
            is_host,
            is_poisoned: false,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    /// Back to the state of a freshly joined player.
    pub fn reset(&mut self) {
        self.role = None;
        self.is_alive = true;
        self.is_muted = false;
        self.is_poisoned = false;
    }
}
