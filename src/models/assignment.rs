use rand::Rng;

use super::player::Player;
use super::role::{Role, RoleConfig};

/// Builds the deck of roles for `player_count` seats: every configured special role
/// repeated by its count, padded with citizens.
pub fn build_role_deck(config: &RoleConfig, player_count: usize) -> Vec<Role> {
    let mut deck: Vec<Role> = Role::SPECIAL
        .iter()
        .flat_map(|&role| std::iter::repeat(role).take(config.count(role)))
        .collect();

    if deck.len() < player_count {
        deck.resize(player_count, Role::Citizen);
    }
    deck
}

/// Fisher-Yates shuffle.
pub fn shuffle_roles<R: Rng + ?Sized>(deck: &mut [Role], rng: &mut R) {
    for i in (1..deck.len()).rev() {
        let j = rng.gen_range(0..=i);
        deck.swap(i, j);
    }
}

/// Deals a shuffled deck to the players positionally.
///
/// The caller guarantees `config.total() <= players.len()`.
pub fn assign_roles<R: Rng + ?Sized>(config: &RoleConfig, players: &mut [Player], rng: &mut R) {
    let mut deck = build_role_deck(config, players.len());
    shuffle_roles(&mut deck, rng);

    for (player, role) in players.iter_mut().zip(deck) {
        player.role = Some(role);
    }
}
