//! Game state.
//!
//! `GameState` is everything the engine mutates: players, card instances,
//! bases in play, the shared base piles, and the current turn. Handlers get
//! read-only access to it and change it only by emitting intents.

use serde::{Deserialize, Serialize};

use crate::cards::{Base, Card, CardState, CardStore};
use crate::core::{EntityId, PlayerId, PlayerMap};
use crate::zones::Pile;

/// One seat in the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub deck: Pile,
    /// Order is kept but has no game meaning.
    pub hand: Vec<EntityId>,
    pub discard: Pile,
    pub points: u32,
    /// Names of the decks this player was dealt.
    pub decks: Vec<String>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            deck: Pile::new(),
            hand: Vec::new(),
            discard: Pile::new(),
            points: 0,
            decks: Vec::new(),
        }
    }

    /// Take a card out of the hand. Returns whether it was there.
    pub fn remove_from_hand(&mut self, card: EntityId) -> bool {
        match self.hand.iter().position(|c| *c == card) {
            Some(index) => {
                self.hand.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Per-turn budgets of the active player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub player: PlayerId,
    pub minions_left: u32,
    pub actions_left: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Setup,
    Running,
    Finished { winner: PlayerId },
}

/// The authoritative state of one game.
#[derive(Debug)]
pub struct GameState {
    pub players: PlayerMap<Player>,
    pub cards: CardStore,
    /// Bases in play, in the order they were placed.
    pub bases: Vec<EntityId>,
    pub base_deck: Pile,
    pub base_discard: Pile,
    pub turn: Option<TurnState>,
    /// Number of turns begun so far.
    pub turn_number: u32,
    pub phase: GamePhase,
}

impl GameState {
    /// Empty state for the named players, seated in order.
    ///
    /// Panics on zero or more than 255 names.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let players: Vec<Player> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(PlayerId(i as u8), name))
            .collect();
        Self {
            players: PlayerMap::from_vec(players),
            cards: CardStore::new(),
            bases: Vec::new(),
            base_deck: Pile::new(),
            base_discard: Pile::new(),
            turn: None,
            turn_number: 0,
            phase: GamePhase::Setup,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.player_count()
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    #[must_use]
    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(id, _)| id)
    }

    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        self.turn.map(|t| t.player)
    }

    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&Card> {
        self.cards.card(id)
    }

    #[must_use]
    pub fn base(&self, id: EntityId) -> Option<&Base> {
        self.cards.base(id)
    }

    #[must_use]
    pub fn bases_in_play(&self) -> &[EntityId] {
        &self.bases
    }

    #[must_use]
    pub fn is_base_in_play(&self, base: EntityId) -> bool {
        self.base(base).is_some_and(|b| b.state.is_in_play())
    }

    /// Minions on a base, in the order they arrived.
    #[must_use]
    pub fn minions_on(&self, base: EntityId) -> &[EntityId] {
        self.base(base).map(|b| b.state.minions()).unwrap_or(&[])
    }

    /// Every minion in play, base by base.
    #[must_use]
    pub fn minions_in_play(&self) -> Vec<EntityId> {
        self.bases
            .iter()
            .flat_map(|b| self.minions_on(*b).iter().copied())
            .collect()
    }

    /// Minions in play under `player`'s control.
    #[must_use]
    pub fn minions_controlled_by(&self, player: PlayerId) -> Vec<EntityId> {
        self.minions_in_play()
            .into_iter()
            .filter(|m| self.controller_of(*m) == Some(player))
            .collect()
    }

    /// Effective power of a minion in play.
    #[must_use]
    pub fn minion_power(&self, minion: EntityId) -> Option<i32> {
        self.card(minion).and_then(|c| c.state.effective_power())
    }

    #[must_use]
    pub fn base_power(&self, base: EntityId) -> i32 {
        self.cards.base_power(base)
    }

    /// Current threshold of a base in play.
    #[must_use]
    pub fn base_threshold(&self, base: EntityId) -> Option<i32> {
        self.base(base).and_then(|b| b.state.power_threshold())
    }

    /// Controller of a card in play.
    #[must_use]
    pub fn controller_of(&self, card: EntityId) -> Option<PlayerId> {
        self.card(card).and_then(|c| c.state.controller())
    }

    /// Base a minion or base-action sits on.
    #[must_use]
    pub fn base_of(&self, card: EntityId) -> Option<EntityId> {
        self.card(card).and_then(|c| c.state.base())
    }

    #[must_use]
    pub fn is_in_play(&self, card: EntityId) -> bool {
        self.card(card).is_some_and(|c| c.state.is_in_play())
    }

    #[must_use]
    pub fn is_minion_in_play(&self, card: EntityId) -> bool {
        self.card(card)
            .is_some_and(|c| matches!(c.state, CardState::MinionOnBase { .. }))
    }

    /// Bases whose total power has reached their threshold.
    #[must_use]
    pub fn bases_ready_to_score(&self) -> Vec<EntityId> {
        self.bases
            .iter()
            .copied()
            .filter(|b| {
                self.base_threshold(*b)
                    .is_some_and(|threshold| self.base_power(*b) >= threshold)
            })
            .collect()
    }

    /// The unique leader at or above `point_max`, if there is one.
    #[must_use]
    pub fn winner(&self, point_max: u32) -> Option<PlayerId> {
        let best = self.players.values().map(|p| p.points).max()?;
        let mut leaders = self.players.iter().filter(|(_, p)| p.points == best);
        let (leader, _) = leaders.next()?;
        if best >= point_max && leaders.next().is_none() {
            Some(leader)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seats_players_in_order() {
        let state = GameState::new(["ann", "ben", "cat"]);
        assert_eq!(state.player_count(), 3);
        assert_eq!(state.player_by_name("ben"), Some(PlayerId::new(1)));
        assert_eq!(state.player_by_name("dan"), None);
        assert_eq!(state.phase, GamePhase::Setup);
    }

    #[test]
    fn test_winner_needs_unique_leader_over_threshold() {
        let mut state = GameState::new(["ann", "ben", "cat"]);
        state.players[PlayerId::new(0)].points = 14;
        assert_eq!(state.winner(15), None);

        state.players[PlayerId::new(0)].points = 15;
        state.players[PlayerId::new(1)].points = 15;
        assert_eq!(state.winner(15), None);

        state.players[PlayerId::new(1)].points = 17;
        assert_eq!(state.winner(15), Some(PlayerId::new(1)));
    }

    #[test]
    fn test_remove_from_hand() {
        let mut player = Player::new(PlayerId::new(0), "ann");
        player.hand = vec![EntityId(1), EntityId(2)];
        assert!(player.remove_from_hand(EntityId(1)));
        assert!(!player.remove_from_hand(EntityId(1)));
        assert_eq!(player.hand, vec![EntityId(2)]);
    }
}
