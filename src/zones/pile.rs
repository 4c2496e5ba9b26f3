//! Ordered card piles.
//!
//! A `Pile` is a stack of card ids: decks and discards for players, and the
//! shared base deck and base discard. The top of the pile is the end of the
//! backing `Vec`, so drawing is O(1); putting a card on the bottom shifts.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GameRng};

/// Where a card goes when placed into a pile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PilePosition {
    Top,
    Bottom,
}

/// An ordered stack of cards.
///
/// ```
/// use rust_ccg_server::core::EntityId;
/// use rust_ccg_server::zones::Pile;
///
/// let mut deck = Pile::from_bottom_up([EntityId(1), EntityId(2)]);
/// deck.push_bottom(EntityId(0));
/// assert_eq!(deck.pop_top(), Some(EntityId(2)));
/// assert_eq!(deck.pop_top(), Some(EntityId(1)));
/// assert_eq!(deck.pop_top(), Some(EntityId(0)));
/// assert!(deck.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pile {
    cards: Vec<EntityId>,
}

impl Pile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pile whose last item ends up on top.
    pub fn from_bottom_up(cards: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn push_top(&mut self, card: EntityId) {
        self.cards.push(card);
    }

    pub fn push_bottom(&mut self, card: EntityId) {
        self.cards.insert(0, card);
    }

    pub fn push(&mut self, card: EntityId, position: PilePosition) {
        match position {
            PilePosition::Top => self.push_top(card),
            PilePosition::Bottom => self.push_bottom(card),
        }
    }

    pub fn pop_top(&mut self) -> Option<EntityId> {
        self.cards.pop()
    }

    #[must_use]
    pub fn peek_top(&self) -> Option<EntityId> {
        self.cards.last().copied()
    }

    /// Remove a specific card wherever it is. Returns whether it was found.
    pub fn remove(&mut self, card: EntityId) -> bool {
        match self.cards.iter().position(|c| *c == card) {
            Some(index) => {
                self.cards.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn contains(&self, card: EntityId) -> bool {
        self.cards.contains(&card)
    }

    pub fn shuffle(&mut self, rng: &mut GameRng) {
        rng.shuffle(&mut self.cards);
    }

    /// Empty the pile, returning its cards bottom first.
    pub fn take_all(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.cards)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.cards.iter().copied()
    }
}
