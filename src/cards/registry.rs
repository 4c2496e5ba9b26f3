//! Card store for instance lookup.
//!
//! The `CardStore` owns every `Card` and `Base` instantiated for a game and
//! hands out their ids. Lookup is by `EntityId`; iteration follows
//! allocation order so rosters sent to clients are stable.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::definition::CardDefinition;
use super::instance::{Base, Card};
use crate::core::{EntityAllocator, EntityId, PlayerId};

/// Owner of all card and base instances in one game.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use rust_ccg_server::cards::{CardDefinition, CardStore};
/// use rust_ccg_server::core::PlayerId;
///
/// let mut store = CardStore::new();
/// let rex = store.add_card(PlayerId::new(0), Arc::new(CardDefinition::minion("King Rex", 7)));
///
/// assert_eq!(store.card(rex).unwrap().name(), "King Rex");
/// assert!(store.base(rex).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardStore {
    ids: EntityAllocator,
    cards: FxHashMap<EntityId, Card>,
    bases: FxHashMap<EntityId, Base>,
    order: Vec<EntityId>,
}

impl CardStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate a minion or action owned by `owner`.
    pub fn add_card(&mut self, owner: PlayerId, definition: Arc<CardDefinition>) -> EntityId {
        let id = self.ids.alloc();
        self.cards.insert(id, Card::new(id, owner, definition));
        self.order.push(id);
        id
    }

    /// Instantiate a base.
    pub fn add_base(&mut self, definition: Arc<CardDefinition>) -> EntityId {
        let id = self.ids.alloc();
        self.bases.insert(id, Base::new(id, definition));
        self.order.push(id);
        id
    }

    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn card_mut(&mut self, id: EntityId) -> Option<&mut Card> {
        self.cards.get_mut(&id)
    }

    #[must_use]
    pub fn base(&self, id: EntityId) -> Option<&Base> {
        self.bases.get(&id)
    }

    pub fn base_mut(&mut self, id: EntityId) -> Option<&mut Base> {
        self.bases.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.cards.contains_key(&id) || self.bases.contains_key(&id)
    }

    /// Name of any card or base.
    #[must_use]
    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.card(id)
            .map(Card::name)
            .or_else(|| self.base(id).map(Base::name))
    }

    /// Total effective power of the minions on a base.
    ///
    /// Returns 0 for bases not in play.
    #[must_use]
    pub fn base_power(&self, base: EntityId) -> i32 {
        self.base(base)
            .map(|b| {
                b.state
                    .minions()
                    .iter()
                    .filter_map(|m| self.card(*m))
                    .filter_map(|c| c.state.effective_power())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// All ids in allocation order.
    pub fn roster(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.order.iter().filter_map(|id| self.cards.get(id))
    }

    pub fn bases(&self) -> impl Iterator<Item = &Base> {
        self.order.iter().filter_map(|id| self.bases.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
