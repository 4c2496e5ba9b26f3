//! Card instances - runtime card state.
//!
//! `Card` and `Base` are specific physical cards in one game. Each holds a
//! shared pointer to its definition, its current state, and the ability
//! handler built for it at setup. The handler is kept here while the card
//! is out of play and registered with the router while it is in play.

use std::fmt;
use std::sync::Arc;

use super::definition::CardDefinition;
use super::state::{BaseState, CardState};
use crate::core::{EntityId, PlayerId};
use crate::intents::AbilityHandler;

/// A minion or action card in a game.
#[derive(Clone)]
pub struct Card {
    pub id: EntityId,

    /// Player whose deck the card came from. Never changes; control can.
    pub owner: PlayerId,

    pub definition: Arc<CardDefinition>,

    pub state: CardState,

    pub handler: Option<Arc<dyn AbilityHandler>>,
}

impl Card {
    #[must_use]
    pub fn new(id: EntityId, owner: PlayerId, definition: Arc<CardDefinition>) -> Self {
        let handler = definition.build_handler(id);
        Self {
            id,
            owner,
            definition,
            state: CardState::InDeck,
            handler,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    #[must_use]
    pub fn is_minion(&self) -> bool {
        self.definition.kind.is_minion()
    }

    #[must_use]
    pub fn is_action(&self) -> bool {
        self.definition.kind.is_action()
    }

    /// Controller while in play, otherwise the owner.
    #[must_use]
    pub fn controller(&self) -> PlayerId {
        self.state.controller().unwrap_or(self.owner)
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("id", &self.id)
            .field("name", &self.definition.name)
            .field("owner", &self.owner)
            .field("state", &self.state)
            .finish()
    }
}

/// A base card in a game. Bases come from the shared base deck and have no
/// owner.
#[derive(Clone)]
pub struct Base {
    pub id: EntityId,
    pub definition: Arc<CardDefinition>,
    pub state: BaseState,
    pub handler: Option<Arc<dyn AbilityHandler>>,
}

impl Base {
    #[must_use]
    pub fn new(id: EntityId, definition: Arc<CardDefinition>) -> Self {
        let handler = definition.build_handler(id);
        Self {
            id,
            definition,
            state: BaseState::InDeck,
            handler,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Printed threshold, before any modification in play.
    #[must_use]
    pub fn printed_threshold(&self) -> i32 {
        match self.definition.kind {
            super::CardKind::Base {
                power_threshold, ..
            } => power_threshold,
            _ => 0,
        }
    }

    /// Points for first, second and third place.
    #[must_use]
    pub fn award_points(&self) -> [u32; 3] {
        match self.definition.kind {
            super::CardKind::Base { award_points, .. } => award_points,
            _ => [0; 3],
        }
    }
}

impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Base")
            .field("id", &self.id)
            .field("name", &self.definition.name)
            .field("state", &self.state)
            .finish()
    }
}
