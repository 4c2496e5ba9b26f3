//! Card definitions - static card data.
//!
//! `CardDefinition` holds the immutable properties of a card type: its
//! name, rules text, printed stats and the factory that builds its ability
//! handler. Everything that changes during a game lives in `Card`/`Base`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::EntityId;
use crate::intents::AbilityHandler;

/// What an action card must be played onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionTarget {
    /// Any base in play.
    Base,
    /// Any minion in play.
    Minion,
    /// A minion in play controlled by the player.
    OwnMinion,
    /// Nothing; the action resolves and goes to the discard.
    None,
}

impl ActionTarget {
    /// Whether playing the action requires a target id.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        !matches!(self, ActionTarget::None)
    }
}

/// Printed card type and stats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    Minion { power: i32 },
    Action { target: ActionTarget },
    Base { power_threshold: i32, award_points: [u32; 3] },
}

impl CardKind {
    #[must_use]
    pub fn is_minion(&self) -> bool {
        matches!(self, CardKind::Minion { .. })
    }

    #[must_use]
    pub fn is_action(&self) -> bool {
        matches!(self, CardKind::Action { .. })
    }

    #[must_use]
    pub fn is_base(&self) -> bool {
        matches!(self, CardKind::Base { .. })
    }
}

/// Builds a fresh ability handler for the card instance with the given id.
pub type AbilityFactory = Arc<dyn Fn(EntityId) -> Arc<dyn AbilityHandler> + Send + Sync>;

/// Static card definition.
///
/// ## Example
///
/// ```
/// use rust_ccg_server::cards::{ActionTarget, CardDefinition};
///
/// let rex = CardDefinition::minion("King Rex", 7).with_text("A big dinosaur.");
/// let howl = CardDefinition::action("Howl", ActionTarget::None);
///
/// assert_eq!(rex.minion_power(), Some(7));
/// assert!(howl.ability.is_none());
/// ```
#[derive(Clone)]
pub struct CardDefinition {
    pub name: String,

    /// Rules text shown to players.
    pub text: String,

    pub kind: CardKind,

    /// `None` for vanilla cards.
    pub ability: Option<AbilityFactory>,
}

impl CardDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CardKind) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            kind,
            ability: None,
        }
    }

    #[must_use]
    pub fn minion(name: impl Into<String>, power: i32) -> Self {
        Self::new(name, CardKind::Minion { power })
    }

    #[must_use]
    pub fn action(name: impl Into<String>, target: ActionTarget) -> Self {
        Self::new(name, CardKind::Action { target })
    }

    #[must_use]
    pub fn base(name: impl Into<String>, power_threshold: i32, award_points: [u32; 3]) -> Self {
        Self::new(
            name,
            CardKind::Base {
                power_threshold,
                award_points,
            },
        )
    }

    /// Set the rules text (builder pattern).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Attach an ability (builder pattern).
    #[must_use]
    pub fn with_ability<F>(mut self, factory: F) -> Self
    where
        F: Fn(EntityId) -> Arc<dyn AbilityHandler> + Send + Sync + 'static,
    {
        self.ability = Some(Arc::new(factory));
        self
    }

    /// Build this card's handler for one instance, if it has an ability.
    #[must_use]
    pub fn build_handler(&self, id: EntityId) -> Option<Arc<dyn AbilityHandler>> {
        self.ability.as_ref().map(|factory| factory(id))
    }

    #[must_use]
    pub fn minion_power(&self) -> Option<i32> {
        match self.kind {
            CardKind::Minion { power } => Some(power),
            _ => None,
        }
    }

    #[must_use]
    pub fn action_target(&self) -> Option<ActionTarget> {
        match self.kind {
            CardKind::Action { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Debug for CardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("ability", &self.ability.is_some())
            .finish()
    }
}

/// A named set of cards dealt to a player: bases go to the shared base
/// deck, everything else to the player's own deck.
#[derive(Clone, Debug)]
pub struct Deck {
    pub name: String,
    pub bases: Vec<Arc<CardDefinition>>,
    pub cards: Vec<Arc<CardDefinition>>,
}

impl Deck {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            cards: Vec::new(),
        }
    }

    /// Add a card or base; bases are routed to the base list.
    #[must_use]
    pub fn with(mut self, definition: CardDefinition) -> Self {
        self.push(definition);
        self
    }

    /// Add `count` copies of a card.
    #[must_use]
    pub fn with_copies(mut self, definition: CardDefinition, count: usize) -> Self {
        let shared = Arc::new(definition);
        for _ in 0..count {
            self.push_shared(Arc::clone(&shared));
        }
        self
    }

    pub fn push(&mut self, definition: CardDefinition) {
        self.push_shared(Arc::new(definition));
    }

    fn push_shared(&mut self, definition: Arc<CardDefinition>) {
        if definition.kind.is_base() {
            self.bases.push(definition);
        } else {
            self.cards.push(definition);
        }
    }
}
