//! Where a card or base currently is, and what that position carries.
//!
//! A card is in exactly one state at a time. In-play states record the
//! controller and what the card is attached to; the matching base or minion
//! records the card back in its own list, and the engine keeps the two
//! directions consistent.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

/// State of a non-base card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    InDeck,
    InHand,
    InDiscard,

    /// An action played onto a base.
    OnBase { controller: PlayerId, base: EntityId },

    /// An action played onto a minion.
    OnMinion { controller: PlayerId, minion: EntityId },

    /// A minion in play. `actions` lists the actions attached to it.
    MinionOnBase {
        controller: PlayerId,
        base: EntityId,
        raw_power: i32,
        actions: Vec<EntityId>,
    },

    /// An untargeted action while its own play resolves.
    Resolving { controller: PlayerId },
}

impl CardState {
    #[must_use]
    pub fn is_in_play(&self) -> bool {
        matches!(
            self,
            CardState::OnBase { .. }
                | CardState::OnMinion { .. }
                | CardState::MinionOnBase { .. }
                | CardState::Resolving { .. }
        )
    }

    #[must_use]
    pub fn controller(&self) -> Option<PlayerId> {
        match self {
            CardState::OnBase { controller, .. }
            | CardState::OnMinion { controller, .. }
            | CardState::MinionOnBase { controller, .. }
            | CardState::Resolving { controller } => Some(*controller),
            _ => None,
        }
    }

    /// The base a minion or base-action sits on.
    #[must_use]
    pub fn base(&self) -> Option<EntityId> {
        match self {
            CardState::OnBase { base, .. } | CardState::MinionOnBase { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// Power contributed to a base. Negative raw power counts as zero.
    ///
    /// ```
    /// use rust_ccg_server::cards::CardState;
    /// use rust_ccg_server::core::{EntityId, PlayerId};
    ///
    /// let weakened = CardState::MinionOnBase {
    ///     controller: PlayerId::new(0),
    ///     base: EntityId(9),
    ///     raw_power: -3,
    ///     actions: vec![],
    /// };
    /// assert_eq!(weakened.effective_power(), Some(0));
    /// assert_eq!(CardState::InHand.effective_power(), None);
    /// ```
    #[must_use]
    pub fn effective_power(&self) -> Option<i32> {
        match self {
            CardState::MinionOnBase { raw_power, .. } => Some((*raw_power).max(0)),
            _ => None,
        }
    }

    /// Actions attached to a minion in play.
    #[must_use]
    pub fn attached_actions(&self) -> &[EntityId] {
        match self {
            CardState::MinionOnBase { actions, .. } => actions,
            _ => &[],
        }
    }
}

/// State of a base card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseState {
    InDeck,
    InDiscard,
    InPlay {
        power_threshold: i32,
        minions: Vec<EntityId>,
        actions: Vec<EntityId>,
    },
}

impl BaseState {
    #[must_use]
    pub fn is_in_play(&self) -> bool {
        matches!(self, BaseState::InPlay { .. })
    }

    #[must_use]
    pub fn minions(&self) -> &[EntityId] {
        match self {
            BaseState::InPlay { minions, .. } => minions,
            _ => &[],
        }
    }

    #[must_use]
    pub fn actions(&self) -> &[EntityId] {
        match self {
            BaseState::InPlay { actions, .. } => actions,
            _ => &[],
        }
    }

    #[must_use]
    pub fn power_threshold(&self) -> Option<i32> {
        match self {
            BaseState::InPlay {
                power_threshold, ..
            } => Some(*power_threshold),
            _ => None,
        }
    }
}
