//! Intent instances.
//!
//! An `Intent` is one event flowing through the router: a concrete
//! `IntentKind` with its parameters, plus the cancellation flag. Intents are
//! created by the engine or by handlers, live for one dispatch, and are
//! never stored.

use serde::{Deserialize, Serialize};

use super::hierarchy::IntentType;
use crate::core::{EntityId, PlayerId};

/// A concrete intent and its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    StartTurn { player: PlayerId },
    EndTurn { player: PlayerId },

    PlayMinion { minion: EntityId, base: EntityId },
    DestroyMinion { minion: EntityId },
    ReturnMinionToHand { minion: EntityId },
    PlaceMinionOnDeckTop { minion: EntityId },
    PlaceMinionOnDeckBottom { minion: EntityId },
    MoveMinion { minion: EntityId, base: EntityId },
    ModifyMinionPower { minion: EntityId, off: i32 },
    ResolveMinionAbility { minion: EntityId },

    PlayActionOnBase { action: EntityId, base: EntityId },
    PlayActionOnMinion { action: EntityId, minion: EntityId },
    PlayActionOnField { action: EntityId },
    DestroyAction { action: EntityId },
    ReturnActionToHand { action: EntityId },
    PlaceActionOnDeckTop { action: EntityId },
    PlaceActionOnDeckBottom { action: EntityId },
    ResolveActionAbility { action: EntityId },

    ChangeCardController { card: EntityId, new_controller: PlayerId },

    PlayBase { base: EntityId },
    ScoreBase { base: EntityId },
    RemoveBase { base: EntityId },
    ModifyBasePowerThreshold { base: EntityId, off: i32 },
}

impl IntentKind {
    #[must_use]
    pub fn intent_type(&self) -> IntentType {
        use IntentKind as K;
        match self {
            K::StartTurn { .. } => IntentType::StartTurn,
            K::EndTurn { .. } => IntentType::EndTurn,
            K::PlayMinion { .. } => IntentType::PlayMinion,
            K::DestroyMinion { .. } => IntentType::DestroyMinion,
            K::ReturnMinionToHand { .. } => IntentType::ReturnMinionToHand,
            K::PlaceMinionOnDeckTop { .. } => IntentType::PlaceMinionOnDeckTop,
            K::PlaceMinionOnDeckBottom { .. } => IntentType::PlaceMinionOnDeckBottom,
            K::MoveMinion { .. } => IntentType::MoveMinion,
            K::ModifyMinionPower { .. } => IntentType::ModifyMinionPower,
            K::ResolveMinionAbility { .. } => IntentType::ResolveMinionAbility,
            K::PlayActionOnBase { .. } => IntentType::PlayActionOnBase,
            K::PlayActionOnMinion { .. } => IntentType::PlayActionOnMinion,
            K::PlayActionOnField { .. } => IntentType::PlayActionOnField,
            K::DestroyAction { .. } => IntentType::DestroyAction,
            K::ReturnActionToHand { .. } => IntentType::ReturnActionToHand,
            K::PlaceActionOnDeckTop { .. } => IntentType::PlaceActionOnDeckTop,
            K::PlaceActionOnDeckBottom { .. } => IntentType::PlaceActionOnDeckBottom,
            K::ResolveActionAbility { .. } => IntentType::ResolveActionAbility,
            K::ChangeCardController { .. } => IntentType::ChangeCardController,
            K::PlayBase { .. } => IntentType::PlayBase,
            K::ScoreBase { .. } => IntentType::ScoreBase,
            K::RemoveBase { .. } => IntentType::RemoveBase,
            K::ModifyBasePowerThreshold { .. } => IntentType::ModifyBasePowerThreshold,
        }
    }

    /// The minion this intent is about, if any.
    ///
    /// For `PlayActionOnMinion` this is the target minion.
    #[must_use]
    pub fn minion(&self) -> Option<EntityId> {
        use IntentKind as K;
        match *self {
            K::PlayMinion { minion, .. }
            | K::DestroyMinion { minion }
            | K::ReturnMinionToHand { minion }
            | K::PlaceMinionOnDeckTop { minion }
            | K::PlaceMinionOnDeckBottom { minion }
            | K::MoveMinion { minion, .. }
            | K::ModifyMinionPower { minion, .. }
            | K::ResolveMinionAbility { minion }
            | K::PlayActionOnMinion { minion, .. } => Some(minion),
            _ => None,
        }
    }

    /// The action card this intent is about, if any.
    #[must_use]
    pub fn action(&self) -> Option<EntityId> {
        use IntentKind as K;
        match *self {
            K::PlayActionOnBase { action, .. }
            | K::PlayActionOnMinion { action, .. }
            | K::PlayActionOnField { action }
            | K::DestroyAction { action }
            | K::ReturnActionToHand { action }
            | K::PlaceActionOnDeckTop { action }
            | K::PlaceActionOnDeckBottom { action }
            | K::ResolveActionAbility { action } => Some(action),
            _ => None,
        }
    }

    /// The card being played, moved, removed or resolved.
    ///
    /// Actions take precedence over their target minion.
    #[must_use]
    pub fn card(&self) -> Option<EntityId> {
        match *self {
            IntentKind::ChangeCardController { card, .. } => Some(card),
            _ => self.action().or_else(|| self.minion()),
        }
    }

    /// The base this intent is about, if any.
    #[must_use]
    pub fn base(&self) -> Option<EntityId> {
        use IntentKind as K;
        match *self {
            K::PlayMinion { base, .. }
            | K::MoveMinion { base, .. }
            | K::PlayActionOnBase { base, .. }
            | K::PlayBase { base }
            | K::ScoreBase { base }
            | K::RemoveBase { base }
            | K::ModifyBasePowerThreshold { base, .. } => Some(base),
            _ => None,
        }
    }

    /// The player this intent is about, if any.
    #[must_use]
    pub fn player(&self) -> Option<PlayerId> {
        match *self {
            IntentKind::StartTurn { player } | IntentKind::EndTurn { player } => Some(player),
            IntentKind::ChangeCardController { new_controller, .. } => Some(new_controller),
            _ => None,
        }
    }
}

/// An intent being dispatched.
///
/// ```
/// use rust_ccg_server::core::EntityId;
/// use rust_ccg_server::intents::{Intent, IntentKind, IntentType};
///
/// let mut intent = Intent::new(IntentKind::DestroyMinion { minion: EntityId(4) });
/// assert!(intent.is(IntentType::AffectMinion));
///
/// intent.cancel();
/// intent.cancel();
/// assert!(intent.is_cancelled());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    kind: IntentKind,
    cancelled: bool,
}

impl Intent {
    #[must_use]
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            cancelled: false,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &IntentKind {
        &self.kind
    }

    /// Rewrite the parameters. Meant for cancel-and-modify handlers.
    pub fn kind_mut(&mut self) -> &mut IntentKind {
        &mut self.kind
    }

    /// Mark the intent cancelled. There is no way back.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    #[must_use]
    pub fn intent_type(&self) -> IntentType {
        self.kind.intent_type()
    }

    /// Whether this intent's type is `t` or specializes it.
    #[must_use]
    pub fn is(&self, t: IntentType) -> bool {
        self.intent_type().is_a(t)
    }
}

impl From<IntentKind> for Intent {
    fn from(kind: IntentKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_queries() {
        let play = IntentKind::PlayActionOnMinion {
            action: EntityId(1),
            minion: EntityId(2),
        };
        assert_eq!(play.action(), Some(EntityId(1)));
        assert_eq!(play.minion(), Some(EntityId(2)));
        assert_eq!(play.card(), Some(EntityId(1)));
        assert_eq!(play.base(), None);

        let score = IntentKind::ScoreBase { base: EntityId(0) };
        assert_eq!(score.base(), Some(EntityId(0)));
        assert_eq!(score.card(), None);

        let end = IntentKind::EndTurn {
            player: PlayerId::new(1),
        };
        assert_eq!(end.player(), Some(PlayerId::new(1)));
    }

    #[test]
    fn test_concrete_kinds_are_not_abstract() {
        let kinds = [
            IntentKind::StartTurn { player: PlayerId::new(0) },
            IntentKind::MoveMinion { minion: EntityId(1), base: EntityId(2) },
            IntentKind::PlaceActionOnDeckTop { action: EntityId(3) },
            IntentKind::ModifyBasePowerThreshold { base: EntityId(0), off: -2 },
        ];
        for kind in kinds {
            assert!(!kind.intent_type().is_abstract());
        }
    }

    #[test]
    fn test_kind_mut_rewrites_parameters() {
        let mut intent = Intent::new(IntentKind::ModifyMinionPower {
            minion: EntityId(3),
            off: -4,
        });
        if let IntentKind::ModifyMinionPower { off, .. } = intent.kind_mut() {
            *off = -1;
        }
        assert_eq!(
            *intent.kind(),
            IntentKind::ModifyMinionPower {
                minion: EntityId(3),
                off: -1
            }
        );
        assert!(!intent.is_cancelled());
    }
}
