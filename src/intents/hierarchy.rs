//! The intent type hierarchy.
//!
//! Every intent has one concrete `IntentType`. Concrete types specialize one
//! or more abstract groupings (`DestroyMinion` is both a
//! `RemoveMinionFromPlay` and a `DestroyCard`), and everything descends from
//! `Any`. Handlers declare interest in any type, abstract or concrete, and
//! receive every intent whose concrete type has it among its ancestors.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Concrete and abstract intent types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntentType {
    Any,

    // Abstract groupings
    PlayCard,
    PlayAction,
    RemoveCardFromPlay,
    DestroyCard,
    PlaceCardOnDeck,
    PlaceCardOnDeckTop,
    PlaceCardOnDeckBottom,
    ReturnCardToHand,
    ResolveCardAbility,
    AffectMinion,
    RemoveMinionFromPlay,
    PlaceMinionOnDeck,
    RemoveActionFromPlay,
    PlaceActionOnDeck,

    // Turns
    StartTurn,
    EndTurn,

    // Minions
    PlayMinion,
    DestroyMinion,
    ReturnMinionToHand,
    PlaceMinionOnDeckTop,
    PlaceMinionOnDeckBottom,
    MoveMinion,
    ModifyMinionPower,
    ResolveMinionAbility,

    // Actions
    PlayActionOnBase,
    PlayActionOnMinion,
    PlayActionOnField,
    DestroyAction,
    ReturnActionToHand,
    PlaceActionOnDeckTop,
    PlaceActionOnDeckBottom,
    ResolveActionAbility,

    ChangeCardController,

    // Bases
    PlayBase,
    ScoreBase,
    RemoveBase,
    ModifyBasePowerThreshold,
}

/// Ancestor list; no type in the hierarchy has more than a handful.
pub type Ancestors = SmallVec<[IntentType; 8]>;

impl IntentType {
    /// Direct parents. Only `Any` has none.
    #[must_use]
    pub fn parents(self) -> &'static [IntentType] {
        use IntentType::*;
        match self {
            Any => &[],

            PlayCard | RemoveCardFromPlay | ResolveCardAbility | AffectMinion => &[Any],
            PlayAction => &[PlayCard],
            DestroyCard | PlaceCardOnDeck | ReturnCardToHand => &[RemoveCardFromPlay],
            PlaceCardOnDeckTop | PlaceCardOnDeckBottom => &[PlaceCardOnDeck],
            RemoveMinionFromPlay => &[RemoveCardFromPlay, AffectMinion],
            PlaceMinionOnDeck => &[RemoveMinionFromPlay, PlaceCardOnDeck],
            RemoveActionFromPlay => &[RemoveCardFromPlay],
            PlaceActionOnDeck => &[RemoveActionFromPlay, PlaceCardOnDeck],

            StartTurn | EndTurn => &[Any],

            PlayMinion => &[PlayCard],
            DestroyMinion => &[RemoveMinionFromPlay, DestroyCard],
            ReturnMinionToHand => &[RemoveMinionFromPlay, ReturnCardToHand],
            PlaceMinionOnDeckTop => &[PlaceMinionOnDeck, PlaceCardOnDeckTop],
            PlaceMinionOnDeckBottom => &[PlaceMinionOnDeck, PlaceCardOnDeckBottom],
            MoveMinion => &[AffectMinion],
            // Power changes are deliberately outside AffectMinion: protection
            // effects don't block buffs and debuffs.
            ModifyMinionPower => &[Any],
            ResolveMinionAbility => &[ResolveCardAbility],

            PlayActionOnBase | PlayActionOnMinion | PlayActionOnField => &[PlayAction],
            DestroyAction => &[RemoveActionFromPlay, DestroyCard],
            ReturnActionToHand => &[RemoveActionFromPlay, ReturnCardToHand],
            PlaceActionOnDeckTop => &[PlaceActionOnDeck, PlaceCardOnDeckTop],
            PlaceActionOnDeckBottom => &[PlaceActionOnDeck, PlaceCardOnDeckBottom],
            ResolveActionAbility => &[ResolveCardAbility],

            ChangeCardController => &[Any],

            PlayBase | ScoreBase | RemoveBase | ModifyBasePowerThreshold => &[Any],
        }
    }

    /// This type followed by every transitive ancestor, each listed once.
    ///
    /// ```
    /// use rust_ccg_server::intents::IntentType;
    ///
    /// let chain = IntentType::DestroyMinion.ancestors_or_self();
    /// assert_eq!(chain[0], IntentType::DestroyMinion);
    /// assert!(chain.contains(&IntentType::AffectMinion));
    /// assert!(chain.contains(&IntentType::DestroyCard));
    /// assert_eq!(chain.iter().filter(|t| **t == IntentType::RemoveCardFromPlay).count(), 1);
    /// ```
    #[must_use]
    pub fn ancestors_or_self(self) -> Ancestors {
        let mut out = Ancestors::new();
        let mut stack: SmallVec<[IntentType; 8]> = SmallVec::new();
        stack.push(self);
        while let Some(t) = stack.pop() {
            if out.contains(&t) {
                continue;
            }
            out.push(t);
            for parent in t.parents().iter().rev() {
                stack.push(*parent);
            }
        }
        out
    }

    /// Whether `self` is `other` or a descendant of it.
    #[must_use]
    pub fn is_a(self, other: IntentType) -> bool {
        self == other || self.ancestors_or_self().contains(&other)
    }

    /// Abstract types group others and are never instantiated.
    #[must_use]
    pub fn is_abstract(self) -> bool {
        use IntentType::*;
        matches!(
            self,
            Any | PlayCard
                | PlayAction
                | RemoveCardFromPlay
                | DestroyCard
                | PlaceCardOnDeck
                | PlaceCardOnDeckTop
                | PlaceCardOnDeckBottom
                | ReturnCardToHand
                | ResolveCardAbility
                | AffectMinion
                | RemoveMinionFromPlay
                | PlaceMinionOnDeck
                | RemoveActionFromPlay
                | PlaceActionOnDeck
        )
    }
}
