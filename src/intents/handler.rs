//! The ability handler contract.
//!
//! Cards and bases with abilities implement `AbilityHandler`. For each
//! intent the router asks every interested handler which tiers it wants to
//! run in, then calls `invoke` once per requested callback, in tier order.
//! A handler changes the game only through the `AbilityContext` it is given.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::hierarchy::IntentType;
use super::intent::Intent;
use super::tier::Tier;
use crate::core::EngineError;
use crate::engine::{AbilityContext, GameState};

/// Identifier handed out by the router for each registration.
///
/// Ids grow monotonically, so ordering by id is ordering by registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerId(pub u32);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler({})", self.0)
    }
}

/// One requested invocation: a tier, and a handler-defined slot to tell
/// several callbacks in the same tier apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Callback {
    pub tier: Tier,
    pub slot: u8,
}

impl Callback {
    #[must_use]
    pub const fn new(tier: Tier) -> Self {
        Self { tier, slot: 0 }
    }
}

/// The callbacks a handler wants for one intent.
///
/// ```
/// use rust_ccg_server::intents::{Callbacks, Tier};
///
/// let wanted = Callbacks::at(Tier::PreResolve).and(Tier::PostResolve);
/// assert_eq!(wanted.len(), 2);
/// assert!(Callbacks::none().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Callbacks(SmallVec<[Callback; 4]>);

impl Callbacks {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(tier: Tier) -> Self {
        Self::none().and(tier)
    }

    #[must_use]
    pub fn and(self, tier: Tier) -> Self {
        self.and_slot(tier, 0)
    }

    #[must_use]
    pub fn and_slot(mut self, tier: Tier, slot: u8) -> Self {
        self.0.push(Callback { tier, slot });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Callback> + '_ {
        self.0.iter().copied()
    }
}

/// Behaviour a card or base contributes to intent resolution.
pub trait AbilityHandler: Send + Sync {
    /// Intent types this handler listens for. Abstract types match every
    /// specialization.
    fn interests(&self) -> &[IntentType];

    /// Which tiers to run in for this intent, given the state at dispatch.
    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks;

    /// Run one callback.
    fn invoke(
        &self,
        callback: Callback,
        intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError>;
}
