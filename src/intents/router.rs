//! Intent router.
//!
//! The router stores handler registrations indexed by the intent types they
//! declared, and turns an intent into a `DispatchPlan`: every interested
//! handler's callbacks, ordered by tier and then by registration.
//!
//! ## Dispatch
//!
//! `DispatchPlan::execute` walks the plan against a live `Game`:
//!
//! 1. Callbacks run in ascending tier order. Within a tier, earlier
//!    registrations run first.
//! 2. The engine's own state change for the intent is applied right before
//!    the first `Resolve`-or-later callback (or at the end if there is none).
//! 3. A callback whose handler was unregistered after planning is skipped.
//! 4. As soon as the intent is cancelled, dispatch stops. Cancelling outside
//!    the two cancel tiers is a handler defect and is logged.
//!
//! Handlers emit nested intents through the engine while they run; each
//! nested intent is planned and executed to completion before control
//! returns, so resolution is depth-first.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{trace, warn};

use super::handler::{AbilityHandler, Callback, HandlerId};
use super::hierarchy::IntentType;
use super::intent::Intent;
use super::tier::Tier;
use crate::core::{EngineError, EntityId};
use crate::engine::{AbilityContext, Game, GameState};

struct Registration {
    handler: Arc<dyn AbilityHandler>,
    interests: SmallVec<[IntentType; 4]>,
    source: Option<EntityId>,
}

/// Registry of ability handlers.
#[derive(Default)]
pub struct IntentRouter {
    handlers: FxHashMap<HandlerId, Registration>,
    by_type: FxHashMap<IntentType, Vec<HandlerId>>,
    by_source: FxHashMap<EntityId, Vec<HandlerId>>,
    next_id: u32,
}

impl IntentRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler not tied to any card.
    pub fn register(&mut self, handler: Arc<dyn AbilityHandler>) -> HandlerId {
        self.insert(handler, None)
    }

    /// Register a handler on behalf of a card or base, so it can be removed
    /// with `remove_for_source` when that entity leaves play.
    pub fn register_for(&mut self, source: EntityId, handler: Arc<dyn AbilityHandler>) -> HandlerId {
        self.insert(handler, Some(source))
    }

    fn insert(&mut self, handler: Arc<dyn AbilityHandler>, source: Option<EntityId>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        let mut interests: SmallVec<[IntentType; 4]> = SmallVec::new();
        for t in handler.interests() {
            if !interests.contains(t) {
                interests.push(*t);
            }
        }
        for t in &interests {
            self.by_type.entry(*t).or_default().push(id);
        }
        if let Some(source) = source {
            self.by_source.entry(source).or_default().push(id);
        }
        trace!(target: "ccg::router", handler = %id, ?source, "handler.registered");

        self.handlers.insert(
            id,
            Registration {
                handler,
                interests,
                source,
            },
        );
        id
    }

    /// Remove a registration. Returns whether it existed.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let Some(registration) = self.handlers.remove(&id) else {
            return false;
        };
        for t in &registration.interests {
            if let Some(ids) = self.by_type.get_mut(t) {
                ids.retain(|h| *h != id);
                if ids.is_empty() {
                    self.by_type.remove(t);
                }
            }
        }
        if let Some(source) = registration.source {
            if let Some(ids) = self.by_source.get_mut(&source) {
                ids.retain(|h| *h != id);
                if ids.is_empty() {
                    self.by_source.remove(&source);
                }
            }
        }
        trace!(target: "ccg::router", handler = %id, "handler.unregistered");
        true
    }

    /// Remove every registration made on behalf of `source`.
    ///
    /// Returns how many were removed.
    pub fn remove_for_source(&mut self, source: EntityId) -> usize {
        let ids = self.by_source.remove(&source).unwrap_or_default();
        ids.into_iter().filter(|id| self.unregister(*id)).count()
    }

    #[must_use]
    pub fn is_registered(&self, id: HandlerId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Whether `source` currently has any registered handler.
    #[must_use]
    pub fn has_source(&self, source: EntityId) -> bool {
        self.by_source.contains_key(&source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers interested in the intent's type or any of its ancestors,
    /// in registration order.
    fn interested(&self, intent_type: IntentType) -> Vec<HandlerId> {
        let mut ids: Vec<HandlerId> = intent_type
            .ancestors_or_self()
            .iter()
            .filter_map(|t| self.by_type.get(t))
            .flatten()
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Collect and order the callbacks for one intent.
    #[must_use]
    pub fn plan(&self, intent: &Intent, state: &GameState) -> DispatchPlan {
        let mut steps = Vec::new();
        for id in self.interested(intent.intent_type()) {
            let Some(registration) = self.handlers.get(&id) else {
                continue;
            };
            for callback in registration.handler.callbacks(intent, state).iter() {
                steps.push(Step {
                    handler_id: id,
                    handler: Arc::clone(&registration.handler),
                    source: registration.source,
                    callback,
                });
            }
        }
        // Stable: equal tiers keep registration order.
        steps.sort_by_key(|s| s.callback.tier);
        DispatchPlan { steps }
    }
}

impl std::fmt::Debug for IntentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRouter")
            .field("handlers", &self.handlers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

struct Step {
    handler_id: HandlerId,
    handler: Arc<dyn AbilityHandler>,
    source: Option<EntityId>,
    callback: Callback,
}

/// The ordered callbacks for one intent.
pub struct DispatchPlan {
    steps: Vec<Step>,
}

impl DispatchPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Tiers of the planned callbacks, in execution order.
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.steps.iter().map(|s| s.callback.tier)
    }

    /// Run the plan against the game. See the module docs for the rules.
    pub fn execute(self, intent: &mut Intent, game: &mut Game) -> Result<(), EngineError> {
        let mut core_applied = false;

        for step in self.steps {
            if !core_applied && step.callback.tier >= Tier::Resolve {
                game.resolve_core(intent)?;
                core_applied = true;
            }
            if !game.router().is_registered(step.handler_id) {
                trace!(
                    target: "ccg::router",
                    handler = %step.handler_id,
                    "callback.skipped=unregistered"
                );
                continue;
            }

            let mut ctx = AbilityContext::new(game, step.source);
            step.handler.invoke(step.callback, intent, &mut ctx)?;

            if intent.is_cancelled() {
                if !step.callback.tier.may_cancel() {
                    warn!(
                        target: "ccg::router",
                        handler = %step.handler_id,
                        tier = %step.callback.tier,
                        intent = ?intent.kind(),
                        "intent.cancelled=out_of_tier"
                    );
                }
                trace!(target: "ccg::router", intent = ?intent.kind(), "intent.halted");
                return Ok(());
            }
        }

        if !core_applied {
            game.resolve_core(intent)?;
        }
        Ok(())
    }
}
