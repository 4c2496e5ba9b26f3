use std::sync::Arc;

use tracing::debug;

use crate::cards::{CardDefinition, CardState};
use crate::core::{EngineError, EntityId};
use crate::engine::{AbilityContext, GameState};
use crate::intents::{AbilityHandler, Callback, Callbacks, Intent, IntentKind, IntentType, Tier};

#[must_use]
pub fn jungle_oasis() -> CardDefinition {
    CardDefinition::base("Jungle Oasis", 12, [2, 0, 0])
}

#[must_use]
pub fn tar_pits() -> CardDefinition {
    CardDefinition::base("Tar Pits", 16, [4, 3, 2])
        .with_text("After each time a minion is destroyed here, place it at the bottom of its owner's deck.")
        .with_ability(|id| Arc::new(TarPits { base: id }))
}

/// Minions destroyed here end up under their owner's deck instead of in
/// the discard.
struct TarPits {
    base: EntityId,
}

impl AbilityHandler for TarPits {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::DestroyMinion]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        // Where the minion stands is only known before it's destroyed.
        let here = intent
            .kind()
            .minion()
            .is_some_and(|m| state.base_of(m) == Some(self.base));
        if here && state.is_base_in_play(self.base) {
            Callbacks::at(Tier::PostResolve)
        } else {
            Callbacks::none()
        }
    }

    fn invoke(
        &self,
        _callback: Callback,
        intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        let Some(minion) = intent.kind().minion() else {
            return Ok(());
        };
        let destroyed = ctx
            .state()
            .card(minion)
            .is_some_and(|c| c.state == CardState::InDiscard);
        if destroyed {
            debug!(target: "ccg::engine", base = %self.base, %minion, "tar_pits.sink");
            ctx.perform(IntentKind::PlaceMinionOnDeckBottom { minion })?;
        }
        Ok(())
    }
}
