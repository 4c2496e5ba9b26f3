//! What a handler sees while it runs.

use std::collections::BTreeMap;

use super::effects::{EffectKey, ScratchEffect};
use super::game::Game;
use super::state::GameState;
use crate::core::{EngineError, EntityId, GameConfig, PlayerId};
use crate::intents::{Intent, IntentKind};
use crate::selection::{SelectionOption, SelectionRequest};

/// Handle given to a handler for the length of one callback.
///
/// State is read-only here. Handlers change the game by performing intents,
/// which are dispatched to completion before `perform` returns.
pub struct AbilityContext<'g> {
    game: &'g mut Game,
    source: Option<EntityId>,
}

impl<'g> AbilityContext<'g> {
    pub(crate) fn new(game: &'g mut Game, source: Option<EntityId>) -> Self {
        Self { game, source }
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.game.state
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.game.config
    }

    /// The card or base the running handler belongs to.
    #[must_use]
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// Emit a nested intent.
    pub fn perform(&mut self, kind: IntentKind) -> Result<Intent, EngineError> {
        self.game.perform_intent(kind)
    }

    /// Ask one player to pick an option. Blocks until they answer.
    ///
    /// Everyone gets a fresh state snapshot first so the prompt makes sense.
    pub fn request_selection(
        &mut self,
        player: PlayerId,
        prompt: impl Into<String>,
        options: Vec<SelectionOption>,
    ) -> Result<SelectionOption, EngineError> {
        self.game.broadcast_state();
        Ok(self.game.broker.request_one(player, prompt, options)?)
    }

    /// Ask several players at once and wait for all of them.
    pub fn request_selections<K: Ord>(
        &mut self,
        requests: BTreeMap<K, SelectionRequest>,
    ) -> Result<BTreeMap<K, SelectionOption>, EngineError> {
        self.game.broadcast_state();
        Ok(self.game.broker.request_many(requests)?)
    }

    /// Ask `player` to choose one of `cards`. `None` when there is nothing
    /// to choose from.
    pub fn choose_card(
        &mut self,
        player: PlayerId,
        prompt: impl Into<String>,
        cards: &[EntityId],
    ) -> Result<Option<EntityId>, EngineError> {
        if cards.is_empty() {
            return Ok(None);
        }
        let options = cards.iter().copied().map(SelectionOption::from).collect();
        let chosen = self.request_selection(player, prompt, options)?;
        Ok(chosen.card())
    }

    /// Record a lingering effect.
    pub fn remember(&mut self, key: EffectKey, effect: ScratchEffect) {
        self.game.effects.insert(key, effect);
    }

    #[must_use]
    pub fn recall(&self, key: &EffectKey) -> Option<&ScratchEffect> {
        self.game.effects.get(key)
    }

    pub fn forget(&mut self, key: &EffectKey) -> Option<ScratchEffect> {
        self.game.effects.remove(key)
    }
}
