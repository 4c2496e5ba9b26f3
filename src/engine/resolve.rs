//! Core resolution.
//!
//! The engine's own state change for each intent, applied once per dispatch
//! right before the `Resolve` tier. Everything here tolerates stale ids:
//! an intent about a card that already left play resolves as a no-op.

use tracing::{debug, trace, warn};

use super::game::{Game, Placement};
use crate::cards::{BaseState, CardState};
use crate::core::{EngineError, EntityId, PlayerId};
use crate::intents::{Intent, IntentKind};
use crate::zones::PilePosition;

/// Where a card goes when it leaves its current position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    Hand,
    Discard,
    DeckTop,
    DeckBottom,
}

impl Game {
    pub(crate) fn resolve_core(&mut self, intent: &Intent) -> Result<(), EngineError> {
        use IntentKind as K;

        match *intent.kind() {
            K::EndTurn { player } => {
                for (key, effect) in self.effects.expire_end_of_turn(player) {
                    trace!(target: "ccg::engine", card = %key.card, effect = key.effect.0, "effect.expired");
                    if let Some(revert) = effect.revert {
                        self.perform_intent(revert)?;
                    }
                }
            }

            K::DestroyMinion { minion } => self.move_minion_out(minion, Destination::Discard)?,
            K::ReturnMinionToHand { minion } => self.move_minion_out(minion, Destination::Hand)?,
            K::PlaceMinionOnDeckTop { minion } => {
                self.move_minion_out(minion, Destination::DeckTop)?;
            }
            K::PlaceMinionOnDeckBottom { minion } => {
                self.move_minion_out(minion, Destination::DeckBottom)?;
            }
            K::MoveMinion { minion, base } => self.move_between_bases(minion, base),
            K::ModifyMinionPower { minion, off } => {
                if let Some(CardState::MinionOnBase { raw_power, .. }) =
                    self.state.cards.card_mut(minion).map(|c| &mut c.state)
                {
                    *raw_power += off;
                    trace!(target: "ccg::engine", %minion, off, power = *raw_power, "minion.power");
                }
            }

            K::DestroyAction { action } => self.move_action_out(action, Destination::Discard)?,
            K::ReturnActionToHand { action } => self.move_action_out(action, Destination::Hand)?,
            K::PlaceActionOnDeckTop { action } => {
                self.move_action_out(action, Destination::DeckTop)?;
            }
            K::PlaceActionOnDeckBottom { action } => {
                self.move_action_out(action, Destination::DeckBottom)?;
            }

            K::ChangeCardController { card, new_controller } => {
                self.change_controller(card, new_controller);
            }

            K::PlayBase { base } => {
                if !self.state.is_base_in_play(base) {
                    self.place_base(base);
                }
            }
            K::ScoreBase { base } => {
                if self.state.is_base_in_play(base) {
                    self.award_base(base);
                    self.perform_intent(IntentKind::RemoveBase { base })?;
                }
            }
            K::RemoveBase { base } => {
                if self.state.is_base_in_play(base) {
                    self.remove_base(base)?;
                }
            }
            K::ModifyBasePowerThreshold { base, off } => {
                if let Some(BaseState::InPlay {
                    power_threshold, ..
                }) = self.state.cards.base_mut(base).map(|b| &mut b.state)
                {
                    *power_threshold += off;
                    trace!(target: "ccg::engine", %base, off, threshold = *power_threshold, "base.threshold");
                }
            }

            // Play intents resolve when the card enters play, before dispatch.
            K::StartTurn { .. }
            | K::PlayMinion { .. }
            | K::PlayActionOnBase { .. }
            | K::PlayActionOnMinion { .. }
            | K::PlayActionOnField { .. }
            | K::ResolveMinionAbility { .. }
            | K::ResolveActionAbility { .. } => {}
        }
        Ok(())
    }

    /// Cards leave play for any destination. Deck placements also take
    /// cards out of the discard.
    fn may_move(&self, card: EntityId, dest: Destination) -> bool {
        self.state.card(card).is_some_and(|c| {
            c.state.is_in_play()
                || (c.state == CardState::InDiscard
                    && matches!(dest, Destination::DeckTop | Destination::DeckBottom))
        })
    }

    fn move_minion_out(&mut self, minion: EntityId, dest: Destination) -> Result<(), EngineError> {
        let is_minion = self.state.card(minion).is_some_and(|c| c.is_minion());
        if !is_minion || !self.may_move(minion, dest) {
            debug!(target: "ccg::engine", %minion, ?dest, "minion.not_movable");
            return Ok(());
        }
        self.relocate(minion, dest)
    }

    fn move_action_out(&mut self, action: EntityId, dest: Destination) -> Result<(), EngineError> {
        let is_action = self.state.card(action).is_some_and(|c| c.is_action());
        if !is_action || !self.may_move(action, dest) {
            debug!(target: "ccg::engine", %action, ?dest, "action.not_movable");
            return Ok(());
        }
        self.relocate(action, dest)
    }

    fn move_between_bases(&mut self, minion: EntityId, to: EntityId) {
        let Some(from) = self.state.base_of(minion) else {
            return;
        };
        if from == to || !self.state.is_minion_in_play(minion) || !self.state.is_base_in_play(to) {
            return;
        }
        if let Some(BaseState::InPlay { minions, .. }) = self.base_state_mut(from) {
            minions.retain(|m| *m != minion);
        }
        if let Some(BaseState::InPlay { minions, .. }) = self.base_state_mut(to) {
            minions.push(minion);
        }
        if let Some(CardState::MinionOnBase { base, .. }) =
            self.state.cards.card_mut(minion).map(|c| &mut c.state)
        {
            *base = to;
        }
        debug!(target: "ccg::engine", %minion, %from, %to, "minion.moved");
    }

    fn change_controller(&mut self, card: EntityId, new_controller: PlayerId) {
        let Some(instance) = self.state.cards.card_mut(card) else {
            return;
        };
        match &mut instance.state {
            CardState::OnBase { controller, .. }
            | CardState::OnMinion { controller, .. }
            | CardState::MinionOnBase { controller, .. }
            | CardState::Resolving { controller } => {
                *controller = new_controller;
                debug!(target: "ccg::engine", %card, controller = %new_controller, "card.controller");
            }
            CardState::InDeck | CardState::InHand | CardState::InDiscard => {}
        }
    }

    fn base_state_mut(&mut self, base: EntityId) -> Option<&mut BaseState> {
        self.state.cards.base_mut(base).map(|b| &mut b.state)
    }

    /// Put a card from `player`'s hand into its validated play position and
    /// activate its handler.
    pub(crate) fn enter_play(&mut self, player: PlayerId, card: EntityId, placement: Placement) {
        if let Some(seat) = self.state.players.get_mut(player) {
            seat.remove_from_hand(card);
        }
        let raw_power = self
            .state
            .card(card)
            .and_then(|c| c.definition.minion_power())
            .unwrap_or(0);

        let state = match placement {
            Placement::Minion { base } => {
                if let Some(BaseState::InPlay { minions, .. }) = self.base_state_mut(base) {
                    minions.push(card);
                }
                CardState::MinionOnBase {
                    controller: player,
                    base,
                    raw_power,
                    actions: Vec::new(),
                }
            }
            Placement::ActionOnBase { base } => {
                if let Some(BaseState::InPlay { actions, .. }) = self.base_state_mut(base) {
                    actions.push(card);
                }
                CardState::OnBase {
                    controller: player,
                    base,
                }
            }
            Placement::ActionOnMinion { minion } => {
                if let Some(CardState::MinionOnBase { actions, .. }) =
                    self.state.cards.card_mut(minion).map(|c| &mut c.state)
                {
                    actions.push(card);
                }
                CardState::OnMinion {
                    controller: player,
                    minion,
                }
            }
            Placement::ActionOnField => CardState::Resolving { controller: player },
        };

        if let Some(instance) = self.state.cards.card_mut(card) {
            instance.state = state;
        }
        self.activate(card);
    }

    /// Move a card to `dest` in its owner's zones, from wherever it is now.
    ///
    /// A minion's attached actions go to the discard first. A card leaving
    /// play is deactivated.
    pub fn relocate(&mut self, card: EntityId, dest: Destination) -> Result<(), EngineError> {
        let Some(instance) = self.state.card(card) else {
            debug!(target: "ccg::engine", %card, "relocate.unknown");
            return Ok(());
        };
        let previous = instance.state.clone();
        let owner = instance.owner;

        for action in previous.attached_actions() {
            self.relocate(*action, Destination::Discard)?;
        }
        self.detach(card, owner, &previous);

        let state = match dest {
            Destination::Hand => CardState::InHand,
            Destination::Discard => CardState::InDiscard,
            Destination::DeckTop | Destination::DeckBottom => CardState::InDeck,
        };
        if let Some(seat) = self.state.players.get_mut(owner) {
            match dest {
                Destination::Hand => seat.hand.push(card),
                Destination::Discard => seat.discard.push_top(card),
                Destination::DeckTop => seat.deck.push(card, PilePosition::Top),
                Destination::DeckBottom => seat.deck.push(card, PilePosition::Bottom),
            }
        }
        if let Some(instance) = self.state.cards.card_mut(card) {
            instance.state = state;
        }
        trace!(target: "ccg::engine", %card, ?dest, "card.relocated");

        if previous.is_in_play() {
            self.deactivate(card)?;
        }
        Ok(())
    }

    fn detach(&mut self, card: EntityId, owner: PlayerId, previous: &CardState) {
        match previous {
            CardState::MinionOnBase { base, .. } => {
                if let Some(BaseState::InPlay { minions, .. }) = self.base_state_mut(*base) {
                    minions.retain(|m| *m != card);
                }
            }
            CardState::OnBase { base, .. } => {
                if let Some(BaseState::InPlay { actions, .. }) = self.base_state_mut(*base) {
                    actions.retain(|a| *a != card);
                }
            }
            CardState::OnMinion { minion, .. } => {
                if let Some(CardState::MinionOnBase { actions, .. }) =
                    self.state.cards.card_mut(*minion).map(|c| &mut c.state)
                {
                    actions.retain(|a| *a != card);
                }
            }
            CardState::Resolving { .. } => {}
            CardState::InHand => {
                if let Some(seat) = self.state.players.get_mut(owner) {
                    seat.remove_from_hand(card);
                }
            }
            CardState::InDiscard => {
                if let Some(seat) = self.state.players.get_mut(owner) {
                    seat.discard.remove(card);
                }
            }
            CardState::InDeck => {
                if let Some(seat) = self.state.players.get_mut(owner) {
                    seat.deck.remove(card);
                }
            }
        }
    }

    /// Register the handler of a card or base that just entered play.
    pub(crate) fn activate(&mut self, id: EntityId) {
        if self.router.has_source(id) {
            return;
        }
        let handler = self
            .state
            .card(id)
            .and_then(|c| c.handler.clone())
            .or_else(|| self.state.base(id).and_then(|b| b.handler.clone()));
        if let Some(handler) = handler {
            let handler_id = self.router.register_for(id, handler);
            trace!(target: "ccg::engine", %id, handler = %handler_id, "ability.activated");
        }
    }

    /// Unregister everything `id` registered and undo its while-in-play
    /// effects.
    pub(crate) fn deactivate(&mut self, id: EntityId) -> Result<(), EngineError> {
        let removed = self.router.remove_for_source(id);
        if removed > 0 {
            trace!(target: "ccg::engine", %id, removed, "ability.deactivated");
        }
        for (key, effect) in self.effects.expire_card(id) {
            trace!(target: "ccg::engine", card = %key.card, effect = key.effect.0, "effect.expired");
            if let Some(revert) = effect.revert {
                self.perform_intent(revert)?;
            }
        }
        Ok(())
    }

    /// Put a base into play at its printed threshold.
    pub(crate) fn place_base(&mut self, base: EntityId) {
        self.state.base_deck.remove(base);
        self.state.base_discard.remove(base);
        let Some(instance) = self.state.cards.base_mut(base) else {
            return;
        };
        instance.state = BaseState::InPlay {
            power_threshold: instance.printed_threshold(),
            minions: Vec::new(),
            actions: Vec::new(),
        };
        self.state.bases.push(base);
        self.activate(base);
        debug!(target: "ccg::engine", %base, "base.placed");
    }

    /// Next base off the base deck, recycling the base discard when the deck
    /// runs out.
    fn draw_base(&mut self) -> Option<EntityId> {
        if self.state.base_deck.is_empty() && !self.state.base_discard.is_empty() {
            let recycled = self.state.base_discard.take_all();
            for base in &recycled {
                if let Some(b) = self.state.cards.base_mut(*base) {
                    b.state = BaseState::InDeck;
                }
            }
            self.state.base_deck = crate::zones::Pile::from_bottom_up(recycled);
            if self.config.shuffle {
                self.state.base_deck.shuffle(&mut self.rng);
            }
            debug!(target: "ccg::engine", bases = self.state.base_deck.len(), "base_deck.reshuffled");
        }
        self.state.base_deck.pop_top()
    }

    /// Take a base out of play: discard everything on it, then bring in a
    /// replacement through `PlayBase`.
    fn remove_base(&mut self, base: EntityId) -> Result<(), EngineError> {
        // Drawn first so the leaving base can't come straight back.
        let replacement = self.draw_base();

        let (minions, actions) = match self.state.base(base).map(|b| &b.state) {
            Some(BaseState::InPlay {
                minions, actions, ..
            }) => (minions.clone(), actions.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        for card in minions.into_iter().chain(actions) {
            self.relocate(card, Destination::Discard)?;
        }

        self.state.bases.retain(|b| *b != base);
        if let Some(instance) = self.state.cards.base_mut(base) {
            instance.state = BaseState::InDiscard;
        }
        self.state.base_discard.push_top(base);
        self.deactivate(base)?;
        debug!(target: "ccg::engine", %base, "base.removed");

        match replacement {
            Some(next) => {
                let play = self.perform_intent(IntentKind::PlayBase { base: next })?;
                if play.is_cancelled() && !self.state.is_base_in_play(next) {
                    self.state.base_deck.push_bottom(next);
                    debug!(target: "ccg::engine", base = %next, "base.replacement_vetoed");
                }
            }
            None => warn!(target: "ccg::engine", %base, "base.no_replacement"),
        }
        Ok(())
    }
}
