//! The game engine.
//!
//! `Game` owns the state, the router, the effect table and the RNG, and is
//! the only thing that performs intents. Player actions come in through
//! `play_card` and `end_turn`; both validate, then drive the game through
//! intents so every ability gets its say.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::effects::EffectTable;
use super::resolve::Destination;
use super::state::{GamePhase, GameState, TurnState};
use crate::cards::{ActionTarget, CardKind, CardState, Deck};
use crate::core::{
    DrawError, EngineError, EntityId, GameConfig, GameId, GameRng, PlayerId, RuleViolation,
    SetupError,
};
use crate::intents::{AbilityHandler, HandlerId, Intent, IntentKind, IntentRouter};
use crate::protocol::Outbox;
use crate::selection::SelectionBroker;
use crate::zones::Pile;

/// Result of a card play that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    /// A handler cancelled the play; the card is back in hand and the
    /// budget restored.
    Vetoed,
}

/// Where a validated play puts the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Minion { base: EntityId },
    ActionOnBase { base: EntityId },
    ActionOnMinion { minion: EntityId },
    ActionOnField,
}

impl Placement {
    fn is_minion(self) -> bool {
        matches!(self, Placement::Minion { .. })
    }

    fn play_intent(self, card: EntityId) -> IntentKind {
        match self {
            Placement::Minion { base } => IntentKind::PlayMinion { minion: card, base },
            Placement::ActionOnBase { base } => IntentKind::PlayActionOnBase { action: card, base },
            Placement::ActionOnMinion { minion } => {
                IntentKind::PlayActionOnMinion { action: card, minion }
            }
            Placement::ActionOnField => IntentKind::PlayActionOnField { action: card },
        }
    }

    fn resolve_intent(self, card: EntityId) -> IntentKind {
        if self.is_minion() {
            IntentKind::ResolveMinionAbility { minion: card }
        } else {
            IntentKind::ResolveActionAbility { action: card }
        }
    }
}

/// One running game.
pub struct Game {
    pub(crate) id: GameId,
    pub(crate) config: GameConfig,
    pub(crate) state: GameState,
    pub(crate) router: IntentRouter,
    pub(crate) effects: EffectTable,
    pub(crate) rng: GameRng,
    pub(crate) broker: Arc<SelectionBroker>,
    pub(crate) outbox: Arc<Outbox>,
    depth: usize,
}

impl Game {
    #[must_use]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    #[must_use]
    pub fn effects(&self) -> &EffectTable {
        &self.effects
    }

    #[must_use]
    pub fn broker(&self) -> &Arc<SelectionBroker> {
        &self.broker
    }

    #[must_use]
    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    /// Register a handler that isn't tied to a card, such as a game-wide
    /// rule or a test probe.
    pub fn register_handler(&mut self, handler: Arc<dyn AbilityHandler>) -> HandlerId {
        self.router.register(handler)
    }

    pub fn unregister_handler(&mut self, id: HandlerId) -> bool {
        self.router.unregister(id)
    }

    /// The winner, once the game has finished.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        match self.state.phase {
            GamePhase::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.winner().is_some()
    }

    /// Dispatch an intent to completion and return it, cancelled or not.
    ///
    /// Calls made from inside handlers nest: the inner intent finishes
    /// before the outer dispatch continues.
    pub fn perform_intent(&mut self, kind: IntentKind) -> Result<Intent, EngineError> {
        let max = self.config.max_intent_depth;
        if self.depth >= max {
            warn!(target: "ccg::engine", depth = self.depth, intent = ?kind, "intent.too_deep");
            return Err(EngineError::IntentDepthExceeded(max));
        }

        trace!(target: "ccg::engine", depth = self.depth, intent = ?kind, "intent.perform");
        let mut intent = Intent::new(kind);
        let plan = self.router.plan(&intent, &self.state);

        self.depth += 1;
        let result = plan.execute(&mut intent, self);
        self.depth -= 1;

        result.map(|()| intent)
    }

    /// Deal opening state to clients and begin the first turn.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state.phase != GamePhase::Setup {
            return Ok(());
        }
        self.state.phase = GamePhase::Running;
        info!(target: "ccg::engine", game = %self.id, players = self.state.player_count(), "game.started");
        self.send_cards();
        self.begin_turn(PlayerId::new(0))
    }

    fn check_turn(&self, player: PlayerId) -> Result<TurnState, RuleViolation> {
        if self.state.phase != GamePhase::Running {
            return Err(RuleViolation::GameNotRunning);
        }
        let turn = self.state.turn.ok_or(RuleViolation::NoTurnInProgress)?;
        if turn.player != player {
            return Err(RuleViolation::NotYourTurn { player });
        }
        Ok(turn)
    }

    fn validate_play(
        &self,
        player: PlayerId,
        card: EntityId,
        target: Option<EntityId>,
    ) -> Result<Placement, RuleViolation> {
        let turn = self.check_turn(player)?;
        let instance = self.state.card(card).ok_or(RuleViolation::UnknownCard(card))?;
        if instance.owner != player {
            return Err(RuleViolation::NotOwner { player, card });
        }
        let in_hand = self
            .state
            .player(player)
            .is_some_and(|p| p.hand.contains(&card));
        if instance.state != CardState::InHand || !in_hand {
            return Err(RuleViolation::NotInHand(card));
        }

        let need_target = || target.ok_or(RuleViolation::MissingTarget(card));
        let invalid = |target| RuleViolation::InvalidTarget { card, target };

        match instance.definition.kind {
            CardKind::Minion { .. } => {
                if turn.minions_left == 0 {
                    return Err(RuleViolation::NoMinionPlaysLeft);
                }
                let base = need_target()?;
                if !self.state.is_base_in_play(base) {
                    return Err(invalid(base));
                }
                Ok(Placement::Minion { base })
            }
            CardKind::Action { target: kind } => {
                if turn.actions_left == 0 {
                    return Err(RuleViolation::NoActionPlaysLeft);
                }
                match kind {
                    ActionTarget::Base => {
                        let base = need_target()?;
                        if !self.state.is_base_in_play(base) {
                            return Err(invalid(base));
                        }
                        Ok(Placement::ActionOnBase { base })
                    }
                    ActionTarget::Minion | ActionTarget::OwnMinion => {
                        let minion = need_target()?;
                        if !self.state.is_minion_in_play(minion) {
                            return Err(invalid(minion));
                        }
                        if kind == ActionTarget::OwnMinion
                            && self.state.controller_of(minion) != Some(player)
                        {
                            return Err(invalid(minion));
                        }
                        Ok(Placement::ActionOnMinion { minion })
                    }
                    ActionTarget::None => Ok(Placement::ActionOnField),
                }
            }
            CardKind::Base { .. } => Err(RuleViolation::NotPlayable(card)),
        }
    }

    fn spend_budget(&mut self, minion: bool, delta: i32) {
        if let Some(turn) = self.state.turn.as_mut() {
            let budget = if minion {
                &mut turn.minions_left
            } else {
                &mut turn.actions_left
            };
            *budget = budget.saturating_add_signed(delta);
        }
    }

    /// Play a card from `player`'s hand.
    ///
    /// The card enters play before its play intent is dispatched, so its
    /// own handler can react to (and veto) being played. A vetoed play is
    /// rolled back entirely.
    pub fn play_card(
        &mut self,
        player: PlayerId,
        card: EntityId,
        target: Option<EntityId>,
    ) -> Result<PlayOutcome, EngineError> {
        let placement = match self.validate_play(player, card, target) {
            Ok(placement) => placement,
            Err(violation) => {
                debug!(target: "ccg::engine", %player, %card, %violation, "play.rejected");
                return Err(violation.into());
            }
        };

        self.spend_budget(placement.is_minion(), -1);
        self.enter_play(player, card, placement);
        info!(target: "ccg::engine", %player, %card, ?placement, "card.played");

        let play = match self.perform_intent(placement.play_intent(card)) {
            Ok(play) => play,
            Err(e) => {
                warn!(target: "ccg::engine", %player, %card, error = %e, "play.failed");
                self.discard_spent_action(card, placement)?;
                return Err(e);
            }
        };
        if play.is_cancelled() {
            self.relocate(card, Destination::Hand)?;
            self.spend_budget(placement.is_minion(), 1);
            info!(target: "ccg::engine", %player, %card, "play.vetoed");
            return Ok(PlayOutcome::Vetoed);
        }

        let resolved = if self.state.is_in_play(card) {
            self.perform_intent(placement.resolve_intent(card)).map(|_| ())
        } else {
            Ok(())
        };
        self.discard_spent_action(card, placement)?;
        resolved.map(|()| PlayOutcome::Played)
    }

    /// Untargeted actions are spent even when their ability failed.
    fn discard_spent_action(&mut self, card: EntityId, placement: Placement) -> Result<(), EngineError> {
        let resolving = matches!(
            self.state.card(card).map(|c| &c.state),
            Some(CardState::Resolving { .. })
        );
        if placement == Placement::ActionOnField && resolving {
            self.relocate(card, Destination::Discard)?;
        }
        Ok(())
    }

    /// End `player`'s turn: score ready bases, resolve `EndTurn`, draw, and
    /// hand over to the next seat unless someone has won.
    pub fn end_turn(&mut self, player: PlayerId) -> Result<(), EngineError> {
        if let Err(violation) = self.check_turn(player) {
            debug!(target: "ccg::engine", %player, %violation, "end_turn.rejected");
            return Err(violation.into());
        }

        for base in self.state.bases_ready_to_score() {
            // An earlier score can replace or weaken this base.
            let still_ready = self
                .state
                .base_threshold(base)
                .is_some_and(|threshold| self.state.base_power(base) >= threshold);
            if still_ready {
                self.perform_intent(IntentKind::ScoreBase { base })?;
            }
        }

        self.perform_intent(IntentKind::EndTurn { player })?;
        self.close_turn(player)
    }

    /// Give up on the active turn after a failed selection.
    ///
    /// Scoring is skipped. `EndTurn` is still dispatched so timed effects
    /// expire, and the next player's turn begins.
    pub fn abort_turn(&mut self) -> Result<(), EngineError> {
        let Some(player) = self.state.active_player() else {
            return Ok(());
        };
        warn!(target: "ccg::engine", %player, "turn.aborted");
        match self.perform_intent(IntentKind::EndTurn { player }) {
            Ok(_) => {}
            Err(e) if e.aborts_turn() => {
                warn!(target: "ccg::engine", %player, error = %e, "turn.abort.end_turn_failed");
            }
            Err(e) => return Err(e),
        }
        self.close_turn(player)
    }

    fn close_turn(&mut self, player: PlayerId) -> Result<(), EngineError> {
        for _ in 0..self.config.draw_per_turn {
            if let Err(e) = self.draw_card(player) {
                warn!(target: "ccg::engine", %player, error = %e, "draw.halted");
                break;
            }
        }
        self.state.turn = None;

        if let Some(winner) = self.state.winner(self.config.point_max) {
            self.state.phase = GamePhase::Finished { winner };
            info!(target: "ccg::engine", game = %self.id, %winner, "game.won");
            return Ok(());
        }

        let next = player.next(self.state.player_count());
        self.begin_turn(next)
    }

    fn begin_turn(&mut self, player: PlayerId) -> Result<(), EngineError> {
        self.state.turn_number += 1;
        self.state.turn = Some(TurnState {
            player,
            minions_left: self.config.minions_per_turn,
            actions_left: self.config.actions_per_turn,
        });
        debug!(target: "ccg::engine", %player, turn = self.state.turn_number, "turn.started");
        self.perform_intent(IntentKind::StartTurn { player })?;
        Ok(())
    }

    /// Draw the top card of `player`'s deck into their hand.
    ///
    /// An empty deck is first refilled from the shuffled discard. With both
    /// empty nothing moves and `DrawError::Exhausted` is returned.
    pub fn draw_card(&mut self, player: PlayerId) -> Result<EntityId, EngineError> {
        let seat = self
            .state
            .players
            .get_mut(player)
            .ok_or(RuleViolation::UnknownPlayer(player))?;

        if seat.deck.is_empty() {
            if seat.discard.is_empty() {
                return Err(DrawError::Exhausted { player }.into());
            }
            let recycled = seat.discard.take_all();
            for card in &recycled {
                if let Some(c) = self.state.cards.card_mut(*card) {
                    c.state = CardState::InDeck;
                }
            }
            seat.deck = Pile::from_bottom_up(recycled);
            if self.config.shuffle {
                seat.deck.shuffle(&mut self.rng);
            }
            debug!(target: "ccg::engine", %player, cards = seat.deck.len(), "deck.reshuffled");
        }

        let card = seat
            .deck
            .pop_top()
            .ok_or(DrawError::Exhausted { player })?;
        seat.hand.push(card);
        if let Some(c) = self.state.cards.card_mut(card) {
            c.state = CardState::InHand;
        }
        trace!(target: "ccg::engine", %player, %card, "card.drawn");
        Ok(card)
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("id", &self.id)
            .field("phase", &self.state.phase)
            .field("turn", &self.state.turn)
            .field("router", &self.router)
            .finish()
    }
}

/// Builder for a `Game`.
///
/// Seats are filled in the order `player` is called; seat 0 moves first.
///
/// ```
/// use rust_ccg_server::cards::{CardDefinition, Deck};
/// use rust_ccg_server::core::{GameConfig, GameId};
/// use rust_ccg_server::engine::GameBuilder;
///
/// let deck = Deck::new("Test")
///     .with(CardDefinition::base("Plains", 10, [3, 2, 1]))
///     .with_copies(CardDefinition::minion("Grunt", 2), 6);
///
/// let game = GameBuilder::new(GameId(1), GameConfig::default().with_bases_in_play(1))
///     .player("ann", [deck.clone()])
///     .player("ben", [deck])
///     .build()
///     .unwrap();
///
/// assert_eq!(game.state().bases_in_play().len(), 1);
/// assert_eq!(game.state().players.values().map(|p| p.hand.len()).sum::<usize>(), 10);
/// ```
pub struct GameBuilder {
    id: GameId,
    config: GameConfig,
    seats: Vec<(String, Vec<Deck>)>,
    outbox: Option<Arc<Outbox>>,
}

impl GameBuilder {
    #[must_use]
    pub fn new(id: GameId, config: GameConfig) -> Self {
        Self {
            id,
            config,
            seats: Vec::new(),
            outbox: None,
        }
    }

    /// Add a seat dealt the given decks.
    #[must_use]
    pub fn player(mut self, name: impl Into<String>, decks: impl IntoIterator<Item = Deck>) -> Self {
        self.seats.push((name.into(), decks.into_iter().collect()));
        self
    }

    /// Share an outbox with the host so it can attach connections.
    #[must_use]
    pub fn outbox(mut self, outbox: Arc<Outbox>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    pub fn build(self) -> Result<Game, SetupError> {
        self.config.validate()?;
        if self.seats.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if self.seats.len() > 255 {
            return Err(SetupError::TooManyPlayers(self.seats.len()));
        }

        let mut state = GameState::new(self.seats.iter().map(|(name, _)| name.clone()));
        for (seat, (_, decks)) in self.seats.iter().enumerate() {
            let player = PlayerId(seat as u8);
            for deck in decks {
                state.players[player].decks.push(deck.name.clone());
                for definition in &deck.cards {
                    let id = state.cards.add_card(player, Arc::clone(definition));
                    state.players[player].deck.push_top(id);
                }
                for definition in &deck.bases {
                    let id = state.cards.add_base(Arc::clone(definition));
                    state.base_deck.push_top(id);
                }
            }
        }

        let mut rng = GameRng::new(self.config.seed);
        if self.config.shuffle {
            for player in state.players.player_ids().collect::<Vec<_>>() {
                state.players[player].deck.shuffle(&mut rng);
            }
            state.base_deck.shuffle(&mut rng);
        }

        let needed = self.config.bases_for(state.player_count());
        let available = state.base_deck.len();
        if available < needed {
            return Err(SetupError::NotEnoughBases { needed, available });
        }

        let outbox = self.outbox.unwrap_or_default();
        let broker = Arc::new(SelectionBroker::new(
            Arc::clone(&outbox),
            self.config.selection_timeout(),
        ));
        let mut game = Game {
            id: self.id,
            config: self.config,
            state,
            router: IntentRouter::new(),
            effects: EffectTable::new(),
            rng,
            broker,
            outbox,
            depth: 0,
        };

        for _ in 0..needed {
            if let Some(base) = game.state.base_deck.pop_top() {
                game.place_base(base);
            }
        }
        for player in game.state.players.player_ids().collect::<Vec<_>>() {
            for _ in 0..game.config.starting_hand {
                if let Err(e) = game.draw_card(player) {
                    warn!(target: "ccg::engine", %player, error = %e, "deal.short");
                    break;
                }
            }
        }

        info!(
            target: "ccg::engine",
            game = %game.id,
            players = game.state.player_count(),
            bases = needed,
            cards = game.state.cards.len(),
            "game.built"
        );
        Ok(game)
    }
}
