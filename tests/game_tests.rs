//! Game engine tests: turn flow, scoring, draws, vetoes and handler
//! lifetimes, all on a single thread with no selections.
//!
//! Decks are unshuffled, so the last card listed is on top and drawn first.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rust_ccg_server::cards::{ActionTarget, BaseState, CardDefinition, CardState, Deck};
use rust_ccg_server::core::{
    DrawError, EngineError, EntityId, GameConfig, GameId, PlayerId, RuleViolation, SelectionError,
};
use rust_ccg_server::engine::{AbilityContext, Game, GameBuilder, GamePhase, GameState, PlayOutcome};
use rust_ccg_server::games::dinosaurs;
use rust_ccg_server::intents::{AbilityHandler, Callback, Callbacks, Intent, IntentKind, IntentType, Tier};
use rust_ccg_server::selection::SelectionOption;

const ANN: PlayerId = PlayerId::new(0);
const BEN: PlayerId = PlayerId::new(1);

fn pup() -> CardDefinition {
    CardDefinition::minion("Pup", 1)
}

fn config() -> GameConfig {
    GameConfig::default().unshuffled().with_bases_in_play(1)
}

/// The card called `name` in `player`'s hand.
fn in_hand(game: &Game, player: PlayerId, name: &str) -> EntityId {
    let state = game.state();
    state
        .player(player)
        .unwrap()
        .hand
        .iter()
        .copied()
        .find(|id| state.card(*id).unwrap().name() == name)
        .unwrap_or_else(|| panic!("{name} not in hand"))
}

fn base_named(game: &Game, name: &str) -> EntityId {
    game.state()
        .cards
        .bases()
        .find(|b| b.name() == name)
        .map(|b| b.id)
        .unwrap()
}

/// Ann's deck carries both bases: Arena on top (dealt), Spare below it.
fn two_player_game(config: GameConfig) -> Game {
    let ann = Deck::new("Ann")
        .with(CardDefinition::base("Spare", 20, [1, 1, 1]))
        .with(CardDefinition::base("Arena", 10, [3, 2, 1]))
        .with_copies(pup(), 5)
        .with(CardDefinition::minion("Four", 4));
    let ben = Deck::new("Ben")
        .with_copies(pup(), 5)
        .with(CardDefinition::minion("Seven", 7));

    GameBuilder::new(GameId(7), config)
        .player("ann", [ann])
        .player("ben", [ben])
        .build()
        .unwrap()
}

#[test]
fn test_setup_deals_bases_and_hands() {
    let game = two_player_game(config());
    let state = game.state();

    assert_eq!(state.phase, GamePhase::Setup);
    assert_eq!(state.bases_in_play(), &[base_named(&game, "Arena")]);
    assert_eq!(state.base_deck.len(), 1);
    for player in [ANN, BEN] {
        let seat = state.player(player).unwrap();
        assert_eq!(seat.hand.len(), 5);
        assert_eq!(seat.deck.len(), 1);
        assert!(seat.hand.iter().all(|c| state.card(*c).unwrap().state == CardState::InHand));
    }
    in_hand(&game, ANN, "Four");
    in_hand(&game, BEN, "Seven");
}

#[test]
fn test_end_of_turn_draws_configured_cards() {
    let mut game = two_player_game(config().with_draw_per_turn(1));
    game.start().unwrap();
    game.end_turn(ANN).unwrap();

    let seat = game.state().player(ANN).unwrap();
    assert_eq!(seat.hand.len(), 6);
    assert!(seat.deck.is_empty());
    assert_eq!(game.state().turn.unwrap().player, BEN);
}

#[test]
fn test_scoring_awards_places_and_replaces_base() {
    let mut game = two_player_game(config().with_point_max(50));
    game.start().unwrap();
    let arena = base_named(&game, "Arena");
    let spare = base_named(&game, "Spare");

    let four = in_hand(&game, ANN, "Four");
    assert_eq!(game.play_card(ANN, four, Some(arena)).unwrap(), PlayOutcome::Played);
    assert_eq!(game.state().base_power(arena), 4);
    game.end_turn(ANN).unwrap();
    assert_eq!(game.state().bases_in_play(), &[arena]);

    let seven = in_hand(&game, BEN, "Seven");
    game.play_card(BEN, seven, Some(arena)).unwrap();
    assert_eq!(game.state().base_power(arena), 11);
    game.end_turn(BEN).unwrap();

    let state = game.state();
    assert_eq!(state.player(BEN).unwrap().points, 3);
    assert_eq!(state.player(ANN).unwrap().points, 2);

    assert_eq!(state.bases_in_play(), &[spare]);
    assert_eq!(state.base(arena).unwrap().state, BaseState::InDiscard);
    assert!(state.base_discard.contains(arena));

    assert_eq!(state.card(four).unwrap().state, CardState::InDiscard);
    assert!(state.player(ANN).unwrap().discard.contains(four));
    assert!(state.player(BEN).unwrap().discard.contains(seven));
    assert_eq!(state.active_player(), Some(ANN));
}

#[test]
fn test_reaching_point_max_ends_the_game() {
    let mut game = two_player_game(config().with_point_max(3));
    game.start().unwrap();
    let arena = base_named(&game, "Arena");

    let four = in_hand(&game, ANN, "Four");
    game.play_card(ANN, four, Some(arena)).unwrap();
    game.end_turn(ANN).unwrap();
    let seven = in_hand(&game, BEN, "Seven");
    game.play_card(BEN, seven, Some(arena)).unwrap();
    game.end_turn(BEN).unwrap();

    assert_eq!(game.winner(), Some(BEN));
    assert_eq!(game.state().turn, None);

    let pup = in_hand(&game, ANN, "Pup");
    let err = game.play_card(ANN, pup, Some(arena)).unwrap_err();
    assert!(matches!(err, EngineError::Rule(RuleViolation::GameNotRunning)));
}

#[test]
fn test_rule_violations_change_nothing() {
    let mut game = two_player_game(config());
    game.start().unwrap();
    let arena = base_named(&game, "Arena");
    let four = in_hand(&game, ANN, "Four");
    let seven = in_hand(&game, BEN, "Seven");

    let rule = |result: Result<PlayOutcome, EngineError>| match result {
        Err(EngineError::Rule(violation)) => violation,
        other => panic!("expected a rule violation, got {other:?}"),
    };

    assert_eq!(
        rule(game.play_card(BEN, seven, Some(arena))),
        RuleViolation::NotYourTurn { player: BEN }
    );
    assert_eq!(
        rule(game.play_card(ANN, seven, Some(arena))),
        RuleViolation::NotOwner {
            player: ANN,
            card: seven
        }
    );
    assert_eq!(rule(game.play_card(ANN, four, None)), RuleViolation::MissingTarget(four));
    assert_eq!(
        rule(game.play_card(ANN, four, Some(four))),
        RuleViolation::InvalidTarget {
            card: four,
            target: four
        }
    );
    assert_eq!(
        rule(game.play_card(ANN, EntityId(999), Some(arena))),
        RuleViolation::UnknownCard(EntityId(999))
    );
    assert_eq!(game.state().player(ANN).unwrap().hand.len(), 5);

    game.play_card(ANN, four, Some(arena)).unwrap();
    assert_eq!(rule(game.play_card(ANN, four, Some(arena))), RuleViolation::NotInHand(four));
    let pup = in_hand(&game, ANN, "Pup");
    assert_eq!(rule(game.play_card(ANN, pup, Some(arena))), RuleViolation::NoMinionPlaysLeft);

    assert!(matches!(
        game.end_turn(BEN),
        Err(EngineError::Rule(RuleViolation::NotYourTurn { .. }))
    ));
}

#[test]
fn test_vetoed_play_rolls_back() {
    let ann = Deck::new("Ann")
        .with(CardDefinition::base("Arena", 10, [3, 2, 1]))
        .with_copies(pup(), 4)
        .with(dinosaurs::rampage());
    let mut game = GameBuilder::new(GameId(2), config())
        .player("ann", [ann])
        .build()
        .unwrap();
    game.start().unwrap();

    // No minion in play, so Rampage refuses to be played.
    let rampage = in_hand(&game, ANN, "Rampage");
    assert_eq!(game.play_card(ANN, rampage, None).unwrap(), PlayOutcome::Vetoed);

    let state = game.state();
    assert_eq!(state.card(rampage).unwrap().state, CardState::InHand);
    assert!(state.player(ANN).unwrap().hand.contains(&rampage));
    assert_eq!(state.turn.unwrap().actions_left, 1);
    assert!(!game.router().has_source(rampage));
}

/// Asks the player of every untargeted action for a choice while it is
/// being played.
struct Interrogator;

impl AbilityHandler for Interrogator {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::PlayActionOnField]
    }

    fn callbacks(&self, _intent: &Intent, _state: &GameState) -> Callbacks {
        Callbacks::at(Tier::Modify)
    }

    fn invoke(
        &self,
        _callback: Callback,
        _intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        ctx.request_selection(ANN, "Pick", vec![SelectionOption::from(EntityId(1))])?;
        Ok(())
    }
}

#[test]
fn test_failed_play_still_spends_the_action() {
    let ann = Deck::new("Ann")
        .with(CardDefinition::base("Arena", 10, [3, 2, 1]))
        .with_copies(pup(), 4)
        .with(dinosaurs::howl());
    let mut game = GameBuilder::new(GameId(4), config())
        .player("ann", [ann])
        .build()
        .unwrap();
    game.start().unwrap();
    game.register_handler(Arc::new(Interrogator));

    // Nobody is connected for Ann, so the selection is abandoned mid-play.
    let howl = in_hand(&game, ANN, "Howl");
    let err = game.play_card(ANN, howl, None).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Selection(SelectionError::Abandoned { player }) if player == ANN
    ));

    let state = game.state();
    assert_eq!(state.card(howl).unwrap().state, CardState::InDiscard);
    assert!(state.player(ANN).unwrap().discard.contains(howl));
    assert!(!state.player(ANN).unwrap().hand.contains(&howl));
    assert!(!game.router().has_source(howl));

    game.abort_turn().unwrap();
    assert_eq!(game.state().card(howl).unwrap().state, CardState::InDiscard);
}

#[test]
fn test_empty_deck_reshuffles_discard() {
    let ann = Deck::new("Ann")
        .with(CardDefinition::base("Field", 100, [1, 0, 0]))
        .with_copies(pup(), 3);
    let mut game = GameBuilder::new(GameId(3), config().with_starting_hand(3))
        .player("ann", [ann])
        .build()
        .unwrap();
    game.start().unwrap();
    let field = base_named(&game, "Field");

    let pup = in_hand(&game, ANN, "Pup");
    game.play_card(ANN, pup, Some(field)).unwrap();
    game.perform_intent(IntentKind::DestroyMinion { minion: pup }).unwrap();
    assert!(game.state().player(ANN).unwrap().deck.is_empty());
    assert!(game.state().player(ANN).unwrap().discard.contains(pup));

    assert_eq!(game.draw_card(ANN).unwrap(), pup);
    let seat = game.state().player(ANN).unwrap();
    assert_eq!(seat.hand.len(), 3);
    assert!(seat.discard.is_empty());
    assert_eq!(game.state().card(pup).unwrap().state, CardState::InHand);

    let err = game.draw_card(ANN).unwrap_err();
    assert!(matches!(err, EngineError::Draw(DrawError::Exhausted { player }) if player == ANN));
    assert_eq!(game.state().player(ANN).unwrap().hand.len(), 3);
}

/// Counts every intent it sees while registered.
struct Watcher {
    seen: Arc<AtomicUsize>,
}

impl AbilityHandler for Watcher {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::Any]
    }

    fn callbacks(&self, _intent: &Intent, _state: &GameState) -> Callbacks {
        Callbacks::at(Tier::PostResolve)
    }

    fn invoke(
        &self,
        _callback: Callback,
        _intent: &mut Intent,
        _ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_destroyed_card_never_fires_again() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let watcher = CardDefinition::minion("Watcher", 2).with_ability(move |_| {
        Arc::new(Watcher {
            seen: Arc::clone(&counter),
        })
    });
    let ann = Deck::new("Ann")
        .with(CardDefinition::base("Arena", 30, [3, 2, 1]))
        .with_copies(pup(), 6)
        .with(watcher);
    let mut game = GameBuilder::new(GameId(4), config())
        .player("ann", [ann])
        .build()
        .unwrap();
    game.start().unwrap();
    let arena = base_named(&game, "Arena");

    let id = in_hand(&game, ANN, "Watcher");
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    game.play_card(ANN, id, Some(arena)).unwrap();
    // PlayMinion and ResolveMinionAbility.
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    // Planned before the destroy resolved, skipped after.
    game.perform_intent(IntentKind::DestroyMinion { minion: id }).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert!(!game.router().has_source(id));

    game.end_turn(ANN).unwrap();
    let pup = in_hand(&game, ANN, "Pup");
    game.play_card(ANN, pup, Some(arena)).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

/// Records whether the destroyed minion is still in play at each tier.
struct Probe {
    seen: Arc<Mutex<Vec<(Tier, bool)>>>,
}

impl AbilityHandler for Probe {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::DestroyMinion]
    }

    fn callbacks(&self, _intent: &Intent, _state: &GameState) -> Callbacks {
        Callbacks::at(Tier::PreResolve).and(Tier::Resolve)
    }

    fn invoke(
        &self,
        callback: Callback,
        intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        let minion = intent.kind().minion().unwrap();
        let in_play = ctx.state().is_in_play(minion);
        self.seen.lock().unwrap().push((callback.tier, in_play));
        Ok(())
    }
}

#[test]
fn test_state_changes_between_pre_resolve_and_resolve() {
    let mut game = two_player_game(config());
    game.start().unwrap();
    let arena = base_named(&game, "Arena");
    let four = in_hand(&game, ANN, "Four");
    game.play_card(ANN, four, Some(arena)).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    game.register_handler(Arc::new(Probe {
        seen: Arc::clone(&seen),
    }));
    game.perform_intent(IntentKind::DestroyMinion { minion: four }).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(Tier::PreResolve, true), (Tier::Resolve, false)]
    );
    assert!(game.state().minions_on(arena).is_empty());
}

#[test]
fn test_minion_leaving_takes_its_actions_along() {
    let ann = Deck::new("Ann")
        .with(CardDefinition::base("Arena", 30, [3, 2, 1]))
        .with_copies(pup(), 3)
        .with(CardDefinition::action("Saddle", ActionTarget::Minion))
        .with(CardDefinition::minion("Four", 4));
    let mut game = GameBuilder::new(GameId(5), config())
        .player("ann", [ann])
        .build()
        .unwrap();
    game.start().unwrap();
    let arena = base_named(&game, "Arena");

    let four = in_hand(&game, ANN, "Four");
    let saddle = in_hand(&game, ANN, "Saddle");
    game.play_card(ANN, four, Some(arena)).unwrap();
    game.play_card(ANN, saddle, Some(four)).unwrap();
    assert_eq!(game.state().card(four).unwrap().state.attached_actions(), &[saddle]);

    game.perform_intent(IntentKind::ReturnMinionToHand { minion: four }).unwrap();
    let state = game.state();
    assert_eq!(state.card(four).unwrap().state, CardState::InHand);
    assert_eq!(state.card(saddle).unwrap().state, CardState::InDiscard);
    assert!(state.player(ANN).unwrap().hand.contains(&four));
}
