//! Dinosaurs deck ability tests.
//!
//! Ann's deck is her test cards over six Pups, on a single high-threshold
//! base, so nothing scores unless a test wants it to. Abilities that ask
//! for a selection are answered by an autopilot thread attached as Ann's
//! connection.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rust_ccg_server::cards::{CardDefinition, CardState, Deck};
use rust_ccg_server::core::{EntityId, GameConfig, GameId, PlayerId};
use rust_ccg_server::engine::{Game, GameBuilder, PlayOutcome};
use rust_ccg_server::games::dinosaurs;
use rust_ccg_server::intents::IntentKind;
use rust_ccg_server::protocol::{ChannelConnection, IndexedOption, ServerMessage};
use rust_ccg_server::selection::RequestId;

const ANN: PlayerId = PlayerId::new(0);
const BEN: PlayerId = PlayerId::new(1);

fn pup() -> CardDefinition {
    CardDefinition::minion("Pup", 1)
}

fn arena() -> CardDefinition {
    CardDefinition::base("Arena", 100, [3, 2, 1])
}

fn game_on(base: CardDefinition, cards: &[CardDefinition]) -> Game {
    let mut config = GameConfig::default().unshuffled().with_bases_in_play(1);
    config.minions_per_turn = 3;
    config.actions_per_turn = 2;

    let ann = cards
        .iter()
        .cloned()
        .fold(Deck::new("Ann").with(base).with_copies(pup(), 6), Deck::with);
    let ben = Deck::new("Ben").with_copies(pup(), 6);
    let mut game = GameBuilder::new(GameId(1), config)
        .player("ann", [ann])
        .player("ben", [ben])
        .build()
        .unwrap();
    game.start().unwrap();
    game
}

fn game_with(cards: &[CardDefinition]) -> Game {
    game_on(arena(), cards)
}

fn the_base(game: &Game) -> EntityId {
    game.state().bases_in_play()[0]
}

fn all_in_hand(game: &Game, player: PlayerId, name: &str) -> Vec<EntityId> {
    let state = game.state();
    state
        .player(player)
        .unwrap()
        .hand
        .iter()
        .copied()
        .filter(|id| state.card(*id).unwrap().name() == name)
        .collect()
}

fn in_hand(game: &Game, name: &str) -> EntityId {
    all_in_hand(game, ANN, name)[0]
}

fn power(game: &Game, minion: EntityId) -> Option<i32> {
    game.state().minion_power(minion)
}

fn play(game: &mut Game, card: EntityId, target: Option<EntityId>) {
    assert_eq!(game.play_card(ANN, card, target).unwrap(), PlayOutcome::Played);
}

/// Answer every selection Ann is asked with `pick`.
fn autopilot(game: &Game, pick: impl Fn(&[IndexedOption]) -> usize + Send + 'static) {
    let (conn, rx) = ChannelConnection::pair();
    game.outbox().add(ANN, Arc::new(conn));
    let broker = Arc::clone(game.broker());
    thread::spawn(move || {
        while let Ok(message) = rx.recv_timeout(Duration::from_secs(5)) {
            if let ServerMessage::RequestSelection {
                request_id, options, ..
            } = message
            {
                broker
                    .deliver_reply(ANN, RequestId(request_id), pick(&options))
                    .unwrap();
            }
        }
    });
}

/// Pick `card` when offered, otherwise the first option.
fn prefer(card: EntityId) -> impl Fn(&[IndexedOption]) -> usize + Send + 'static {
    move |options: &[IndexedOption]| {
        options
            .iter()
            .position(|o| o.option.card() == Some(card))
            .unwrap_or(0)
    }
}

#[test]
fn test_war_raptors_count_each_other() {
    let raptor = dinosaurs::war_raptor();
    let mut game = game_with(&[raptor.clone(), raptor.clone(), raptor]);
    let base = the_base(&game);
    let raptors = all_in_hand(&game, ANN, "War Raptor");
    assert_eq!(raptors.len(), 3);

    play(&mut game, raptors[0], Some(base));
    assert_eq!(power(&game, raptors[0]), Some(3));

    play(&mut game, raptors[1], Some(base));
    assert_eq!(power(&game, raptors[0]), Some(4));
    assert_eq!(power(&game, raptors[1]), Some(4));

    play(&mut game, raptors[2], Some(base));
    assert!(raptors.iter().all(|r| power(&game, *r) == Some(5)));

    game.perform_intent(IntentKind::DestroyMinion { minion: raptors[2] })
        .unwrap();
    assert_eq!(power(&game, raptors[0]), Some(4));
    assert_eq!(power(&game, raptors[1]), Some(4));
    assert_eq!(game.state().base_power(base), 8);
}

#[test]
fn test_armor_stego_is_tougher_off_turn() {
    let mut game = game_with(&[dinosaurs::armor_stego()]);
    let base = the_base(&game);
    let stego = in_hand(&game, "Armor Stego");

    play(&mut game, stego, Some(base));
    assert_eq!(power(&game, stego), Some(3));

    game.end_turn(ANN).unwrap();
    assert_eq!(power(&game, stego), Some(5));
    game.end_turn(BEN).unwrap();
    assert_eq!(power(&game, stego), Some(3));

    // Handing it to the player who isn't active counts as an off turn.
    game.perform_intent(IntentKind::ChangeCardController {
        card: stego,
        new_controller: BEN,
    })
    .unwrap();
    assert_eq!(game.state().controller_of(stego), Some(BEN));
    assert_eq!(power(&game, stego), Some(5));
}

#[test]
fn test_laseratops_destroys_a_small_minion() {
    let mut game = game_with(&[dinosaurs::laseratops()]);
    autopilot(&game, |_| 0);
    let base = the_base(&game);
    let pup = in_hand(&game, "Pup");
    let laseratops = in_hand(&game, "Laseratops");

    play(&mut game, pup, Some(base));
    play(&mut game, laseratops, Some(base));

    assert_eq!(game.state().minions_on(base), &[laseratops]);
    assert_eq!(game.state().card(pup).unwrap().state, CardState::InDiscard);
}

#[test]
fn test_laseratops_alone_asks_nothing() {
    // No connection attached: a selection would fail the play.
    let mut game = game_with(&[dinosaurs::laseratops()]);
    let base = the_base(&game);
    let laseratops = in_hand(&game, "Laseratops");

    play(&mut game, laseratops, Some(base));
    assert_eq!(game.state().minions_on(base), &[laseratops]);
}

#[test]
fn test_tooth_and_claw_absorbs_one_removal() {
    let mut game = game_with(&[dinosaurs::king_rex(), dinosaurs::tooth_and_claw()]);
    let base = the_base(&game);
    let rex = in_hand(&game, "King Rex");
    let guns = in_hand(&game, "Tooth and Claw... and Guns");

    play(&mut game, rex, Some(base));
    play(&mut game, guns, Some(rex));

    let first = game.perform_intent(IntentKind::DestroyMinion { minion: rex }).unwrap();
    assert!(first.is_cancelled());
    assert!(game.state().is_minion_in_play(rex));
    assert_eq!(game.state().card(guns).unwrap().state, CardState::InDiscard);
    assert!(game.state().card(rex).unwrap().state.attached_actions().is_empty());

    let second = game.perform_intent(IntentKind::DestroyMinion { minion: rex }).unwrap();
    assert!(!second.is_cancelled());
    assert_eq!(game.state().card(rex).unwrap().state, CardState::InDiscard);
}

#[test]
fn test_wildlife_preserve_shelters_own_minions() {
    let mut game = game_with(&[dinosaurs::wildlife_preserve()]);
    let base = the_base(&game);
    let pup = in_hand(&game, "Pup");
    let preserve = in_hand(&game, "Wildlife Preserve");

    play(&mut game, pup, Some(base));
    play(&mut game, preserve, Some(base));

    let destroy = game.perform_intent(IntentKind::DestroyMinion { minion: pup }).unwrap();
    assert!(destroy.is_cancelled());
    let bounce = game
        .perform_intent(IntentKind::ReturnMinionToHand { minion: pup })
        .unwrap();
    assert!(bounce.is_cancelled());
    assert!(game.state().is_minion_in_play(pup));

    // Power changes are not protected against.
    game.perform_intent(IntentKind::ModifyMinionPower { minion: pup, off: 1 })
        .unwrap();
    assert_eq!(power(&game, pup), Some(2));

    game.perform_intent(IntentKind::DestroyAction { action: preserve })
        .unwrap();
    game.perform_intent(IntentKind::DestroyMinion { minion: pup }).unwrap();
    assert!(!game.state().is_minion_in_play(pup));
}

#[test]
fn test_upgrade_lasts_while_attached() {
    let mut game = game_with(&[dinosaurs::king_rex(), dinosaurs::upgrade()]);
    let base = the_base(&game);
    let rex = in_hand(&game, "King Rex");
    let upgrade = in_hand(&game, "Upgrade");

    play(&mut game, rex, Some(base));
    play(&mut game, upgrade, Some(rex));
    assert_eq!(power(&game, rex), Some(9));
    assert_eq!(game.effects().len(), 1);

    // Survives the end of the turn.
    game.end_turn(ANN).unwrap();
    assert_eq!(power(&game, rex), Some(9));

    game.perform_intent(IntentKind::DestroyAction { action: upgrade })
        .unwrap();
    assert_eq!(power(&game, rex), Some(7));
    assert!(game.effects().is_empty());
}

#[test]
fn test_upgrade_needs_an_own_minion() {
    let mut game = game_with(&[dinosaurs::upgrade()]);
    let upgrade = in_hand(&game, "Upgrade");
    let err = game.play_card(ANN, upgrade, None).unwrap_err();
    assert!(err.is_rule_violation());
}

#[test]
fn test_howl_wears_off_at_end_of_turn() {
    let mut game = game_with(&[dinosaurs::king_rex(), dinosaurs::howl()]);
    let base = the_base(&game);
    let rex = in_hand(&game, "King Rex");
    let pup = in_hand(&game, "Pup");
    let howl = in_hand(&game, "Howl");

    play(&mut game, rex, Some(base));
    play(&mut game, pup, Some(base));
    play(&mut game, howl, None);

    assert_eq!(power(&game, rex), Some(8));
    assert_eq!(power(&game, pup), Some(2));
    assert_eq!(game.state().card(howl).unwrap().state, CardState::InDiscard);
    assert_eq!(game.effects().len(), 2);

    game.end_turn(ANN).unwrap();
    assert_eq!(power(&game, rex), Some(7));
    assert_eq!(power(&game, pup), Some(1));
    assert!(game.effects().is_empty());
}

#[test]
fn test_augmentation_boosts_any_minion() {
    let mut game = game_with(&[dinosaurs::augmentation()]);
    autopilot(&game, |_| 0);
    let base = the_base(&game);
    let pup = in_hand(&game, "Pup");
    let augmentation = in_hand(&game, "Augmentation");

    play(&mut game, pup, Some(base));
    play(&mut game, augmentation, None);
    assert_eq!(power(&game, pup), Some(5));

    game.end_turn(ANN).unwrap();
    assert_eq!(power(&game, pup), Some(1));
}

#[test]
fn test_rampage_lowers_the_threshold_for_a_turn() {
    let mut game = game_with(&[dinosaurs::king_rex(), dinosaurs::rampage()]);
    autopilot(&game, |_| 0);
    let base = the_base(&game);
    let rex = in_hand(&game, "King Rex");
    let rampage = in_hand(&game, "Rampage");

    play(&mut game, rex, Some(base));
    play(&mut game, rampage, None);
    assert_eq!(game.state().base_threshold(base), Some(93));

    game.end_turn(ANN).unwrap();
    assert_eq!(game.state().base_threshold(base), Some(100));
    assert_eq!(game.state().player(ANN).unwrap().points, 0);
}

#[test]
fn test_natural_selection_hunts_weaker_prey() {
    let mut game = game_with(&[dinosaurs::king_rex(), dinosaurs::natural_selection()]);
    let base = the_base(&game);
    let rex = in_hand(&game, "King Rex");
    let pup = in_hand(&game, "Pup");
    let hunt = in_hand(&game, "Natural Selection");
    autopilot(&game, prefer(rex));

    play(&mut game, rex, Some(base));
    play(&mut game, pup, Some(base));
    play(&mut game, hunt, None);

    assert_eq!(game.state().minions_on(base), &[rex]);
    assert_eq!(game.state().card(pup).unwrap().state, CardState::InDiscard);
}

#[test]
fn test_survival_of_the_fittest_culls_one_of_the_weakest() {
    let mut game = game_with(&[dinosaurs::king_rex(), dinosaurs::survival_of_the_fittest()]);
    autopilot(&game, |_| 0);
    let base = the_base(&game);
    let rex = in_hand(&game, "King Rex");
    let pups = all_in_hand(&game, ANN, "Pup");
    let survival = in_hand(&game, "Survival of the Fittest");

    play(&mut game, rex, Some(base));
    play(&mut game, pups[0], Some(base));
    play(&mut game, pups[1], Some(base));
    play(&mut game, survival, None);

    let left = game.state().minions_on(base);
    assert_eq!(left.len(), 2);
    assert!(left.contains(&rex));
    let culled = pups.iter().filter(|p| !left.contains(p)).count();
    assert_eq!(culled, 1);
}

#[test]
fn test_tar_pits_sinks_destroyed_minions() {
    let mut game = game_on(dinosaurs::tar_pits(), &[]);
    let base = the_base(&game);
    let pup = in_hand(&game, "Pup");

    play(&mut game, pup, Some(base));
    game.perform_intent(IntentKind::DestroyMinion { minion: pup }).unwrap();

    let seat = game.state().player(ANN).unwrap();
    assert_eq!(game.state().card(pup).unwrap().state, CardState::InDeck);
    assert_eq!(seat.deck.iter().next(), Some(pup));
    assert!(seat.discard.is_empty());
}

#[test]
fn test_full_deck_sets_up() {
    let game = GameBuilder::new(GameId(9), GameConfig::default().with_seed(42))
        .player("ann", [dinosaurs::deck()])
        .player("ben", [dinosaurs::deck()])
        .build()
        .unwrap();
    let state = game.state();

    assert_eq!(state.bases_in_play().len(), 3);
    assert_eq!(state.base_deck.len(), 1);
    for seat in state.players.values() {
        assert_eq!(seat.hand.len(), 5);
        assert_eq!(seat.deck.len(), 13);
    }
}
