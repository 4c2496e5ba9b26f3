//! The Dinosaurs deck.
//!
//! A small faction deck used as the engine's reference content: two bases,
//! four minions and eight actions covering every tier, nested intents,
//! selections and both kinds of lingering effect.
//!
//! ```
//! use rust_ccg_server::games::dinosaurs;
//!
//! let deck = dinosaurs::deck();
//! assert_eq!(deck.bases.len(), 2);
//! assert!(deck.cards.iter().any(|c| c.name == "King Rex"));
//! ```

mod actions;
mod bases;
mod minions;

use crate::cards::Deck;
use crate::core::{EntityId, PlayerId};
use crate::engine::GameState;

pub use actions::{
    augmentation, howl, natural_selection, rampage, survival_of_the_fittest, tooth_and_claw, upgrade,
    wildlife_preserve,
};
pub use bases::{jungle_oasis, tar_pits};
pub use minions::{armor_stego, king_rex, laseratops, war_raptor};

/// The full deck: both bases and the usual card counts.
#[must_use]
pub fn deck() -> Deck {
    Deck::new("Dinosaurs")
        .with(jungle_oasis())
        .with(tar_pits())
        .with_copies(laseratops(), 2)
        .with_copies(war_raptor(), 4)
        .with_copies(armor_stego(), 3)
        .with(king_rex())
        .with(wildlife_preserve())
        .with(tooth_and_claw())
        .with(natural_selection())
        .with(howl())
        .with(rampage())
        .with(upgrade())
        .with(survival_of_the_fittest())
        .with(augmentation())
}

/// Controller of `card` if it is in play.
fn controller(state: &GameState, card: EntityId) -> Option<PlayerId> {
    state.card(card).and_then(|c| c.state.controller())
}
