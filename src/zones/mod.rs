//! Card piles.
//!
//! Hands are plain `Vec`s on the player; everything with an order that
//! matters (decks, discards, the shared base deck) is a `Pile`.

pub mod pile;

pub use pile::{Pile, PilePosition};
