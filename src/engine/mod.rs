//! The turn-synchronous game engine.
//!
//! ## Key Types
//!
//! - `Game`: Owns one game's state, router, effects and RNG; performs intents
//! - `GameBuilder`: Seats players, deals decks and bases
//! - `GameState`: Players, card instances, bases in play, the active turn
//! - `AbilityContext`: A handler's view of the game while it runs
//! - `EffectTable`: Lingering "until end of turn" and "while in play" effects
//! - `GameHandle`: A game running on its own worker thread
//!
//! ## Turn Flow
//!
//! 1. `StartTurn` is performed for the active seat.
//! 2. The player plays cards; each play validates, enters play, and is
//!    dispatched as a play intent followed by an ability resolve intent.
//! 3. On end of turn every base at or over its threshold is scored and
//!    replaced, `EndTurn` is performed, and the player draws.
//! 4. A unique leader at or above the point target wins; otherwise the next
//!    seat begins.

pub mod context;
pub mod effects;
pub mod game;
pub mod resolve;
pub mod scoring;
pub mod snapshot;
pub mod state;
pub mod worker;

pub use context::AbilityContext;
pub use effects::{EffectId, EffectKey, EffectTable, Expiry, ScratchEffect};
pub use game::{Game, GameBuilder, PlayOutcome};
pub use resolve::Destination;
pub use scoring::{standings, Standing};
pub use state::{GamePhase, GameState, Player, TurnState};
pub use worker::{GameHandle, GameOutcome, PlayerAction, PlayerCommand};
