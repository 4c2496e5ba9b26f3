//! # rust-ccg-server
//!
//! A server-side engine for turn-based collectible card games, where card
//! abilities are resolved through intents.
//!
//! ## Design Principles
//!
//! 1. **Everything Is an Intent**: Turns, plays, removals, power changes and
//!    scoring all flow through the same router, so any ability can watch,
//!    modify or veto any of them.
//!
//! 2. **Abilities Don't Touch State**: Handlers read a `GameState` and act by
//!    performing further intents. Lingering effects live in an engine-owned
//!    side table, not on the cards.
//!
//! 3. **One Thread per Game**: A game's worker owns it outright. Player
//!    commands are queued to it; selection replies go straight to the broker
//!    the worker is blocked on.
//!
//! ## Resolution
//!
//! Each intent is planned once: every handler interested in its type (or an
//! abstract ancestor) is asked which tiers it wants. Callbacks run from
//! `Cancel` to `PostResolve`; the engine applies the intent's own effect just
//! before `Resolve`; a cancel stops dispatch. Intents performed from inside a
//! callback resolve completely before it continues.
//!
//! ## Modules
//!
//! - `core`: Entity and player ids, RNG, configuration, errors
//! - `cards`: Card definitions, instances, states and the card store
//! - `zones`: Ordered piles (decks and discards)
//! - `intents`: Intent hierarchy, tiers, handlers and the router
//! - `selection`: The selection broker
//! - `engine`: Game state, rules, effects, snapshots and the worker
//! - `protocol`: Client/server messages, codecs and connections
//! - `server`: Hosting games and routing sessions to them
//! - `games`: Card content

pub mod core;
pub mod cards;
pub mod zones;
pub mod intents;
pub mod selection;
pub mod engine;
pub mod protocol;
pub mod server;
pub mod games;

// Re-export commonly used types
pub use crate::core::{
    EntityId, GameId, PlayerId, PlayerMap,
    GameRng, GameConfig,
    EngineError, ProtocolError, RuleViolation, SelectionError, SetupError, DrawError,
};

pub use crate::cards::{
    ActionTarget, CardDefinition, CardKind, Deck,
    Card, Base, CardState, BaseState, CardStore,
};

pub use crate::zones::{Pile, PilePosition};

pub use crate::intents::{
    AbilityHandler, Callback, Callbacks, HandlerId,
    Intent, IntentKind, IntentType, IntentRouter, Tier,
};

pub use crate::selection::{RequestId, SelectionBroker, SelectionOption, SelectionRequest};

pub use crate::engine::{
    AbilityContext, EffectId, EffectKey, EffectTable, Expiry, ScratchEffect,
    Game, GameBuilder, GameHandle, GameOutcome, GameState, PlayOutcome,
};

pub use crate::protocol::{
    ClientMessage, ServerMessage, GameStateView,
    Codec, JsonCodec, BincodeCodec,
    Connection, ChannelConnection, Outbox,
};

pub use crate::server::{Server, Session};
