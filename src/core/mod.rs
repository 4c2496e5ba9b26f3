//! Core engine types: entities, players, RNG, configuration, errors.
//!
//! These are the building blocks every other area depends on. None of them
//! know about intents, cards or the protocol.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod error;

pub use entity::{EntityAllocator, EntityId, GameId};
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use config::GameConfig;
pub use error::{DrawError, EngineError, ProtocolError, RuleViolation, SelectionError, SetupError};
