//! Card system: definitions, instances, states, and the per-game store.
//!
//! ## Key Types
//!
//! - `CardDefinition`: Static card data plus an optional ability factory
//! - `Deck`: A named set of definitions dealt to one player
//! - `Card` / `Base`: Runtime instances with their current state
//! - `CardState` / `BaseState`: Where an instance is and what it carries
//! - `CardStore`: Instance lookup by `EntityId`

pub mod definition;
pub mod instance;
pub mod registry;
pub mod state;

pub use definition::{AbilityFactory, ActionTarget, CardDefinition, CardKind, Deck};
pub use instance::{Base, Card};
pub use registry::CardStore;
pub use state::{BaseState, CardState};
