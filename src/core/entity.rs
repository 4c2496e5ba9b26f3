//! Entity identification.
//!
//! Every card and base in a game has a unique `EntityId`. Ids are handed out
//! by an `EntityAllocator` owned by the game, in allocation order, so the
//! same decks dealt with the same seed always produce the same ids.
//!
//! ```
//! use rust_ccg_server::core::{EntityAllocator, EntityId};
//!
//! let mut ids = EntityAllocator::new();
//! assert_eq!(ids.alloc(), EntityId(0));
//! assert_eq!(ids.alloc(), EntityId(1));
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a card or base within one game instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Identifier for a hosted game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u32);

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Game({})", self.0)
    }
}

/// Sequential id source for one game.
#[derive(Clone, Debug, Default)]
pub struct EntityAllocator {
    next: u32,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next unused id.
    pub fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.next as usize
    }
}
