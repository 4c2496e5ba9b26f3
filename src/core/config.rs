//! Game configuration.
//!
//! `GameConfig` carries every tunable rule constant. It deserializes from
//! JSON with all fields optional, so a host only spells out what differs
//! from the defaults:
//!
//! ```
//! use rust_ccg_server::core::GameConfig;
//!
//! let config = GameConfig::from_json(r#"{ "point_max": 10, "seed": 7 }"#).unwrap();
//! assert_eq!(config.point_max, 10);
//! assert_eq!(config.starting_hand, 5);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SetupError;

/// Rule constants for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Points needed to win (a unique leader at or above this wins).
    pub point_max: u32,

    /// Cards drawn by each player during setup.
    pub starting_hand: usize,

    /// Cards drawn by the active player at the end of their turn.
    pub draw_per_turn: usize,

    /// Minion plays available at the start of each turn.
    pub minions_per_turn: u32,

    /// Action plays available at the start of each turn.
    pub actions_per_turn: u32,

    /// Bases dealt into play at setup. `None` means one more than the
    /// number of players.
    pub bases_in_play: Option<usize>,

    /// Seed for every shuffle in the game.
    pub seed: u64,

    /// Shuffle decks during setup. Disabled in tests that need a known
    /// deal.
    pub shuffle: bool,

    /// How long a selection request may wait for its replies. `None` waits
    /// until answered or abandoned.
    pub selection_timeout_ms: Option<u64>,

    /// Maximum nesting of intents emitted from within other intents.
    pub max_intent_depth: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            point_max: 15,
            starting_hand: 5,
            draw_per_turn: 2,
            minions_per_turn: 1,
            actions_per_turn: 1,
            bases_in_play: None,
            seed: 0,
            shuffle: true,
            selection_timeout_ms: None,
            max_intent_depth: 64,
        }
    }
}

impl GameConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SetupError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.point_max == 0 {
            return Err(SetupError::InvalidConfig("point_max must be positive".into()));
        }
        if self.max_intent_depth == 0 {
            return Err(SetupError::InvalidConfig(
                "max_intent_depth must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of bases to keep in play for `player_count` players.
    #[must_use]
    pub fn bases_for(&self, player_count: usize) -> usize {
        self.bases_in_play.unwrap_or(player_count + 1)
    }

    #[must_use]
    pub fn selection_timeout(&self) -> Option<Duration> {
        self.selection_timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn with_point_max(mut self, points: u32) -> Self {
        self.point_max = points;
        self
    }

    #[must_use]
    pub fn with_starting_hand(mut self, cards: usize) -> Self {
        self.starting_hand = cards;
        self
    }

    #[must_use]
    pub fn with_draw_per_turn(mut self, cards: usize) -> Self {
        self.draw_per_turn = cards;
        self
    }

    #[must_use]
    pub fn with_bases_in_play(mut self, bases: usize) -> Self {
        self.bases_in_play = Some(bases);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Keep decks in the order they were dealt (last card listed on top).
    #[must_use]
    pub fn unshuffled(mut self) -> Self {
        self.shuffle = false;
        self
    }

    #[must_use]
    pub fn with_selection_timeout(mut self, timeout: Duration) -> Self {
        self.selection_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.point_max, 15);
        assert_eq!(config.draw_per_turn, 2);
        assert_eq!(config.bases_for(2), 3);
        assert_eq!(config.bases_for(4), 5);
        assert_eq!(config.selection_timeout(), None);
    }

    #[test]
    fn test_builder() {
        let config = GameConfig::new()
            .with_point_max(10)
            .with_bases_in_play(1)
            .with_selection_timeout(Duration::from_millis(250))
            .unshuffled();

        assert_eq!(config.point_max, 10);
        assert_eq!(config.bases_for(2), 1);
        assert_eq!(config.selection_timeout(), Some(Duration::from_millis(250)));
        assert!(!config.shuffle);
    }

    #[test]
    fn test_partial_json() {
        let config = GameConfig::from_json(r#"{ "draw_per_turn": 3 }"#).unwrap();
        assert_eq!(config.draw_per_turn, 3);
        assert_eq!(config.point_max, 15);
    }

    #[test]
    fn test_rejects_zero_point_max() {
        let err = GameConfig::from_json(r#"{ "point_max": 0 }"#).unwrap_err();
        assert!(matches!(err, SetupError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(GameConfig::from_json("{ not json").is_err());
    }
}
