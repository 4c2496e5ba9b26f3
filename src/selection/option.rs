//! Selection requests and the options they offer.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

/// Identifier of one outstanding question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request({})", self.0)
    }
}

/// Something a player can pick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOption {
    Card { card: EntityId },
    Deck { name: String },
    Player { player: PlayerId, name: String },
    Text { text: String },
}

impl SelectionOption {
    #[must_use]
    pub fn card(&self) -> Option<EntityId> {
        match self {
            SelectionOption::Card { card } => Some(*card),
            _ => None,
        }
    }

    #[must_use]
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            SelectionOption::Player { player, .. } => Some(*player),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            SelectionOption::Text { text } => Some(text),
            _ => None,
        }
    }
}

impl From<EntityId> for SelectionOption {
    fn from(card: EntityId) -> Self {
        SelectionOption::Card { card }
    }
}

/// One question for one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
    pub player: PlayerId,
    pub prompt: String,
    pub options: Vec<SelectionOption>,
}

impl SelectionRequest {
    #[must_use]
    pub fn new(player: PlayerId, prompt: impl Into<String>, options: Vec<SelectionOption>) -> Self {
        Self {
            player,
            prompt: prompt.into(),
            options,
        }
    }

    /// A request to pick one of `cards`.
    #[must_use]
    pub fn cards(player: PlayerId, prompt: impl Into<String>, cards: &[EntityId]) -> Self {
        Self::new(player, prompt, cards.iter().copied().map(SelectionOption::from).collect())
    }
}
