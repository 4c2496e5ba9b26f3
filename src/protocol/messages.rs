//! Logical client and server messages.
//!
//! Enums use serde's external tagging with snake_case names so both codecs
//! can carry them; in JSON a play looks like
//! `{"play_card":{"card_id":4,"target":1}}`.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GameId};
use crate::selection::SelectionOption;

/// Player to server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMessage {
    Authenticate { name: String },
    PlayCard { card_id: EntityId, target: Option<EntityId> },
    EndTurn,
    ReplySelection { request_id: u64, option_index: usize },
}

/// Server to player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMessage {
    JoinGame { game_id: GameId },
    SetCards { cards: Vec<CardInfo> },
    SetGameState(GameStateView),
    RequestSelection {
        request_id: u64,
        prompt: String,
        options: Vec<IndexedOption>,
    },
    EndGame { winner: String },
    ProtocolError { reason: String },
}

/// An option as presented to the player: the index to reply with, and what
/// it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedOption {
    pub id: usize,
    pub option: SelectionOption,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Minion,
    Action,
    Base,
}

/// Static data for one card in the game's roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: EntityId,
    pub name: String,
    pub text: String,
    pub kind: CardCategory,
    /// Owner's name. Bases have none.
    pub owner: Option<String>,
    /// Printed power, minions only.
    pub power: Option<i32>,
    /// Printed threshold, bases only.
    pub power_threshold: Option<i32>,
    /// First, second and third place points, bases only.
    pub award_points: Option<[u32; 3]>,
}

/// A card sitting on a base or attached to a minion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantView {
    pub id: EntityId,
    /// Effective power, minions only.
    pub power: Option<i32>,
    pub actions: Vec<OccupantView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseView {
    pub id: EntityId,
    pub power_total: i32,
    pub power_threshold: i32,
    /// Minions first, then base-level actions.
    pub cards: Vec<OccupantView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub points: u32,
    pub hand_size: usize,
    pub deck_size: usize,
    pub discard: Vec<EntityId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub player: String,
    pub minions: u32,
    pub actions: u32,
}

/// Everything one player is allowed to see, sent before every action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateView {
    pub game_id: GameId,
    pub bases: Vec<BaseView>,
    pub players: Vec<PlayerView>,
    pub turn: Option<TurnView>,
    /// The receiving player's own hand.
    pub hand: Vec<EntityId>,
}
