//! Error taxonomy.
//!
//! Each layer has its own error enum; `EngineError` wraps them all so the
//! engine can propagate any of them with `?`.

use thiserror::Error;

use super::{EntityId, PlayerId};

/// A player tried something the rules don't allow right now.
///
/// These are never fatal: the game loop logs them and ignores the action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("the game is not running")]
    GameNotRunning,

    #[error("no turn is in progress")]
    NoTurnInProgress,

    #[error("no such seat: {0}")]
    UnknownPlayer(PlayerId),

    #[error("{player} acted out of turn")]
    NotYourTurn { player: PlayerId },

    #[error("unknown card {0}")]
    UnknownCard(EntityId),

    #[error("{player} does not own {card}")]
    NotOwner { player: PlayerId, card: EntityId },

    #[error("{0} is not in its owner's hand")]
    NotInHand(EntityId),

    #[error("no minion plays left this turn")]
    NoMinionPlaysLeft,

    #[error("no action plays left this turn")]
    NoActionPlaysLeft,

    #[error("{0} needs a target")]
    MissingTarget(EntityId),

    #[error("{target} is not a valid target for {card}")]
    InvalidTarget { card: EntityId, target: EntityId },

    #[error("{0} cannot be played")]
    NotPlayable(EntityId),
}

/// A client message that doesn't fit the protocol or the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("no outstanding request {0}")]
    UnknownRequest(u64),

    #[error("request {0} was not addressed to this player")]
    WrongResponder(u64),

    #[error("option {index} is out of range for request {request}")]
    OptionOutOfRange { request: u64, index: usize },

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("authenticate first")]
    NotAuthenticated,

    #[error("unknown player {0}")]
    UnknownPlayer(String),

    #[error("not joined to a game")]
    NotInGame,

    #[error("the game has closed")]
    GameClosed,
}

/// A selection request could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("selection offered no options")]
    NoOptions,

    #[error("a selection batch is already in flight")]
    BatchInFlight,

    #[error("selection timed out")]
    TimedOut,

    #[error("{player} left before answering")]
    Abandoned { player: PlayerId },

    #[error("a reply went missing from the batch")]
    MissingAnswer,
}

/// A player needed a card and had none anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("{player} has no cards left to draw")]
    Exhausted { player: PlayerId },
}

/// A game could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("a game needs at least one player")]
    NoPlayers,

    #[error("at most 255 players are supported, got {0}")]
    TooManyPlayers(usize),

    #[error("{needed} bases needed in play but the decks hold {available}")]
    NotEnoughBases { needed: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Anything that can go wrong inside a running game.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("intents nested deeper than {0}")]
    IntentDepthExceeded(usize),

    #[error("the game's inbound queue closed")]
    InboundClosed,

    #[error("failed to start the game thread")]
    Spawn(#[source] std::io::Error),

    #[error("the game thread panicked")]
    WorkerPanicked,

    #[error("the game thread was already joined")]
    AlreadyJoined,
}

impl EngineError {
    /// Whether the game loop should shrug this off and keep going.
    #[must_use]
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, EngineError::Rule(_))
    }

    /// Whether the current turn should be abandoned but the game kept alive.
    #[must_use]
    pub fn aborts_turn(&self) -> bool {
        matches!(self, EngineError::Selection(_))
    }
}
