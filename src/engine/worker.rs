//! The game worker thread and its handle.
//!
//! Each game runs on its own thread and owns its `Game` outright. Player
//! actions reach it through a crossbeam channel of `PlayerCommand`s; replies
//! to selection prompts skip the queue and go straight to the broker, since
//! the worker is blocked waiting for them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use super::game::Game;
use crate::core::{EngineError, EntityId, GameId, PlayerId, ProtocolError};
use crate::protocol::{ClientMessage, Connection, Outbox, ServerMessage};
use crate::selection::{RequestId, SelectionBroker};

/// What a player asked the game to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    PlayCard { card: EntityId, target: Option<EntityId> },
    EndTurn,
    /// A connection for this player was attached.
    Attached,
    /// The player's last connection went away.
    Disconnected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerCommand {
    pub player: PlayerId,
    pub action: PlayerAction,
}

/// How a finished game ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: PlayerId,
    pub winner_name: String,
    /// Turns begun over the whole game.
    pub turns: u32,
}

impl Game {
    /// Run the game to completion, taking commands from `inbound`.
    ///
    /// Rule violations are logged and ignored. A failed selection ends the
    /// active turn early. Returns `EngineError::InboundClosed` if the command
    /// channel closes before anyone wins.
    pub fn run(mut self, inbound: Receiver<PlayerCommand>) -> Result<GameOutcome, EngineError> {
        let started = self.start();
        self.settle(started)?;

        let winner = loop {
            if let Some(winner) = self.winner() {
                break winner;
            }
            self.broadcast_state();

            let command = inbound.recv().map_err(|_| EngineError::InboundClosed)?;
            debug!(target: "ccg::engine", player = %command.player, action = ?command.action, "command.received");
            let result = self.dispatch(command);
            self.settle(result)?;
        };

        let winner_name = self
            .state
            .player(winner)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.broadcast_state();
        self.outbox.broadcast(&ServerMessage::EndGame {
            winner: winner_name.clone(),
        });
        info!(target: "ccg::engine", game = %self.id, %winner, turns = self.state.turn_number, "game.over");

        Ok(GameOutcome {
            winner,
            winner_name,
            turns: self.state.turn_number,
        })
    }

    fn dispatch(&mut self, command: PlayerCommand) -> Result<(), EngineError> {
        let PlayerCommand { player, action } = command;
        match action {
            PlayerAction::PlayCard { card, target } => self.play_card(player, card, target).map(|_| ()),
            PlayerAction::EndTurn => self.end_turn(player),
            PlayerAction::Attached => {
                self.send_cards_to(player);
                Ok(())
            }
            PlayerAction::Disconnected => {
                if self.state.active_player() == Some(player) && !self.outbox.has_connections(player) {
                    self.abort_turn()
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Absorb what a command left behind: ignore rule violations, abort the
    /// turn after a failed selection, pass anything else up.
    fn settle(&mut self, result: Result<(), EngineError>) -> Result<(), EngineError> {
        let mut result = result;
        // Aborting begins the next turn, which can itself need a selection.
        for _ in 0..=self.state.player_count() {
            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_rule_violation() => {
                    debug!(target: "ccg::engine", error = %e, "command.ignored");
                    return Ok(());
                }
                Err(e) if e.aborts_turn() => {
                    warn!(target: "ccg::engine", error = %e, "selection.failed");
                    result = self.abort_turn();
                }
                Err(e) => return Err(e),
            }
        }
        if let Err(e) = result {
            warn!(
                target: "ccg::engine",
                error = %e,
                attempts = self.state.player_count() + 1,
                "turn.abort.exhausted"
            );
        }
        Ok(())
    }
}

/// The host's side of a running game.
///
/// Cloneable pieces (broker, outbox) are shared with the worker; the command
/// sender and the join handle live here.
pub struct GameHandle {
    id: GameId,
    players: Vec<String>,
    broker: Arc<SelectionBroker>,
    outbox: Arc<Outbox>,
    inbound: Mutex<Option<Sender<PlayerCommand>>>,
    worker: Mutex<Option<JoinHandle<Result<GameOutcome, EngineError>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GameHandle {
    /// Start `game` on a new thread.
    pub fn spawn(game: Game) -> Result<Self, EngineError> {
        let id = game.id();
        let players = game.state().players.values().map(|p| p.name.clone()).collect();
        let broker = Arc::clone(game.broker());
        let outbox = Arc::clone(game.outbox());
        let (tx, rx) = crossbeam_channel::unbounded();

        let worker = std::thread::Builder::new()
            .name(format!("game-{}", id.0))
            .spawn(move || game.run(rx))
            .map_err(EngineError::Spawn)?;
        info!(target: "ccg::server", game = %id, "worker.spawned");

        Ok(Self {
            id,
            players,
            broker,
            outbox,
            inbound: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    #[must_use]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub fn player_names(&self) -> &[String] {
        &self.players
    }

    #[must_use]
    pub fn player_id(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .position(|p| p == name)
            .map(|seat| PlayerId(seat as u8))
    }

    fn enqueue(&self, player: PlayerId, action: PlayerAction) -> Result<(), ProtocolError> {
        let inbound = lock(&self.inbound);
        let sender = inbound.as_ref().ok_or(ProtocolError::GameClosed)?;
        sender
            .send(PlayerCommand { player, action })
            .map_err(|_| ProtocolError::GameClosed)
    }

    /// Route a message from an authenticated player.
    pub fn receive(&self, name: &str, message: ClientMessage) -> Result<(), ProtocolError> {
        let player = self
            .player_id(name)
            .ok_or_else(|| ProtocolError::UnknownPlayer(name.to_string()))?;
        match message {
            ClientMessage::ReplySelection {
                request_id,
                option_index,
            } => self
                .broker
                .deliver_reply(player, RequestId(request_id), option_index),
            ClientMessage::PlayCard { card_id, target } => self.enqueue(
                player,
                PlayerAction::PlayCard {
                    card: card_id,
                    target,
                },
            ),
            ClientMessage::EndTurn => self.enqueue(player, PlayerAction::EndTurn),
            ClientMessage::Authenticate { .. } => {
                Err(ProtocolError::Malformed("already authenticated".into()))
            }
        }
    }

    /// Attach a connection for `name` and bring it up to date.
    pub fn attach(&self, name: &str, connection: Arc<dyn Connection>) -> Result<PlayerId, ProtocolError> {
        let player = self
            .player_id(name)
            .ok_or_else(|| ProtocolError::UnknownPlayer(name.to_string()))?;
        connection.send(&ServerMessage::JoinGame { game_id: self.id });
        self.outbox.add(player, connection);
        debug!(target: "ccg::server", game = %self.id, %player, "connection.attached");
        // A finished game can still be watched.
        if let Err(e) = self.enqueue(player, PlayerAction::Attached) {
            debug!(target: "ccg::server", game = %self.id, %player, error = %e, "attach.not_queued");
        }
        Ok(player)
    }

    /// Detach one connection. When it was the player's last, any selection
    /// waiting on them fails and the game is told.
    pub fn detach(&self, name: &str, connection: &Arc<dyn Connection>) {
        let Some(player) = self.player_id(name) else {
            return;
        };
        self.outbox.remove(player, connection);
        if self.outbox.has_connections(player) {
            return;
        }
        debug!(target: "ccg::server", game = %self.id, %player, "player.disconnected");
        self.broker.abandon(player);
        if let Err(e) = self.enqueue(player, PlayerAction::Disconnected) {
            debug!(target: "ccg::server", game = %self.id, %player, error = %e, "detach.not_queued");
        }
    }

    /// Stop accepting commands. A worker still waiting for one exits with
    /// `EngineError::InboundClosed`.
    pub fn close(&self) {
        lock(&self.inbound).take();
    }

    /// Whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        lock(&self.worker).as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker and return how the game went.
    pub fn join(&self) -> Result<GameOutcome, EngineError> {
        let worker = lock(&self.worker).take().ok_or(EngineError::AlreadyJoined)?;
        worker.join().map_err(|_| EngineError::WorkerPanicked)?
    }
}

impl std::fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHandle")
            .field("id", &self.id)
            .field("players", &self.players)
            .finish()
    }
}
