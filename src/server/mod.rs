//! Game hosting.
//!
//! The `Server` owns every running game and the map from player name to
//! seat. A transport creates one `Session` per accepted connection and
//! feeds it decoded `ClientMessage`s (or raw frames plus a `Codec`).
//!
//! ## Session lifecycle
//!
//! 1. `connect` opens an unauthenticated session.
//! 2. `Authenticate { name }` binds the session to the game that seats
//!    `name` and attaches the connection; the client gets `JoinGame`, the
//!    card roster and a state snapshot.
//! 3. Everything else is routed to that game. Errors are answered with
//!    `ServerMessage::ProtocolError` and never close the session.
//! 4. `disconnect` detaches the connection.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::cards::Deck;
use crate::core::{EngineError, GameConfig, GameId, ProtocolError};
use crate::engine::{GameBuilder, GameHandle, GameOutcome};
use crate::protocol::{ClientMessage, Codec, Connection, Outbox, ServerMessage};

/// One client connection's view of the server.
pub struct Session {
    user: Option<String>,
    connection: Arc<dyn Connection>,
}

impl Session {
    /// The authenticated name, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("user", &self.user).finish()
    }
}

/// Hosts games and routes sessions to them.
#[derive(Default)]
pub struct Server {
    games: Mutex<FxHashMap<GameId, Arc<GameHandle>>>,
    seats: Mutex<FxHashMap<String, GameId>>,
    next_id: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Server {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a game for the named players and start it on its own thread.
    ///
    /// A name already seated in a running game is moved to the new one.
    pub fn create_game(
        &self,
        config: GameConfig,
        players: Vec<(String, Vec<Deck>)>,
    ) -> Result<GameId, EngineError> {
        let id = GameId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let names: Vec<String> = players.iter().map(|(name, _)| name.clone()).collect();

        let mut builder = GameBuilder::new(id, config).outbox(Arc::new(Outbox::new()));
        for (name, decks) in players {
            builder = builder.player(name, decks);
        }
        let game = builder.build()?;
        let handle = Arc::new(GameHandle::spawn(game)?);

        lock(&self.games).insert(id, handle);
        let mut seats = lock(&self.seats);
        for name in names {
            if let Some(previous) = seats.insert(name.clone(), id) {
                warn!(target: "ccg::server", %name, game = %previous, "seat.reassigned");
            }
        }
        info!(target: "ccg::server", game = %id, "game.hosted");
        Ok(id)
    }

    #[must_use]
    pub fn game(&self, id: GameId) -> Option<Arc<GameHandle>> {
        lock(&self.games).get(&id).cloned()
    }

    /// The game `name` is seated in.
    #[must_use]
    pub fn game_of(&self, name: &str) -> Option<GameId> {
        lock(&self.seats).get(name).copied()
    }

    #[must_use]
    pub fn game_count(&self) -> usize {
        lock(&self.games).len()
    }

    /// Open a session for a new connection.
    #[must_use]
    pub fn connect(&self, connection: Arc<dyn Connection>) -> Session {
        Session {
            user: None,
            connection,
        }
    }

    fn seated_game(&self, name: &str) -> Result<Arc<GameHandle>, ProtocolError> {
        let id = self.game_of(name).ok_or(ProtocolError::NotInGame)?;
        self.game(id).ok_or(ProtocolError::GameClosed)
    }

    fn route(&self, session: &mut Session, message: ClientMessage) -> Result<(), ProtocolError> {
        if let ClientMessage::Authenticate { name } = message {
            let game = self
                .seated_game(&name)
                .map_err(|_| ProtocolError::UnknownPlayer(name.clone()))?;
            if let Some(previous) = session.user.take() {
                if let Ok(old) = self.seated_game(&previous) {
                    old.detach(&previous, &session.connection);
                }
            }
            game.attach(&name, Arc::clone(&session.connection))?;
            info!(target: "ccg::server", user = %name, game = %game.id(), "session.authenticated");
            session.user = Some(name);
            return Ok(());
        }

        let name = session.user.as_deref().ok_or(ProtocolError::NotAuthenticated)?;
        self.seated_game(name)?.receive(name, message)
    }

    /// Handle one message. Failures are reported to the client, never
    /// propagated.
    pub fn handle_message(&self, session: &mut Session, message: ClientMessage) {
        if let Err(e) = self.route(session, message) {
            debug!(target: "ccg::server", user = ?session.user, error = %e, "message.rejected");
            session.connection.send(&ServerMessage::ProtocolError {
                reason: e.to_string(),
            });
        }
    }

    /// Decode and handle one frame.
    pub fn handle_frame<C: Codec>(&self, session: &mut Session, codec: &C, frame: &[u8]) {
        match codec.decode::<ClientMessage>(frame) {
            Ok(message) => self.handle_message(session, message),
            Err(e) => {
                debug!(target: "ccg::server", user = ?session.user, error = %e, "frame.rejected");
                session.connection.send(&ServerMessage::ProtocolError {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// The session's connection is gone.
    pub fn disconnect(&self, session: Session) {
        let Some(name) = session.user else {
            return;
        };
        if let Ok(game) = self.seated_game(&name) {
            game.detach(&name, &session.connection);
        }
        debug!(target: "ccg::server", user = %name, "session.closed");
    }

    /// Unhost a game and wait for its worker.
    ///
    /// The command channel is closed first, so a game nobody has won returns
    /// `EngineError::InboundClosed`.
    pub fn finish(&self, id: GameId) -> Option<Result<GameOutcome, EngineError>> {
        let handle = lock(&self.games).remove(&id)?;
        lock(&self.seats).retain(|_, game| *game != id);
        handle.close();
        let outcome = handle.join();
        info!(target: "ccg::server", game = %id, finished = outcome.is_ok(), "game.unhosted");
        Some(outcome)
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("games", &self.game_count())
            .finish()
    }
}
