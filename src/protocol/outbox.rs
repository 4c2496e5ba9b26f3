//! Outbound fan-out.
//!
//! The transport implements `Connection` for whatever socket it owns. A
//! player may have several connections open at once; `Outbox` sends each
//! message to all of them. Sending is fire-and-forget.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use rustc_hash::FxHashMap;
use tracing::trace;

use super::messages::ServerMessage;
use crate::core::PlayerId;

/// One open link to a client.
pub trait Connection: Send + Sync {
    fn send(&self, message: &ServerMessage);
}

/// In-process connection backed by a channel. Used by tests, bots and any
/// transport that prefers to drain a queue on its own thread.
#[derive(Clone, Debug)]
pub struct ChannelConnection {
    tx: Sender<ServerMessage>,
}

impl ChannelConnection {
    #[must_use]
    pub fn new(tx: Sender<ServerMessage>) -> Self {
        Self { tx }
    }

    /// A connection and the receiving end of its queue.
    #[must_use]
    pub fn pair() -> (Self, Receiver<ServerMessage>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }
}

impl Connection for ChannelConnection {
    fn send(&self, message: &ServerMessage) {
        if self.tx.send(message.clone()).is_err() {
            trace!(target: "ccg::server", "connection.closed");
        }
    }
}

/// Per-player connection lists.
#[derive(Default)]
pub struct Outbox {
    connections: Mutex<FxHashMap<PlayerId, Vec<Arc<dyn Connection>>>>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<PlayerId, Vec<Arc<dyn Connection>>>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, player: PlayerId, connection: Arc<dyn Connection>) {
        self.lock().entry(player).or_default().push(connection);
    }

    /// Drop one connection, matched by identity. Returns whether it was found.
    pub fn remove(&self, player: PlayerId, connection: &Arc<dyn Connection>) -> bool {
        let mut connections = self.lock();
        let Some(list) = connections.get_mut(&player) else {
            return false;
        };
        let before = list.len();
        list.retain(|c| !Arc::ptr_eq(c, connection));
        let removed = list.len() != before;
        if list.is_empty() {
            connections.remove(&player);
        }
        removed
    }

    #[must_use]
    pub fn has_connections(&self, player: PlayerId) -> bool {
        self.lock().get(&player).is_some_and(|l| !l.is_empty())
    }

    /// Send to every connection of one player.
    pub fn send(&self, player: PlayerId, message: &ServerMessage) {
        let targets = self.lock().get(&player).cloned().unwrap_or_default();
        for connection in targets {
            connection.send(message);
        }
    }

    /// Send to every connection of every player.
    pub fn broadcast(&self, message: &ServerMessage) {
        let targets: Vec<_> = self.lock().values().flatten().cloned().collect();
        for connection in targets {
            connection.send(message);
        }
    }
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox")
            .field("players", &self.lock().len())
            .finish()
    }
}
