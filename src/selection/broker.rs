//! Selection broker.
//!
//! The game worker asks players questions through the broker and blocks
//! until they answer. Replies arrive on connection threads through
//! `deliver_reply`, which matches them to the waiting batch by request id.
//!
//! One `Mutex` guards the request table and one `Condvar` wakes the worker
//! whenever a reply lands or a batch is abandoned. Outbound prompts are
//! sent after the lock is released.

use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::option::{RequestId, SelectionOption, SelectionRequest};
use crate::core::{PlayerId, ProtocolError, SelectionError};
use crate::protocol::{IndexedOption, Outbox, ServerMessage};

struct PendingRequest {
    player: PlayerId,
    options: Vec<SelectionOption>,
}

#[derive(Default)]
struct RequestTable {
    next_id: u64,
    in_flight: bool,
    /// Unanswered requests of the current batch. Option lists live here
    /// until answered.
    pending: FxHashMap<RequestId, PendingRequest>,
    /// Chosen options for answered requests of the current batch.
    answers: FxHashMap<RequestId, SelectionOption>,
    abandoned: Option<PlayerId>,
}

impl RequestTable {
    fn clear_batch(&mut self) {
        self.pending.clear();
        self.answers.clear();
        self.abandoned = None;
        self.in_flight = false;
    }
}

/// Matches player replies to the worker's outstanding questions.
pub struct SelectionBroker {
    outbox: Arc<Outbox>,
    timeout: Option<Duration>,
    table: Mutex<RequestTable>,
    answered: Condvar,
}

impl SelectionBroker {
    /// `timeout` bounds how long a batch may wait; `None` waits until every
    /// reply arrives or an asker is abandoned.
    #[must_use]
    pub fn new(outbox: Arc<Outbox>, timeout: Option<Duration>) -> Self {
        Self {
            outbox,
            timeout,
            table: Mutex::new(RequestTable::default()),
            answered: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RequestTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask one player one question and wait for the answer.
    pub fn request_one(
        &self,
        player: PlayerId,
        prompt: impl Into<String>,
        options: Vec<SelectionOption>,
    ) -> Result<SelectionOption, SelectionError> {
        let mut batch = BTreeMap::new();
        batch.insert((), SelectionRequest::new(player, prompt, options));
        self.request_many(batch)?
            .remove(&())
            .ok_or(SelectionError::MissingAnswer)
    }

    /// Send every request, then wait until all of them are answered.
    ///
    /// Answers come back under the same keys as the requests, whatever order
    /// the replies arrive in.
    pub fn request_many<K: Ord>(
        &self,
        requests: BTreeMap<K, SelectionRequest>,
    ) -> Result<BTreeMap<K, SelectionOption>, SelectionError> {
        if requests.is_empty() {
            return Ok(BTreeMap::new());
        }
        if requests.values().any(|r| r.options.is_empty()) {
            return Err(SelectionError::NoOptions);
        }
        let mut keyed = Vec::with_capacity(requests.len());
        let mut outgoing = Vec::with_capacity(requests.len());
        {
            let mut table = self.lock();
            if table.in_flight {
                return Err(SelectionError::BatchInFlight);
            }
            // Checked under the table lock: a disconnect landing after this
            // point finds the batch pending and abandons it.
            if let Some(absent) = requests
                .values()
                .map(|r| r.player)
                .find(|p| !self.outbox.has_connections(*p))
            {
                debug!(target: "ccg::selection", player = %absent, "batch.unconnected");
                return Err(SelectionError::Abandoned { player: absent });
            }
            table.in_flight = true;
            table.abandoned = None;

            for (key, request) in requests {
                let id = RequestId(table.next_id);
                table.next_id += 1;

                let options = request
                    .options
                    .iter()
                    .cloned()
                    .enumerate()
                    .map(|(id, option)| IndexedOption { id, option })
                    .collect();
                outgoing.push((
                    request.player,
                    ServerMessage::RequestSelection {
                        request_id: id.0,
                        prompt: request.prompt,
                        options,
                    },
                ));
                table.pending.insert(
                    id,
                    PendingRequest {
                        player: request.player,
                        options: request.options,
                    },
                );
                keyed.push((key, id));
            }
        }

        debug!(target: "ccg::selection", requests = keyed.len(), "batch.sent");
        for (player, message) in &outgoing {
            self.outbox.send(*player, message);
        }

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut table = self.lock();
        while table.answers.len() < keyed.len() {
            if let Some(player) = table.abandoned {
                table.clear_batch();
                warn!(target: "ccg::selection", %player, "batch.abandoned");
                return Err(SelectionError::Abandoned { player });
            }
            table = match deadline {
                None => self
                    .answered
                    .wait(table)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        table.clear_batch();
                        warn!(target: "ccg::selection", "batch.timed_out");
                        return Err(SelectionError::TimedOut);
                    }
                    self.answered
                        .wait_timeout(table, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }

        let mut answers = BTreeMap::new();
        let mut missing = false;
        for (key, id) in keyed {
            match table.answers.remove(&id) {
                Some(option) => {
                    answers.insert(key, option);
                }
                None => missing = true,
            }
        }
        table.clear_batch();
        if missing {
            return Err(SelectionError::MissingAnswer);
        }
        debug!(target: "ccg::selection", "batch.answered");
        Ok(answers)
    }

    /// Record a player's reply. Safe to call from any thread.
    ///
    /// Unknown or already answered ids, replies from someone other than the
    /// asked player, and out of range indexes are rejected and leave the
    /// table untouched.
    pub fn deliver_reply(
        &self,
        player: PlayerId,
        request: RequestId,
        index: usize,
    ) -> Result<(), ProtocolError> {
        let mut table = self.lock();
        let pending = table
            .pending
            .get(&request)
            .ok_or(ProtocolError::UnknownRequest(request.0))?;
        if pending.player != player {
            return Err(ProtocolError::WrongResponder(request.0));
        }
        if index >= pending.options.len() {
            return Err(ProtocolError::OptionOutOfRange {
                request: request.0,
                index,
            });
        }

        if let Some(pending) = table.pending.remove(&request) {
            if let Some(chosen) = pending.options.into_iter().nth(index) {
                table.answers.insert(request, chosen);
            }
        }
        drop(table);

        debug!(target: "ccg::selection", %player, %request, index, "reply.accepted");
        self.answered.notify_all();
        Ok(())
    }

    /// Give up on the current batch if `player` still owes it an answer.
    pub fn abandon(&self, player: PlayerId) {
        let mut table = self.lock();
        if table.pending.values().any(|p| p.player == player) {
            table.abandoned = Some(player);
            drop(table);
            self.answered.notify_all();
        }
    }

    /// Number of requests still waiting for a reply.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.lock().pending.len()
    }
}

impl std::fmt::Debug for SelectionBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionBroker")
            .field("timeout", &self.timeout)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::protocol::ChannelConnection;

    fn broker_with(players: u8, timeout: Option<Duration>) -> (Arc<SelectionBroker>, Vec<crossbeam_channel::Receiver<ServerMessage>>) {
        let outbox = Arc::new(Outbox::new());
        let mut inboxes = Vec::new();
        for p in 0..players {
            let (conn, rx) = ChannelConnection::pair();
            outbox.add(PlayerId::new(p), Arc::new(conn));
            inboxes.push(rx);
        }
        (Arc::new(SelectionBroker::new(outbox, timeout)), inboxes)
    }

    fn cards(ids: &[u32]) -> Vec<SelectionOption> {
        ids.iter().map(|id| SelectionOption::Card { card: EntityId(*id) }).collect()
    }

    #[test]
    fn test_request_one_round_trip() {
        let (broker, inboxes) = broker_with(1, None);
        let asker = Arc::clone(&broker);
        let worker = std::thread::spawn(move || asker.request_one(PlayerId::new(0), "Pick", cards(&[5, 6])));

        let ServerMessage::RequestSelection { request_id, options, .. } = inboxes[0].recv().unwrap() else {
            panic!("expected a selection request");
        };
        assert_eq!(options.len(), 2);
        broker.deliver_reply(PlayerId::new(0), RequestId(request_id), 1).unwrap();

        let chosen = worker.join().unwrap().unwrap();
        assert_eq!(chosen.card(), Some(EntityId(6)));
        assert_eq!(broker.outstanding(), 0);
    }

    #[test]
    fn test_rejects_unknown_request() {
        let (broker, _inboxes) = broker_with(1, None);
        assert_eq!(
            broker.deliver_reply(PlayerId::new(0), RequestId(99), 0),
            Err(ProtocolError::UnknownRequest(99))
        );
    }

    #[test]
    fn test_empty_options_rejected() {
        let (broker, _inboxes) = broker_with(1, None);
        assert_eq!(
            broker.request_one(PlayerId::new(0), "Pick", vec![]),
            Err(SelectionError::NoOptions)
        );
    }

    #[test]
    fn test_unconnected_player_fails_fast() {
        let (broker, _inboxes) = broker_with(1, None);
        assert_eq!(
            broker.request_one(PlayerId::new(3), "Pick", cards(&[1])),
            Err(SelectionError::Abandoned {
                player: PlayerId::new(3)
            })
        );
    }

    #[test]
    fn test_disconnect_racing_a_request_never_hangs() {
        for _ in 0..200 {
            let outbox = Arc::new(Outbox::new());
            let (conn, _rx) = ChannelConnection::pair();
            let conn: Arc<dyn crate::protocol::Connection> = Arc::new(conn);
            outbox.add(PlayerId::new(0), Arc::clone(&conn));
            let broker = Arc::new(SelectionBroker::new(Arc::clone(&outbox), None));

            let (done_tx, done_rx) = crossbeam_channel::bounded(1);
            let asker = Arc::clone(&broker);
            std::thread::spawn(move || {
                let _ = done_tx.send(asker.request_one(PlayerId::new(0), "Pick", cards(&[1])));
            });

            outbox.remove(PlayerId::new(0), &conn);
            broker.abandon(PlayerId::new(0));

            let result = done_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("request hung after its player left");
            assert_eq!(
                result,
                Err(SelectionError::Abandoned {
                    player: PlayerId::new(0)
                })
            );
            assert_eq!(broker.outstanding(), 0);
        }
    }

    #[test]
    fn test_timeout_clears_batch() {
        let (broker, _inboxes) = broker_with(1, Some(Duration::from_millis(20)));
        assert_eq!(
            broker.request_one(PlayerId::new(0), "Pick", cards(&[1])),
            Err(SelectionError::TimedOut)
        );
        assert_eq!(broker.outstanding(), 0);
    }
}
