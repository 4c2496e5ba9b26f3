//! Client-facing views of the game.
//!
//! Each player gets their own `GameStateView`: public board state plus their
//! own hand. Nobody else's hand or deck order is ever sent.

use tracing::trace;

use super::game::Game;
use crate::cards::{CardDefinition, CardKind};
use crate::core::{EntityId, PlayerId};
use crate::protocol::{
    BaseView, CardCategory, CardInfo, GameStateView, OccupantView, PlayerView, ServerMessage,
    TurnView,
};

fn card_info(id: EntityId, definition: &CardDefinition, owner: Option<String>) -> CardInfo {
    let (kind, power, power_threshold, award_points) = match definition.kind {
        CardKind::Minion { power } => (CardCategory::Minion, Some(power), None, None),
        CardKind::Action { .. } => (CardCategory::Action, None, None, None),
        CardKind::Base {
            power_threshold,
            award_points,
        } => (
            CardCategory::Base,
            None,
            Some(power_threshold),
            Some(award_points),
        ),
    };
    CardInfo {
        id,
        name: definition.name.clone(),
        text: definition.text.clone(),
        kind,
        owner,
        power,
        power_threshold,
        award_points,
    }
}

impl Game {
    /// Static data for every card and base in the game, in id order.
    #[must_use]
    pub fn card_roster(&self) -> Vec<CardInfo> {
        let store = &self.state.cards;
        store
            .roster()
            .filter_map(|id| {
                if let Some(card) = store.card(id) {
                    let owner = self.state.player(card.owner).map(|p| p.name.clone());
                    Some(card_info(id, &card.definition, owner))
                } else {
                    store.base(id).map(|b| card_info(id, &b.definition, None))
                }
            })
            .collect()
    }

    fn occupant(&self, card: EntityId) -> OccupantView {
        let state = self.state.card(card).map(|c| &c.state);
        OccupantView {
            id: card,
            power: state.and_then(|s| s.effective_power()),
            actions: state
                .map(|s| s.attached_actions())
                .unwrap_or(&[])
                .iter()
                .map(|a| self.occupant(*a))
                .collect(),
        }
    }

    /// The snapshot `player` is allowed to see.
    #[must_use]
    pub fn state_view(&self, player: PlayerId) -> GameStateView {
        let bases = self
            .state
            .bases
            .iter()
            .filter_map(|id| {
                let base = self.state.base(*id)?;
                let cards = base
                    .state
                    .minions()
                    .iter()
                    .chain(base.state.actions())
                    .map(|c| self.occupant(*c))
                    .collect();
                Some(BaseView {
                    id: *id,
                    power_total: self.state.base_power(*id),
                    power_threshold: base.state.power_threshold().unwrap_or_default(),
                    cards,
                })
            })
            .collect();

        let players = self
            .state
            .players
            .values()
            .map(|p| PlayerView {
                name: p.name.clone(),
                points: p.points,
                hand_size: p.hand.len(),
                deck_size: p.deck.len(),
                discard: p.discard.iter().collect(),
            })
            .collect();

        let turn = self.state.turn.and_then(|t| {
            self.state.player(t.player).map(|p| TurnView {
                player: p.name.clone(),
                minions: t.minions_left,
                actions: t.actions_left,
            })
        });

        GameStateView {
            game_id: self.id,
            bases,
            players,
            turn,
            hand: self
                .state
                .player(player)
                .map(|p| p.hand.clone())
                .unwrap_or_default(),
        }
    }

    /// Send every player their current view.
    pub fn broadcast_state(&self) {
        for player in self.state.players.player_ids() {
            if self.outbox.has_connections(player) {
                self.outbox
                    .send(player, &ServerMessage::SetGameState(self.state_view(player)));
            }
        }
        trace!(target: "ccg::engine", game = %self.id, "state.broadcast");
    }

    /// Send the card roster to every connected player.
    pub fn send_cards(&self) {
        self.outbox.broadcast(&ServerMessage::SetCards {
            cards: self.card_roster(),
        });
    }

    /// Send the roster and current view to one (re)joining player.
    pub fn send_cards_to(&self, player: PlayerId) {
        self.outbox.send(
            player,
            &ServerMessage::SetCards {
                cards: self.card_roster(),
            },
        );
        self.outbox
            .send(player, &ServerMessage::SetGameState(self.state_view(player)));
    }
}
