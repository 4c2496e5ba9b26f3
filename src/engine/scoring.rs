//! Base scoring.

use tracing::info;

use super::game::Game;
use super::state::GameState;
use crate::core::{EntityId, PlayerId};

/// One player's result on a scored base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Standing {
    pub player: PlayerId,
    pub power: i32,
    /// 0 for first. Tied players share the better place.
    pub place: usize,
}

/// Rank the players with power on `base`, strongest first.
///
/// Players with no minions there (or only zero-power ones) are left out.
#[must_use]
pub fn standings(state: &GameState, base: EntityId) -> Vec<Standing> {
    let mut totals: Vec<(PlayerId, i32)> = Vec::new();
    for minion in state.minions_on(base) {
        let (Some(controller), Some(power)) =
            (state.controller_of(*minion), state.minion_power(*minion))
        else {
            continue;
        };
        match totals.iter_mut().find(|(p, _)| *p == controller) {
            Some((_, total)) => *total += power,
            None => totals.push((controller, power)),
        }
    }
    totals.retain(|(_, power)| *power > 0);

    let mut standings: Vec<Standing> = totals
        .iter()
        .map(|&(player, power)| Standing {
            player,
            power,
            place: totals.iter().filter(|(_, other)| *other > power).count(),
        })
        .collect();
    standings.sort_by_key(|s| (s.place, s.player));
    standings
}

impl Game {
    /// Award a base's points by standing. Only the first three places score.
    pub(crate) fn award_base(&mut self, base: EntityId) {
        let Some(points) = self.state.base(base).map(|b| b.award_points()) else {
            return;
        };
        for standing in standings(&self.state, base) {
            let Some(award) = points.get(standing.place).copied() else {
                continue;
            };
            if let Some(seat) = self.state.players.get_mut(standing.player) {
                seat.points += award;
                info!(
                    target: "ccg::engine",
                    %base,
                    player = %standing.player,
                    place = standing.place + 1,
                    power = standing.power,
                    award,
                    total = seat.points,
                    "base.scored"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cards::{BaseState, CardDefinition, CardState};

    fn place(state: &mut GameState, base: EntityId, owner: u8, power: i32) -> EntityId {
        let id = state
            .cards
            .add_card(PlayerId::new(owner), Arc::new(CardDefinition::minion("Grunt", power)));
        state.cards.card_mut(id).unwrap().state = CardState::MinionOnBase {
            controller: PlayerId::new(owner),
            base,
            raw_power: power,
            actions: vec![],
        };
        if let BaseState::InPlay { minions, .. } = &mut state.cards.base_mut(base).unwrap().state {
            minions.push(id);
        }
        id
    }

    fn arena(players: &[&str]) -> (GameState, EntityId) {
        let mut state = GameState::new(players.iter().copied());
        let base = state
            .cards
            .add_base(Arc::new(CardDefinition::base("Arena", 10, [5, 3, 1])));
        state.cards.base_mut(base).unwrap().state = BaseState::InPlay {
            power_threshold: 10,
            minions: vec![],
            actions: vec![],
        };
        state.bases.push(base);
        (state, base)
    }

    #[test]
    fn test_standings_sum_per_controller() {
        let (mut state, base) = arena(&["ann", "ben", "cat"]);
        place(&mut state, base, 0, 3);
        place(&mut state, base, 1, 5);
        place(&mut state, base, 0, 4);

        let ranks = standings(&state, base);
        assert_eq!(ranks.len(), 2);
        assert_eq!((ranks[0].player, ranks[0].power, ranks[0].place), (PlayerId::new(0), 7, 0));
        assert_eq!((ranks[1].player, ranks[1].power, ranks[1].place), (PlayerId::new(1), 5, 1));
    }

    #[test]
    fn test_ties_share_better_place() {
        let (mut state, base) = arena(&["ann", "ben", "cat"]);
        place(&mut state, base, 0, 4);
        place(&mut state, base, 1, 4);
        place(&mut state, base, 2, 2);

        let places: Vec<usize> = standings(&state, base).iter().map(|s| s.place).collect();
        assert_eq!(places, vec![0, 0, 2]);
    }

    #[test]
    fn test_zero_power_scores_nothing() {
        let (mut state, base) = arena(&["ann", "ben"]);
        place(&mut state, base, 0, 0);
        place(&mut state, base, 1, 1);

        let ranks = standings(&state, base);
        assert_eq!(ranks.len(), 1);
        assert_eq!(ranks[0].player, PlayerId::new(1));
    }
}
