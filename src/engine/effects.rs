//! Lingering ability effects.
//!
//! Abilities that last "until end of turn" or "while this card is in play"
//! record an entry here instead of keeping private state. Each entry says
//! when it expires and, optionally, which intent undoes it. The engine
//! performs that intent when the entry expires:
//!
//! - `Expiry::EndOfTurn(player)` entries expire while `player`'s `EndTurn`
//!   resolves.
//! - `Expiry::LeavesPlay` entries expire when the card that recorded them
//!   leaves play.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};
use crate::intents::IntentKind;

/// Name of an effect, unique within the card that records it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub &'static str);

/// Table key: which card, which effect, and optionally what it applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectKey {
    pub card: EntityId,
    pub effect: EffectId,
    pub subject: Option<EntityId>,
}

impl EffectKey {
    #[must_use]
    pub const fn new(card: EntityId, effect: EffectId) -> Self {
        Self {
            card,
            effect,
            subject: None,
        }
    }

    /// Narrow the key to one subject (builder pattern).
    #[must_use]
    pub const fn about(mut self, subject: EntityId) -> Self {
        self.subject = Some(subject);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    EndOfTurn(PlayerId),
    LeavesPlay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScratchEffect {
    pub expiry: Expiry,
    /// Free-form amount the ability wants to remember.
    pub amount: i32,
    /// Performed when the entry expires.
    pub revert: Option<IntentKind>,
}

impl ScratchEffect {
    #[must_use]
    pub fn until_end_of_turn(player: PlayerId) -> Self {
        Self {
            expiry: Expiry::EndOfTurn(player),
            amount: 0,
            revert: None,
        }
    }

    #[must_use]
    pub fn while_in_play() -> Self {
        Self {
            expiry: Expiry::LeavesPlay,
            amount: 0,
            revert: None,
        }
    }

    #[must_use]
    pub fn with_amount(mut self, amount: i32) -> Self {
        self.amount = amount;
        self
    }

    #[must_use]
    pub fn reverted_by(mut self, intent: IntentKind) -> Self {
        self.revert = Some(intent);
        self
    }
}

/// The engine-owned side table of lingering effects.
///
/// Ordered by key so expiry runs in a fixed order.
#[derive(Clone, Debug, Default)]
pub struct EffectTable {
    entries: BTreeMap<EffectKey, ScratchEffect>,
}

impl EffectTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an effect, replacing any entry under the same key.
    pub fn insert(&mut self, key: EffectKey, effect: ScratchEffect) -> Option<ScratchEffect> {
        self.entries.insert(key, effect)
    }

    #[must_use]
    pub fn get(&self, key: &EffectKey) -> Option<&ScratchEffect> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &EffectKey) -> Option<ScratchEffect> {
        self.entries.remove(key)
    }

    /// Remove and return everything expiring at the end of `player`'s turn.
    pub fn expire_end_of_turn(&mut self, player: PlayerId) -> Vec<(EffectKey, ScratchEffect)> {
        self.drain_where(|_, effect| effect.expiry == Expiry::EndOfTurn(player))
    }

    /// Remove and return `card`'s while-in-play entries.
    pub fn expire_card(&mut self, card: EntityId) -> Vec<(EffectKey, ScratchEffect)> {
        self.drain_where(|key, effect| key.card == card && effect.expiry == Expiry::LeavesPlay)
    }

    fn drain_where(
        &mut self,
        mut pred: impl FnMut(&EffectKey, &ScratchEffect) -> bool,
    ) -> Vec<(EffectKey, ScratchEffect)> {
        let keys: Vec<EffectKey> = self
            .entries
            .iter()
            .filter(|(k, e)| pred(k, e))
            .map(|(k, _)| *k)
            .collect();
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|e| (k, e)))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOST: EffectId = EffectId("boost");

    fn key(card: u32, subject: Option<u32>) -> EffectKey {
        EffectKey {
            card: EntityId(card),
            effect: BOOST,
            subject: subject.map(EntityId),
        }
    }

    #[test]
    fn test_end_of_turn_expiry_is_per_player() {
        let mut table = EffectTable::new();
        table.insert(key(1, Some(5)), ScratchEffect::until_end_of_turn(PlayerId::new(0)));
        table.insert(key(1, Some(6)), ScratchEffect::until_end_of_turn(PlayerId::new(0)));
        table.insert(key(2, None), ScratchEffect::until_end_of_turn(PlayerId::new(1)));

        let expired = table.expire_end_of_turn(PlayerId::new(0));
        assert_eq!(expired.len(), 2);
        assert_eq!(expired[0].0.subject, Some(EntityId(5)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_card_expiry_keeps_timed_effects() {
        let mut table = EffectTable::new();
        let revert = IntentKind::ModifyMinionPower {
            minion: EntityId(9),
            off: -2,
        };
        table.insert(key(1, None), ScratchEffect::while_in_play().reverted_by(revert));
        table.insert(key(1, Some(3)), ScratchEffect::until_end_of_turn(PlayerId::new(0)));

        let expired = table.expire_card(EntityId(1));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].1.revert, Some(revert));
        assert!(table.get(&key(1, Some(3))).is_some());
    }
}
