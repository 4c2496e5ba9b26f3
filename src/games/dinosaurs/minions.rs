use std::sync::Arc;

use super::controller;
use crate::cards::CardDefinition;
use crate::core::{EngineError, EntityId};
use crate::engine::{AbilityContext, GameState};
use crate::intents::{AbilityHandler, Callback, Callbacks, Intent, IntentKind, IntentType, Tier};

const WAR_RAPTOR: &str = "War Raptor";

#[must_use]
pub fn laseratops() -> CardDefinition {
    CardDefinition::minion("Laseratops", 4)
        .with_text("Destroy a minion of power 2 or less on this base.")
        .with_ability(|id| Arc::new(Laseratops { minion: id }))
}

#[must_use]
pub fn war_raptor() -> CardDefinition {
    CardDefinition::minion(WAR_RAPTOR, 2)
        .with_text("Ongoing: Gains +1 power for each War Raptor on this base (including this one).")
        .with_ability(|id| Arc::new(WarRaptor { minion: id }))
}

#[must_use]
pub fn armor_stego() -> CardDefinition {
    CardDefinition::minion("Armor Stego", 3)
        .with_text("Ongoing: Has +2 power during other players' turns.")
        .with_ability(|id| Arc::new(ArmorStego { minion: id }))
}

#[must_use]
pub fn king_rex() -> CardDefinition {
    CardDefinition::minion("King Rex", 7)
}

fn resolving_self(intent: &Intent, minion: EntityId) -> bool {
    matches!(*intent.kind(), IntentKind::ResolveMinionAbility { minion: m } if m == minion)
}

struct Laseratops {
    minion: EntityId,
}

impl AbilityHandler for Laseratops {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::ResolveMinionAbility]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        if resolving_self(intent, self.minion) && state.is_minion_in_play(self.minion) {
            Callbacks::at(Tier::Resolve)
        } else {
            Callbacks::none()
        }
    }

    fn invoke(
        &self,
        _callback: Callback,
        _intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        let state = ctx.state();
        let (Some(base), Some(player)) = (state.base_of(self.minion), controller(state, self.minion))
        else {
            return Ok(());
        };
        let targets: Vec<EntityId> = state
            .minions_on(base)
            .iter()
            .copied()
            .filter(|m| state.minion_power(*m).is_some_and(|p| p <= 2))
            .collect();

        if let Some(target) =
            ctx.choose_card(player, "Destroy a minion of power 2 or less", &targets)?
        {
            ctx.perform(IntentKind::DestroyMinion { minion: target })?;
        }
        Ok(())
    }
}

/// Each raptor counts every raptor on its base. On arrival it takes +1 per
/// raptor there (itself included) and gives the others +1; on leaving it
/// takes the +1 back from the others.
struct WarRaptor {
    minion: EntityId,
}

impl WarRaptor {
    fn raptors_on(state: &GameState, base: EntityId) -> Vec<EntityId> {
        state
            .minions_on(base)
            .iter()
            .copied()
            .filter(|m| state.card(*m).is_some_and(|c| c.name() == WAR_RAPTOR))
            .collect()
    }
}

impl AbilityHandler for WarRaptor {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::ResolveMinionAbility, IntentType::RemoveMinionFromPlay]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        if !state.is_minion_in_play(self.minion) {
            return Callbacks::none();
        }
        if resolving_self(intent, self.minion) {
            Callbacks::at(Tier::Resolve)
        } else if intent.is(IntentType::RemoveMinionFromPlay)
            && intent.kind().minion() == Some(self.minion)
        {
            Callbacks::at(Tier::PreResolve)
        } else {
            Callbacks::none()
        }
    }

    fn invoke(
        &self,
        callback: Callback,
        _intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        let Some(base) = ctx.state().base_of(self.minion) else {
            return Ok(());
        };
        let others: Vec<EntityId> = Self::raptors_on(ctx.state(), base)
            .into_iter()
            .filter(|m| *m != self.minion)
            .collect();

        let off = if callback.tier == Tier::Resolve {
            let own = i32::try_from(others.len() + 1).unwrap_or(i32::MAX);
            ctx.perform(IntentKind::ModifyMinionPower {
                minion: self.minion,
                off: own,
            })?;
            1
        } else {
            -1
        };
        for other in others {
            ctx.perform(IntentKind::ModifyMinionPower { minion: other, off })?;
        }
        Ok(())
    }
}

/// Tracks whose turn it is: +2 when its controller's turn ends, -2 when it
/// begins again.
struct ArmorStego {
    minion: EntityId,
}

impl AbilityHandler for ArmorStego {
    fn interests(&self) -> &[IntentType] {
        &[
            IntentType::StartTurn,
            IntentType::EndTurn,
            IntentType::ChangeCardController,
        ]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        let Some(owner) = controller(state, self.minion) else {
            return Callbacks::none();
        };
        let relevant = match *intent.kind() {
            IntentKind::StartTurn { player } | IntentKind::EndTurn { player } => player == owner,
            IntentKind::ChangeCardController { card, .. } => card == self.minion,
            _ => false,
        };
        if relevant && state.is_minion_in_play(self.minion) {
            Callbacks::at(Tier::PreResolve)
        } else {
            Callbacks::none()
        }
    }

    fn invoke(
        &self,
        _callback: Callback,
        intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        let active = ctx.state().active_player();
        let Some(owner) = controller(ctx.state(), self.minion) else {
            return Ok(());
        };
        let off = match *intent.kind() {
            IntentKind::StartTurn { .. } => -2,
            IntentKind::EndTurn { .. } => 2,
            IntentKind::ChangeCardController { new_controller, .. } => {
                let was_active = active == Some(owner);
                let now_active = active == Some(new_controller);
                match (was_active, now_active) {
                    (true, false) => 2,
                    (false, true) => -2,
                    _ => 0,
                }
            }
            _ => 0,
        };
        if off != 0 {
            ctx.perform(IntentKind::ModifyMinionPower {
                minion: self.minion,
                off,
            })?;
        }
        Ok(())
    }
}
