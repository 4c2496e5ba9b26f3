use std::collections::BTreeSet;
use std::sync::Arc;

use super::controller;
use crate::cards::{ActionTarget, CardDefinition, CardState};
use crate::core::{EngineError, EntityId, PlayerId};
use crate::engine::{AbilityContext, EffectId, EffectKey, GameState, ScratchEffect};
use crate::intents::{AbilityHandler, Callback, Callbacks, Intent, IntentKind, IntentType, Tier};

const UPGRADE: EffectId = EffectId("upgrade");
const HOWL: EffectId = EffectId("howl");
const AUGMENTATION: EffectId = EffectId("augmentation");
const RAMPAGE: EffectId = EffectId("rampage");

#[must_use]
pub fn wildlife_preserve() -> CardDefinition {
    CardDefinition::action("Wildlife Preserve", ActionTarget::Base)
        .with_text("Play on a base. Ongoing: Your minions here are not affected by other players' actions.")
        .with_ability(|id| Arc::new(WildlifePreserve { action: id }))
}

#[must_use]
pub fn tooth_and_claw() -> CardDefinition {
    CardDefinition::action("Tooth and Claw... and Guns", ActionTarget::Minion)
        .with_text(
            "Play on a minion. Ongoing: If an ability would affect this minion, destroy this card \
             and the ability does not affect this minion.",
        )
        .with_ability(|id| Arc::new(ToothAndClaw { action: id }))
}

#[must_use]
pub fn upgrade() -> CardDefinition {
    CardDefinition::action("Upgrade", ActionTarget::OwnMinion)
        .with_text("Play on one of your minions. Ongoing: This minion has +2 power.")
        .with_ability(|id| Arc::new(Upgrade { action: id }))
}

#[must_use]
pub fn howl() -> CardDefinition {
    CardDefinition::action("Howl", ActionTarget::None)
        .with_text("Each of your minions gains +1 power until the end of your turn.")
        .with_ability(|id| Arc::new(Howl { action: id }))
}

#[must_use]
pub fn augmentation() -> CardDefinition {
    CardDefinition::action("Augmentation", ActionTarget::None)
        .with_text("One minion gains +4 power until the end of your turn.")
        .with_ability(|id| Arc::new(Augmentation { action: id }))
}

#[must_use]
pub fn rampage() -> CardDefinition {
    CardDefinition::action("Rampage", ActionTarget::None)
        .with_text(
            "Reduce the breakpoint of a base by the power of one of your minions on that base \
             until the end of the turn.",
        )
        .with_ability(|id| Arc::new(Rampage { action: id }))
}

#[must_use]
pub fn natural_selection() -> CardDefinition {
    CardDefinition::action("Natural Selection", ActionTarget::None)
        .with_text("Choose one of your minions on a base. Destroy a minion there with less power than yours.")
        .with_ability(|id| Arc::new(NaturalSelection { action: id }))
}

#[must_use]
pub fn survival_of_the_fittest() -> CardDefinition {
    CardDefinition::action("Survival of the Fittest", ActionTarget::None)
        .with_text(
            "Destroy the lowest-power minion (you choose in case of a tie) on each base with a \
             higher-power minion.",
        )
        .with_ability(|id| Arc::new(SurvivalOfTheFittest { action: id }))
}

/// Resolve-tier callback when `action`'s own ability resolves.
fn on_own_resolve(intent: &Intent, state: &GameState, action: EntityId) -> Callbacks {
    let own = matches!(*intent.kind(), IntentKind::ResolveActionAbility { action: a } if a == action);
    if own && state.is_in_play(action) {
        Callbacks::at(Tier::Resolve)
    } else {
        Callbacks::none()
    }
}

/// Shared shape of the one-shot actions: act once while their own ability
/// resolves, as the card's controller.
macro_rules! one_shot {
    ($name:ident) => {
        impl AbilityHandler for $name {
            fn interests(&self) -> &[IntentType] {
                &[IntentType::ResolveActionAbility]
            }

            fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
                on_own_resolve(intent, state, self.action)
            }

            fn invoke(
                &self,
                _callback: Callback,
                _intent: &mut Intent,
                ctx: &mut AbilityContext<'_>,
            ) -> Result<(), EngineError> {
                match controller(ctx.state(), self.action) {
                    Some(player) => self.resolve(player, ctx),
                    None => Ok(()),
                }
            }
        }
    };
}

struct WildlifePreserve {
    action: EntityId,
}

impl AbilityHandler for WildlifePreserve {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::AffectMinion]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        let Some(CardState::OnBase { controller, base }) = state.card(self.action).map(|c| &c.state)
        else {
            return Callbacks::none();
        };
        let Some(minion) = intent.kind().minion() else {
            return Callbacks::none();
        };
        let sheltered =
            state.controller_of(minion) == Some(*controller) && state.base_of(minion) == Some(*base);
        if sheltered {
            Callbacks::at(Tier::Cancel)
        } else {
            Callbacks::none()
        }
    }

    fn invoke(
        &self,
        _callback: Callback,
        intent: &mut Intent,
        _ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        intent.cancel();
        Ok(())
    }
}

struct ToothAndClaw {
    action: EntityId,
}

impl AbilityHandler for ToothAndClaw {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::AffectMinion]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        let guarded = match state.card(self.action).map(|c| &c.state) {
            Some(CardState::OnMinion { minion, .. }) => *minion,
            _ => return Callbacks::none(),
        };
        if intent.kind().minion() == Some(guarded) {
            Callbacks::at(Tier::CancelAndModify)
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
        intent.cancel();
        ctx.perform(IntentKind::DestroyAction {
            action: self.action,
        })?;
        Ok(())
    }
}

/// +2 on the attached minion for as long as this card stays in play.
struct Upgrade {
    action: EntityId,
}

impl AbilityHandler for Upgrade {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::ResolveActionAbility]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        on_own_resolve(intent, state, self.action)
    }

    fn invoke(
        &self,
        _callback: Callback,
        _intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        let Some(CardState::OnMinion { minion, .. }) =
            ctx.state().card(self.action).map(|c| c.state.clone())
        else {
            return Ok(());
        };
        ctx.perform(IntentKind::ModifyMinionPower { minion, off: 2 })?;
        ctx.remember(
            EffectKey::new(self.action, UPGRADE).about(minion),
            ScratchEffect::while_in_play()
                .with_amount(2)
                .reverted_by(IntentKind::ModifyMinionPower { minion, off: -2 }),
        );
        Ok(())
    }
}

struct Howl {
    action: EntityId,
}

impl Howl {
    fn resolve(&self, player: PlayerId, ctx: &mut AbilityContext<'_>) -> Result<(), EngineError> {
        for minion in ctx.state().minions_controlled_by(player) {
            ctx.perform(IntentKind::ModifyMinionPower { minion, off: 1 })?;
            ctx.remember(
                EffectKey::new(self.action, HOWL).about(minion),
                ScratchEffect::until_end_of_turn(player)
                    .with_amount(1)
                    .reverted_by(IntentKind::ModifyMinionPower { minion, off: -1 }),
            );
        }
        Ok(())
    }
}

one_shot!(Howl);

struct Augmentation {
    action: EntityId,
}

impl Augmentation {
    fn resolve(&self, player: PlayerId, ctx: &mut AbilityContext<'_>) -> Result<(), EngineError> {
        let targets = ctx.state().minions_in_play();
        let Some(minion) = ctx.choose_card(player, "Give a minion +4 power", &targets)? else {
            return Ok(());
        };
        ctx.perform(IntentKind::ModifyMinionPower { minion, off: 4 })?;
        ctx.remember(
            EffectKey::new(self.action, AUGMENTATION).about(minion),
            ScratchEffect::until_end_of_turn(player)
                .with_amount(4)
                .reverted_by(IntentKind::ModifyMinionPower { minion, off: -4 }),
        );
        Ok(())
    }
}

one_shot!(Augmentation);

/// Can't be played without a minion in play; lowers a base's threshold
/// until end of turn.
struct Rampage {
    action: EntityId,
}

impl AbilityHandler for Rampage {
    fn interests(&self) -> &[IntentType] {
        &[IntentType::PlayActionOnField, IntentType::ResolveActionAbility]
    }

    fn callbacks(&self, intent: &Intent, state: &GameState) -> Callbacks {
        match *intent.kind() {
            IntentKind::PlayActionOnField { action } if action == self.action => {
                Callbacks::at(Tier::Cancel)
            }
            _ => on_own_resolve(intent, state, self.action),
        }
    }

    fn invoke(
        &self,
        callback: Callback,
        intent: &mut Intent,
        ctx: &mut AbilityContext<'_>,
    ) -> Result<(), EngineError> {
        let Some(player) = controller(ctx.state(), self.action) else {
            return Ok(());
        };
        let own = ctx.state().minions_controlled_by(player);

        if callback.tier == Tier::Cancel {
            if own.is_empty() {
                intent.cancel();
            }
            return Ok(());
        }

        let Some(minion) = ctx.choose_card(player, "Choose a minion to rampage with", &own)? else {
            return Ok(());
        };
        let state = ctx.state();
        let (Some(base), Some(power)) = (state.base_of(minion), state.minion_power(minion)) else {
            return Ok(());
        };
        ctx.perform(IntentKind::ModifyBasePowerThreshold { base, off: -power })?;
        ctx.remember(
            EffectKey::new(self.action, RAMPAGE).about(base),
            ScratchEffect::until_end_of_turn(player)
                .with_amount(power)
                .reverted_by(IntentKind::ModifyBasePowerThreshold { base, off: power }),
        );
        Ok(())
    }
}

struct NaturalSelection {
    action: EntityId,
}

impl NaturalSelection {
    fn resolve(&self, player: PlayerId, ctx: &mut AbilityContext<'_>) -> Result<(), EngineError> {
        let own = ctx.state().minions_controlled_by(player);
        let Some(hunter) = ctx.choose_card(player, "Choose one of your minions", &own)? else {
            return Ok(());
        };
        let state = ctx.state();
        let (Some(base), Some(power)) = (state.base_of(hunter), state.minion_power(hunter)) else {
            return Ok(());
        };
        let prey: Vec<EntityId> = state
            .minions_on(base)
            .iter()
            .copied()
            .filter(|m| state.minion_power(*m).is_some_and(|p| p < power))
            .collect();
        if let Some(minion) = ctx.choose_card(player, "Destroy a weaker minion", &prey)? {
            ctx.perform(IntentKind::DestroyMinion { minion })?;
        }
        Ok(())
    }
}

one_shot!(NaturalSelection);

struct SurvivalOfTheFittest {
    action: EntityId,
}

impl SurvivalOfTheFittest {
    fn resolve(&self, player: PlayerId, ctx: &mut AbilityContext<'_>) -> Result<(), EngineError> {
        let bases: Vec<EntityId> = ctx.state().bases_in_play().to_vec();
        for base in bases {
            let state = ctx.state();
            let powers: Vec<(EntityId, i32)> = state
                .minions_on(base)
                .iter()
                .filter_map(|m| state.minion_power(*m).map(|p| (*m, p)))
                .collect();
            let Some(lowest) = powers.iter().map(|(_, p)| *p).min() else {
                continue;
            };
            let weakest: Vec<EntityId> = powers
                .iter()
                .filter(|(_, p)| *p == lowest)
                .map(|(m, _)| *m)
                .collect();
            let distinct: BTreeSet<i32> = powers.iter().map(|(_, p)| *p).collect();
            if distinct.len() < 2 {
                continue;
            }

            let target = match weakest.as_slice() {
                [only] => Some(*only),
                _ => ctx.choose_card(player, "Destroy the weakest minion", &weakest)?,
            };
            if let Some(minion) = target {
                ctx.perform(IntentKind::DestroyMinion { minion })?;
            }
        }
        Ok(())
    }
}

one_shot!(SurvivalOfTheFittest);
