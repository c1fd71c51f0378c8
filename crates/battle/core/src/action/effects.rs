//! Effect entries applied on hit, plus the subject's TP gain.

use crate::combatant::{Combatant, CombatantRef};
use crate::config::BattleConfig;
use crate::context::BattleContext;
use crate::env::{BattleEnv, Effect, StateDefinition, UsableDefinition};
use crate::ids::StateId;
use crate::stats::SpParamKind;

use super::Action;

/// Luck advantage multiplier for state and debuff chances, never negative.
pub fn luck_effect_rate(subject: &Combatant, target: &Combatant, config: &BattleConfig) -> f64 {
    let diff = f64::from(subject.luk() - target.luk());
    (1.0 + diff * config.luck_effect_factor).max(0.0)
}

fn make_success(ctx: &mut BattleContext, target: CombatantRef) {
    if let Some(recipient) = ctx.combatant_mut(target) {
        recipient.result_mut().mark_success();
    }
}

impl Action {
    pub(crate) fn apply_effect(
        &self,
        def: &UsableDefinition,
        effect: &Effect,
        target: CombatantRef,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) {
        let Some((luck, recovery)) = ctx
            .combatant(self.subject)
            .zip(ctx.combatant(target))
            .map(|(s, t)| {
                let pharmacology = if self.is_item() {
                    s.sp_param(SpParamKind::Pharmacology)
                } else {
                    1.0
                };
                (
                    luck_effect_rate(s, t, env.config()),
                    t.sp_param(SpParamKind::RecoveryEffect) * pharmacology,
                )
            })
        else {
            return;
        };

        match *effect {
            Effect::RecoverHp { rate, flat } => {
                let Some(recipient) = ctx.combatant_mut(target) else {
                    return;
                };
                let value =
                    ((f64::from(recipient.mhp()) * rate + flat) * recovery).floor() as i32;
                if value != 0 {
                    recipient.gain_hp(value);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::RecoverMp { rate, flat } => {
                let Some(recipient) = ctx.combatant_mut(target) else {
                    return;
                };
                let value =
                    ((f64::from(recipient.mmp()) * rate + flat) * recovery).floor() as i32;
                if value != 0 {
                    recipient.gain_mp(value);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::GainTp { value } => {
                let value = value.floor() as i32;
                if value != 0
                    && let Some(recipient) = ctx.combatant_mut(target)
                {
                    recipient.gain_tp(value);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::AddState { state, chance } => {
                let chance = if def.is_certain_hit() {
                    chance
                } else {
                    let rate = ctx
                        .combatant(target)
                        .map_or(1.0, |t| t.state_rate(state));
                    chance * rate * luck
                };
                self.roll_state(state, chance, target, ctx, env);
            }
            Effect::AddAttackStates { chance } => {
                let rolls: Vec<(StateId, f64)> = ctx
                    .combatant(self.subject)
                    .zip(ctx.combatant(target))
                    .map(|(s, t)| {
                        s.attack_states()
                            .into_iter()
                            .map(|state| {
                                let rate = chance
                                    * t.state_rate(state)
                                    * s.attack_states_rate(state)
                                    * luck;
                                (state, rate)
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                for (state, rate) in rolls {
                    self.roll_state(state, rate, target, ctx, env);
                }
            }
            Effect::RemoveState { state, chance } => {
                if env.random() < chance
                    && let Some(recipient) = ctx.combatant_mut(target)
                {
                    recipient.remove_state(state);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::AddBuff { param, turns } => {
                if let Some(recipient) = ctx.combatant_mut(target) {
                    recipient.add_buff(param, turns);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::AddDebuff { param, turns } => {
                let rate = ctx
                    .combatant(target)
                    .map_or(0.0, |t| t.debuff_rate(param) * luck);
                if env.random() < rate
                    && let Some(recipient) = ctx.combatant_mut(target)
                {
                    recipient.add_debuff(param, turns);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::RemoveBuff { param } => {
                if let Some(recipient) = ctx.combatant_mut(target)
                    && recipient.buffs().is_buff(param)
                {
                    recipient.remove_buff(param);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::RemoveDebuff { param } => {
                if let Some(recipient) = ctx.combatant_mut(target)
                    && recipient.buffs().is_debuff(param)
                {
                    recipient.remove_buff(param);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::Escape => {
                if let Some(recipient) = ctx.combatant_mut(target) {
                    recipient.escape();
                    recipient.result_mut().mark_success();
                }
            }
            Effect::Grow { param, value } => {
                if let Some(recipient) = ctx.combatant_mut(target) {
                    recipient.add_param(param, value);
                    recipient.result_mut().mark_success();
                }
            }
            Effect::LearnSkill { skill } => {
                if let Some(recipient) = ctx.combatant_mut(target)
                    && let Some(profile) = recipient.ally_profile_mut()
                {
                    profile.learn_skill(skill);
                    recipient.result_mut().mark_success();
                }
            }
            // Reserved once per action in `apply_global`.
            Effect::CommonEvent { .. } => {}
        }
    }

    fn roll_state(
        &self,
        state: StateId,
        chance: f64,
        target: CombatantRef,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) {
        if env.random() >= chance {
            return;
        }
        let Some(definition): Option<&StateDefinition> = env.data().state(state) else {
            tracing::warn!(%state, "state definition missing");
            return;
        };
        if let Some(recipient) = ctx.combatant_mut(target) {
            recipient.add_state(definition, env.rng());
        }
        make_success(ctx, target);
    }

    /// TP the subject earns for using the usable, scaled by its charge rate.
    pub(crate) fn apply_user_effect(&self, def: &UsableDefinition, ctx: &mut BattleContext) {
        if let Some(subject) = ctx.combatant_mut(self.subject) {
            let value =
                (f64::from(def.tp_gain) * subject.sp_param(SpParamKind::TpChargeRate)).floor();
            subject.gain_silent_tp(value as i32);
        }
    }
}
