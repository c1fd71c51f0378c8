//! Damage value pipeline and its application.
//!
//! ```text
//! base     = max(formula, 0) × sign
//! value    = base × element × (pdr | mdr) × (base < 0 ? rec : 1)
//! value    = critical ? value × critical_multiplier : value
//! value    = variance(value)
//! value    = guard(value)
//! damage   = round(value)
//! ```

use crate::combatant::{Combatant, CombatantRef};
use crate::config::BattleConfig;
use crate::context::BattleContext;
use crate::env::{BattleEnv, DamageElement, DamageKind, RngOracle, UsableDefinition};
use crate::outcome::OutcomeFlags;
use crate::stats::SpParamKind;

use super::Action;
use super::formula::{FormulaError, FormulaScope, evaluate};

pub fn apply_critical(value: f64, config: &BattleConfig) -> f64 {
    value * config.critical_multiplier
}

/// Adds a triangular spread of `variance` percent around `value`.
///
/// Two draws from `[0, amp]` are summed and centred, so the offset lies in
/// `[-amp, amp]` and leans toward zero. The offset moves away from zero
/// for negative values the same way it does for positive ones.
pub fn apply_variance(value: f64, variance: u32, rng: &mut dyn RngOracle) -> f64 {
    let amp = (value.abs() * f64::from(variance) / 100.0).floor().max(0.0) as u32;
    let bound = amp.saturating_add(1);
    let offset =
        f64::from(rng.random_int(bound)) + f64::from(rng.random_int(bound)) - f64::from(amp);
    if value >= 0.0 {
        value + offset
    } else {
        value - offset
    }
}

/// Positive damage against a guarding target is divided by `2 × grd`.
pub fn apply_guard(value: f64, target: &Combatant) -> f64 {
    if value > 0.0 && target.is_guard() {
        value / (2.0 * target.sp_param(SpParamKind::GuardEffect))
    } else {
        value
    }
}

pub fn element_rate(def: &UsableDefinition, subject: &Combatant, target: &Combatant) -> f64 {
    match def.damage.element {
        DamageElement::None => 1.0,
        DamageElement::NormalAttack => {
            let elements = subject.attack_elements();
            if elements.is_empty() {
                1.0
            } else {
                elements
                    .into_iter()
                    .map(|e| target.element_rate(e))
                    .fold(f64::NEG_INFINITY, f64::max)
            }
        }
        DamageElement::Element(id) => target.element_rate(id),
    }
}

/// Rounds half up, matching how damage figures are displayed.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

impl Action {
    /// Evaluates the damage formula; failures count as zero.
    pub fn eval_damage_formula(
        &self,
        def: &UsableDefinition,
        subject: &Combatant,
        target: &Combatant,
        ctx: &BattleContext,
    ) -> f64 {
        let scope = FormulaScope {
            a: subject,
            b: target,
            v: ctx,
        };
        match evaluate(&def.damage.formula, &scope) {
            Ok(value) => value.max(0.0) * def.damage.kind.sign(),
            Err(FormulaError::Empty) => 0.0,
            Err(error) => {
                tracing::warn!(
                    usable = %def.name,
                    formula = %def.damage.formula,
                    %error,
                    "damage formula failed"
                );
                0.0
            }
        }
    }

    /// Full damage figure this action would deal to `target`.
    ///
    /// Consumes two RNG draws for variance.
    pub fn make_damage_value(
        &self,
        def: &UsableDefinition,
        target: CombatantRef,
        critical: bool,
        ctx: &BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> i32 {
        let (Some(subject), Some(recipient)) = (ctx.combatant(self.subject), ctx.combatant(target))
        else {
            return 0;
        };
        let base = self.eval_damage_formula(def, subject, recipient, ctx);
        let mut value = base * element_rate(def, subject, recipient);
        if def.is_physical() {
            value *= recipient.sp_param(SpParamKind::PhysicalDamageRate);
        }
        if def.is_magical() {
            value *= recipient.sp_param(SpParamKind::MagicalDamageRate);
        }
        if base < 0.0 {
            value *= recipient.sp_param(SpParamKind::RecoveryEffect);
        }
        if critical {
            value = apply_critical(value, env.config());
        }
        value = apply_variance(value, def.damage.variance, env.rng());
        value = apply_guard(value, recipient);
        round_half_up(value)
    }

    pub(crate) fn execute_damage(
        &self,
        def: &UsableDefinition,
        target: CombatantRef,
        value: i32,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) {
        if value == 0
            && let Some(recipient) = ctx.combatant_mut(target)
        {
            recipient.result_mut().set(OutcomeFlags::CRITICAL, false);
        }
        let kind = def.damage.kind;
        if kind.is_hp_effect() {
            self.execute_hp_damage(kind, target, value, ctx, env);
        }
        if kind.is_mp_effect() {
            self.execute_mp_damage(kind, target, value, ctx);
        }
    }

    fn execute_hp_damage(
        &self,
        kind: DamageKind,
        target: CombatantRef,
        value: i32,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) {
        let Some(recipient) = ctx.combatant_mut(target) else {
            return;
        };
        let value = if kind.is_drain() {
            value.min(recipient.hp())
        } else {
            value
        };
        recipient.result_mut().mark_success();
        recipient.gain_hp(value.saturating_neg());
        if value > 0 {
            recipient.on_damage(value, env.config(), env.rng());
        }
        if kind.is_drain()
            && let Some(drainer) = ctx.combatant_mut(self.drain_receiver())
        {
            drainer.gain_hp(value);
        }
    }

    /// MP loss is capped at the target's current MP, drain included.
    fn execute_mp_damage(
        &self,
        kind: DamageKind,
        target: CombatantRef,
        value: i32,
        ctx: &mut BattleContext,
    ) {
        let Some(recipient) = ctx.combatant_mut(target) else {
            return;
        };
        let value = if kind == DamageKind::MpRecover {
            value
        } else {
            value.min(recipient.mp())
        };
        if value != 0 {
            recipient.result_mut().mark_success();
        }
        recipient.gain_mp(value.saturating_neg());
        if kind.is_drain()
            && let Some(drainer) = ctx.combatant_mut(self.drain_receiver())
        {
            drainer.gain_mp(value);
        }
    }

    /// Reflected drains credit the reflector.
    fn drain_receiver(&self) -> CombatantRef {
        self.reflection_target.unwrap_or(self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Side;
    use crate::env::{DamageSpec, DataSnapshot, HitType, Scope, SequenceRng};
    use crate::group::Group;
    use crate::ids::ElementId;
    use crate::stats::{BaseParams, SpecialFlag, Trait};

    fn unit(name: &str, side: Side) -> Combatant {
        Combatant::new(name, side, BaseParams::new([100, 40, 20, 5, 10, 10, 10, 10]))
    }

    fn duel(hero: Combatant, orc: Combatant) -> BattleContext {
        let mut ctx = BattleContext::with_party([hero]);
        ctx.troop = Group::with_members(Side::Enemy, [orc]);
        ctx
    }

    fn usable(kind: DamageKind, formula: &str) -> UsableDefinition {
        UsableDefinition {
            scope: Scope::OneOpponent,
            hit_type: HitType::Certain,
            damage: DamageSpec {
                kind,
                formula: formula.into(),
                ..DamageSpec::default()
            },
            ..UsableDefinition::default()
        }
    }

    #[test]
    fn variance_is_bounded_and_symmetric() {
        // amp = 10; draws of 0 and 0 give the lower bound
        let mut low = SequenceRng::constant(0.0);
        assert_eq!(apply_variance(100.0, 10, &mut low), 90.0);
        assert_eq!(apply_variance(-100.0, 10, &mut low), -90.0);
        let mut high = SequenceRng::constant(0.999);
        assert_eq!(apply_variance(100.0, 10, &mut high), 110.0);
        assert_eq!(apply_variance(-100.0, 10, &mut high), -110.0);
    }

    #[test]
    fn zero_variance_still_draws_twice() {
        let mut rng = SequenceRng::constant(0.5);
        assert_eq!(apply_variance(37.0, 0, &mut rng), 37.0);
        assert_eq!(rng.consumed(), 2);
    }

    #[test]
    fn guard_only_reduces_positive_damage() {
        let guarded = unit("Hero", Side::Ally).with_traits(vec![
            Trait::Special(SpecialFlag::Guard),
            Trait::SpParam {
                param: SpParamKind::GuardEffect,
                rate: 1.0,
            },
        ]);
        assert_eq!(apply_guard(100.0, &guarded), 50.0);
        assert_eq!(apply_guard(-100.0, &guarded), -100.0);
        assert_eq!(apply_guard(100.0, &unit("Orc", Side::Enemy)), 100.0);
    }

    #[test]
    fn normal_attack_element_takes_best_rate() {
        let mut def = usable(DamageKind::HpDamage, "10");
        def.damage.element = DamageElement::NormalAttack;
        let subject = unit("Hero", Side::Ally).with_traits(vec![
            Trait::AttackElement(ElementId(1)),
            Trait::AttackElement(ElementId(2)),
        ]);
        let target = unit("Orc", Side::Enemy).with_traits(vec![
            Trait::ElementRate {
                element: ElementId(1),
                rate: 0.5,
            },
            Trait::ElementRate {
                element: ElementId(2),
                rate: 2.0,
            },
        ]);
        assert_eq!(element_rate(&def, &subject, &target), 2.0);
        assert_eq!(element_rate(&def, &unit("Bare", Side::Ally), &target), 1.0);
    }

    #[test]
    fn recovery_formula_yields_negative_value() {
        let data = DataSnapshot::standard();
        let config = BattleConfig::default();
        let ctx = duel(unit("Hero", Side::Ally), unit("Orc", Side::Enemy));
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let def = usable(DamageKind::HpRecover, "30");
        let action = Action::new(CombatantRef::ally(0));
        let value = action.make_damage_value(&def, CombatantRef::ally(0), false, &ctx, &mut env);
        assert_eq!(value, -30);
    }

    #[test]
    fn broken_formula_counts_as_zero() {
        let data = DataSnapshot::standard();
        let config = BattleConfig::default();
        let ctx = duel(unit("Hero", Side::Ally), unit("Orc", Side::Enemy));
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let def = usable(DamageKind::HpDamage, "a.atk +");
        let action = Action::new(CombatantRef::ally(0));
        let value = action.make_damage_value(&def, CombatantRef::enemy(0), false, &ctx, &mut env);
        assert_eq!(value, 0);
    }

    #[test]
    fn deeply_nested_formula_counts_as_zero() {
        let ctx = duel(unit("Hero", Side::Ally), unit("Orc", Side::Enemy));
        let hero = ctx.combatant(CombatantRef::ally(0)).expect("hero");
        let orc = ctx.combatant(CombatantRef::enemy(0)).expect("orc");
        let action = Action::new(CombatantRef::ally(0));

        let nested = format!("{}a.atk{}", "(".repeat(50_000), ")".repeat(50_000));
        let def = usable(DamageKind::HpDamage, &nested);
        assert_eq!(action.eval_damage_formula(&def, hero, orc, &ctx), 0.0);

        let negated = format!("{}a.atk", "-".repeat(500));
        let def = usable(DamageKind::HpDamage, &negated);
        assert_eq!(action.eval_damage_formula(&def, hero, orc, &ctx), 0.0);
    }

    #[test]
    fn critical_multiplies_before_variance() {
        let data = DataSnapshot::standard();
        let config = BattleConfig::default();
        let ctx = duel(unit("Hero", Side::Ally), unit("Orc", Side::Enemy));
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let def = usable(DamageKind::HpDamage, "10");
        let action = Action::new(CombatantRef::ally(0));
        let value = action.make_damage_value(&def, CombatantRef::enemy(0), true, &ctx, &mut env);
        assert_eq!(value, (10.0 * config.critical_multiplier).round() as i32);
    }

    #[test]
    fn hp_drain_is_capped_by_target_hp() {
        let data = DataSnapshot::standard();
        let config = BattleConfig::default();
        let mut ctx = duel(unit("Hero", Side::Ally).with_hp(20), unit("Orc", Side::Enemy).with_hp(15));
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let def = usable(DamageKind::HpDrain, "50");
        let action = Action::new(CombatantRef::ally(0));
        action.execute_damage(&def, CombatantRef::enemy(0), 50, &mut ctx, &mut env);
        let orc = ctx.combatant(CombatantRef::enemy(0)).expect("orc");
        assert_eq!(orc.hp(), 0);
        assert_eq!(orc.result().hp_damage, 15);
        assert_eq!(ctx.combatant(CombatantRef::ally(0)).map(Combatant::hp), Some(35));
    }

    #[test]
    fn reflected_drain_credits_the_reflector() {
        let data = DataSnapshot::standard();
        let config = BattleConfig::default();
        let mut ctx = duel(unit("Hero", Side::Ally).with_mp(10), unit("Orc", Side::Enemy).with_mp(5));
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let def = usable(DamageKind::MpDrain, "8");
        let mut action = Action::new(CombatantRef::ally(0));
        action.reflection_target = Some(CombatantRef::enemy(0));
        action.execute_damage(&def, CombatantRef::ally(0), 8, &mut ctx, &mut env);
        assert_eq!(ctx.combatant(CombatantRef::ally(0)).map(Combatant::mp), Some(2));
        assert_eq!(ctx.combatant(CombatantRef::enemy(0)).map(Combatant::mp), Some(13));
    }

    #[test]
    fn zero_damage_clears_critical() {
        let data = DataSnapshot::standard();
        let config = BattleConfig::default();
        let mut ctx = duel(unit("Hero", Side::Ally), unit("Orc", Side::Enemy));
        if let Some(orc) = ctx.combatant_mut(CombatantRef::enemy(0)) {
            orc.result_mut().set(OutcomeFlags::CRITICAL, true);
        }
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let def = usable(DamageKind::HpDamage, "0");
        Action::new(CombatantRef::ally(0)).execute_damage(&def, CombatantRef::enemy(0), 0, &mut ctx, &mut env);
        let orc = ctx.combatant(CombatantRef::enemy(0)).expect("orc");
        assert!(!orc.result().is_critical());
        assert!(orc.result().is_success());
    }
}
