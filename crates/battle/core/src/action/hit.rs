//! Hit resolution: counter, reflection, substitute, then the normal
//! used/missed/evaded/critical rolls.
//!
//! # Rates
//!
//! ```text
//! hit      = success_rate / 100 × (physical ? subject.hit : 1)
//! evasion  = physical ? target.eva : magical ? target.mev : 0
//! critical = critical-capable ? subject.cri × (1 − target.cev) : 0
//! counter  = physical && target can move ? target.cnt : 0
//! reflect  = magical ? target.mrf : 0
//! ```

use crate::combatant::{Combatant, CombatantRef};
use crate::context::BattleContext;
use crate::env::{BattleEnv, UsableDefinition};
use crate::outcome::{Outcome, OutcomeFlags};
use crate::stats::ExParamKind;

use super::Action;

/// How a single target invocation was routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum HitRoute {
    Normal,
    /// The target struck back with a basic attack instead.
    Counter,
    /// The target bounced a magical action back onto its subject.
    Reflection,
}

/// What one target invocation produced.
#[derive(Clone, Debug, PartialEq)]
pub struct HitReport {
    pub route: HitRoute,
    /// Combatant whose action landed (the counterer or reflector on those routes).
    pub actor: CombatantRef,
    /// Combatant that received the outcome.
    pub recipient: CombatantRef,
    /// Original target when a substitute stepped in.
    pub substitute_for: Option<CombatantRef>,
    pub outcome: Outcome,
}

// ============================================================================
// Rates
// ============================================================================

pub fn hit_rate(def: &UsableDefinition, subject: &Combatant) -> f64 {
    let rate = f64::from(def.success_rate) * 0.01;
    if def.is_physical() {
        rate * subject.ex_param(ExParamKind::Hit)
    } else {
        rate
    }
}

pub fn evasion_rate(def: &UsableDefinition, target: &Combatant) -> f64 {
    if def.is_physical() {
        target.ex_param(ExParamKind::Evasion)
    } else if def.is_magical() {
        target.ex_param(ExParamKind::MagicEvasion)
    } else {
        0.0
    }
}

pub fn critical_rate(def: &UsableDefinition, subject: &Combatant, target: &Combatant) -> f64 {
    if def.damage.critical {
        subject.ex_param(ExParamKind::Critical)
            * (1.0 - target.ex_param(ExParamKind::CriticalEvasion))
    } else {
        0.0
    }
}

pub fn counter_rate(def: &UsableDefinition, target: &Combatant) -> f64 {
    if def.is_physical() && target.can_move() {
        target.ex_param(ExParamKind::Counter)
    } else {
        0.0
    }
}

pub fn reflection_rate(def: &UsableDefinition, target: &Combatant) -> f64 {
    if def.is_magical() {
        target.ex_param(ExParamKind::MagicReflection)
    } else {
        0.0
    }
}

/// Dead-friend scopes need a dead recipient; every other scope a non-dead one.
pub fn test_apply(def: &UsableDefinition, target: &Combatant) -> bool {
    def.scope.is_for_dead_friend() == target.is_dead()
}

// ============================================================================
// Resolution
// ============================================================================

impl Action {
    /// Resolves this action against one queued target.
    ///
    /// Rolls the target's counter chance first, then its reflection chance,
    /// and otherwise applies the action normally, letting a substitute cover a
    /// dying target. Returns `None` when the usable no longer exists.
    pub fn resolve_hit(
        &mut self,
        target: CombatantRef,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> Option<HitReport> {
        let def = self.definition(env.data())?;
        let (cnt, mrf) = ctx
            .combatant(target)
            .map(|t| (counter_rate(def, t), reflection_rate(def, t)))
            .unwrap_or((0.0, 0.0));
        self.reflection_target = None;

        if env.random() < cnt {
            tracing::debug!(counterer = %target, subject = %self.subject, "counter attack");
            let counter = Action::attack(target);
            let outcome = counter.apply(self.subject, ctx, env);
            return Some(HitReport {
                route: HitRoute::Counter,
                actor: target,
                recipient: self.subject,
                substitute_for: None,
                outcome,
            });
        }

        if env.random() < mrf {
            tracing::debug!(reflector = %target, subject = %self.subject, "magic reflection");
            self.reflection_target = Some(target);
            let outcome = self.apply(self.subject, ctx, env);
            return Some(HitReport {
                route: HitRoute::Reflection,
                actor: target,
                recipient: self.subject,
                substitute_for: None,
                outcome,
            });
        }

        let recipient = self.substitute_target(def, target, ctx);
        let outcome = self.apply(recipient, ctx, env);
        Some(HitReport {
            route: HitRoute::Normal,
            actor: self.subject,
            recipient,
            substitute_for: (recipient != target).then_some(target),
            outcome,
        })
    }

    /// A dying target hit by a non-certain action is covered by the first
    /// substitute of its group.
    fn substitute_target(
        &self,
        def: &UsableDefinition,
        target: CombatantRef,
        ctx: &BattleContext,
    ) -> CombatantRef {
        let dying = ctx.combatant(target).is_some_and(Combatant::is_dying);
        if dying
            && !def.is_certain_hit()
            && let Some(substitute) = ctx.friends_of(target).substitute_battler()
            && substitute != target
        {
            tracing::debug!(substitute = %substitute, target = %target, "substitute");
            return substitute;
        }
        target
    }

    /// Applies this action to `target` and returns the target's outcome record.
    pub fn apply(
        &self,
        target: CombatantRef,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> Outcome {
        let Some(def) = self.definition(env.data()) else {
            return Outcome::default();
        };
        let Some((used, hit, eva, cri)) = ctx
            .combatant(self.subject)
            .zip(ctx.combatant(target))
            .map(|(s, t)| {
                (
                    test_apply(def, t),
                    hit_rate(def, s),
                    evasion_rate(def, t),
                    critical_rate(def, s, t),
                )
            })
        else {
            return Outcome::default();
        };

        if let Some(subject) = ctx.combatant_mut(self.subject) {
            subject.clear_result();
        }

        let missed = used && env.random() >= hit;
        let evaded = !missed && env.random() < eva;
        let is_hit = {
            let Some(recipient) = ctx.combatant_mut(target) else {
                return Outcome::default();
            };
            let result = recipient.result_mut();
            result.clear();
            result.set(OutcomeFlags::USED, used);
            result.set(OutcomeFlags::MISSED, missed);
            result.set(OutcomeFlags::EVADED, evaded);
            result.set(OutcomeFlags::PHYSICAL, def.is_physical());
            result.set(OutcomeFlags::DRAIN, def.damage.kind.is_drain());
            result.is_hit()
        };

        if is_hit {
            if !def.damage.kind.is_none() {
                let critical = env.random() < cri;
                if let Some(recipient) = ctx.combatant_mut(target) {
                    recipient.result_mut().set(OutcomeFlags::CRITICAL, critical);
                }
                let value = self.make_damage_value(def, target, critical, ctx, env);
                self.execute_damage(def, target, value, ctx, env);
            }
            for effect in &def.effects {
                self.apply_effect(def, effect, target, ctx, env);
            }
            self.apply_user_effect(def, ctx);
        }

        let outcome = ctx
            .combatant(target)
            .map(|t| t.result().clone())
            .unwrap_or_default();
        tracing::trace!(
            subject = %self.subject,
            target = %target,
            used,
            missed,
            evaded,
            hp_damage = outcome.hp_damage,
            "applied action"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Side;
    use crate::config::BattleConfig;
    use crate::env::{DataSnapshot, HitType, Scope, SequenceRng, SkillDefinition};
    use crate::group::Group;
    use crate::ids::SkillId;
    use crate::stats::{BaseParams, SpecialFlag, Trait};

    fn unit(name: &str, side: Side, traits: Vec<Trait>) -> Combatant {
        Combatant::new(name, side, BaseParams::new([100, 50, 20, 5, 10, 10, 10, 10]))
            .with_traits(traits)
    }

    fn accurate() -> Vec<Trait> {
        vec![Trait::ExParam {
            param: ExParamKind::Hit,
            value: 1.0,
        }]
    }

    fn duel(ally: Vec<Trait>, enemy: Vec<Trait>) -> BattleContext {
        let mut ctx = BattleContext::with_party([unit("Hero", Side::Ally, ally)]);
        ctx.troop = Group::with_members(Side::Enemy, [unit("Orc", Side::Enemy, enemy)]);
        ctx
    }

    fn flat_attack() -> DataSnapshot {
        let mut data = DataSnapshot::standard();
        if let Some(attack) = data.skills.get_mut(&SkillId::ATTACK) {
            attack.usable.damage.variance = 0;
            attack.usable.damage.critical = false;
            attack.usable.effects.clear();
        }
        data
    }

    #[test]
    fn physical_miss_uses_subject_hit_rate() {
        let data = flat_attack();
        let config = BattleConfig::default();
        // no hit trait: hit rate 0, so the first roll misses
        let mut ctx = duel(vec![], vec![]);
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let outcome = Action::attack(CombatantRef::ally(0)).apply(CombatantRef::enemy(0), &mut ctx, &mut env);
        assert!(outcome.is_used() && outcome.is_missed());
        assert_eq!(ctx.combatant(CombatantRef::enemy(0)).map(Combatant::hp), Some(100));
    }

    #[test]
    fn hit_applies_damage_and_records_outcome() {
        let data = flat_attack();
        let config = BattleConfig::default();
        let mut ctx = duel(accurate(), vec![]);
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let outcome = Action::attack(CombatantRef::ally(0)).apply(CombatantRef::enemy(0), &mut ctx, &mut env);
        // 20 * 4 - 5 * 2 = 70
        assert!(outcome.is_hit() && outcome.is_success());
        assert_eq!(outcome.hp_damage, 70);
        assert_eq!(ctx.combatant(CombatantRef::enemy(0)).map(Combatant::hp), Some(30));
    }

    #[test]
    fn dead_target_is_not_used() {
        let data = flat_attack();
        let config = BattleConfig::default();
        let mut ctx = duel(accurate(), vec![]);
        if let Some(orc) = ctx.combatant_mut(CombatantRef::enemy(0)) {
            orc.set_hp(0);
        }
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let outcome = Action::attack(CombatantRef::ally(0)).apply(CombatantRef::enemy(0), &mut ctx, &mut env);
        assert!(!outcome.is_used());
        assert!(!outcome.is_hit());
    }

    #[test]
    fn counter_strikes_the_subject_instead() {
        let data = flat_attack();
        let config = BattleConfig::default();
        let mut enemy = accurate();
        enemy.push(Trait::ExParam {
            param: ExParamKind::Counter,
            value: 1.0,
        });
        let mut ctx = duel(accurate(), enemy);
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut attack = Action::attack(CombatantRef::ally(0));
        let report = attack
            .resolve_hit(CombatantRef::enemy(0), &mut ctx, &mut env)
            .expect("attack is defined");
        assert_eq!(report.route, HitRoute::Counter);
        assert_eq!(report.recipient, CombatantRef::ally(0));
        assert_eq!(ctx.combatant(CombatantRef::enemy(0)).map(Combatant::hp), Some(100));
        assert_eq!(ctx.combatant(CombatantRef::ally(0)).map(Combatant::hp), Some(30));
    }

    #[test]
    fn reflection_turns_magic_back_on_the_caster() {
        let bolt = SkillDefinition {
            id: SkillId(20),
            usable: crate::env::UsableDefinition {
                scope: Scope::OneOpponent,
                hit_type: HitType::Magical,
                damage: crate::env::DamageSpec {
                    kind: crate::env::DamageKind::HpDamage,
                    formula: "40".into(),
                    ..crate::env::DamageSpec::default()
                },
                ..crate::env::UsableDefinition::default()
            },
            ..SkillDefinition::default()
        };
        let data = flat_attack().with_skill(bolt);
        let config = BattleConfig::default();
        let mut ctx = duel(
            vec![],
            vec![Trait::ExParam {
                param: ExParamKind::MagicReflection,
                value: 1.0,
            }],
        );
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut bolt_action = Action::new(CombatantRef::ally(0));
        bolt_action.set_skill(SkillId(20));
        let report = bolt_action
            .resolve_hit(CombatantRef::enemy(0), &mut ctx, &mut env)
            .expect("bolt is defined");
        assert_eq!(report.route, HitRoute::Reflection);
        assert_eq!(bolt_action.reflection_target(), Some(CombatantRef::enemy(0)));
        assert_eq!(ctx.combatant(CombatantRef::ally(0)).map(Combatant::hp), Some(60));
    }

    #[test]
    fn substitute_covers_a_dying_ally() {
        let data = flat_attack();
        let config = BattleConfig::default();
        let mut ctx = duel(vec![], accurate());
        ctx.party.add_member(unit(
            "Knight",
            Side::Ally,
            vec![Trait::Special(SpecialFlag::Substitute)],
        ));
        if let Some(hero) = ctx.combatant_mut(CombatantRef::ally(0)) {
            hero.set_hp(10);
        }
        let mut rng = SequenceRng::constant(0.5);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut attack = Action::attack(CombatantRef::enemy(0));
        let report = attack
            .resolve_hit(CombatantRef::ally(0), &mut ctx, &mut env)
            .expect("attack is defined");
        assert_eq!(report.recipient, CombatantRef::ally(1));
        assert_eq!(report.substitute_for, Some(CombatantRef::ally(0)));
        assert_eq!(ctx.combatant(CombatantRef::ally(0)).map(Combatant::hp), Some(10));
    }
}
