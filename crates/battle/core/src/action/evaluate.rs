//! Auto-battle scoring.
//!
//! Every candidate action is scored by the fraction of HP it would remove
//! from opponents (or restore to friends); the best scorer fills each open
//! action slot. Scoring runs the real damage pipeline, so it consumes RNG.

use crate::combatant::CombatantRef;
use crate::context::BattleContext;
use crate::env::{BattleEnv, DataOracle, UsableDefinition, UsableRef};
use crate::ids::SkillId;
use crate::stats::Trait;

use super::Action;

impl Action {
    /// Desirability of this action; 0 when it cannot be used.
    ///
    /// Single-target scopes remember the best target in `target_index`.
    pub fn evaluate(&mut self, ctx: &BattleContext, env: &mut BattleEnv<'_>) -> f64 {
        let data = env.data();
        let Some(def) = self.definition(data) else {
            return 0.0;
        };
        let mut value = 0.0;
        for target in self.target_candidates(def, ctx, data) {
            let target_value = self.evaluate_with_target(def, target, ctx, env);
            if def.scope.is_for_all() {
                value += target_value;
            } else if target_value > value {
                value = target_value;
                self.target_index = Some(target.index);
            }
        }
        value *= self.num_repeats(ctx, data) as f64;
        if value > 0.0 {
            value += env.random();
        }
        value
    }

    fn target_candidates(
        &self,
        def: &UsableDefinition,
        ctx: &BattleContext,
        data: &dyn DataOracle,
    ) -> Vec<CombatantRef> {
        if !self.is_valid(ctx, data) {
            Vec::new()
        } else if def.scope.is_for_opponent() {
            ctx.opponents_of(self.subject).alive_refs()
        } else if def.scope.is_for_user() {
            vec![self.subject]
        } else if def.scope.is_for_dead_friend() {
            ctx.friends_of(self.subject).dead_refs()
        } else {
            ctx.friends_of(self.subject).alive_refs()
        }
    }

    /// Only HP damage and recovery are scored; anything else is worth 0.
    fn evaluate_with_target(
        &self,
        def: &UsableDefinition,
        target: CombatantRef,
        ctx: &BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> f64 {
        if !def.damage.kind.is_hp_effect() {
            return 0.0;
        }
        let value = f64::from(self.make_damage_value(def, target, false, ctx, env));
        let Some(recipient) = ctx.combatant(target) else {
            return 0.0;
        };
        if def.scope.is_for_opponent() {
            value / f64::from(recipient.hp().max(1))
        } else {
            let missing = f64::from(recipient.mhp() - recipient.hp());
            (-value).min(missing) / f64::from(recipient.mhp().max(1))
        }
    }
}

/// Skills the subject knows, including trait-granted ones, in id order.
pub fn known_skills(ctx: &BattleContext, subject: CombatantRef) -> Vec<SkillId> {
    let Some(combatant) = ctx.combatant(subject) else {
        return Vec::new();
    };
    let mut skills: Vec<SkillId> = combatant
        .ally_profile()
        .map(|profile| profile.skills.clone())
        .unwrap_or_default();
    skills.extend(combatant.all_traits().filter_map(|t| match t {
        Trait::SkillAdd(skill) => Some(*skill),
        _ => None,
    }));
    skills.sort();
    skills.dedup();
    skills
}

/// Basic attack plus every known skill usable right now.
pub fn action_list(ctx: &BattleContext, subject: CombatantRef, data: &dyn DataOracle) -> Vec<Action> {
    let mut list = vec![Action::attack(subject)];
    list.extend(
        known_skills(ctx, subject)
            .into_iter()
            .filter(|skill| ctx.can_use(subject, Some(UsableRef::Skill(*skill)), data))
            .map(|skill| {
                let mut action = Action::new(subject);
                action.set_skill(skill);
                action
            }),
    );
    list
}

/// Fills every action slot of `subject` with its best-scoring action.
pub fn make_auto_battle_actions(
    subject: CombatantRef,
    ctx: &mut BattleContext,
    env: &mut BattleEnv<'_>,
) {
    let slots = ctx.combatant(subject).map_or(0, |c| c.actions().len());
    for slot in 0..slots {
        let mut best: Option<Action> = None;
        let mut max_value = f64::MIN_POSITIVE;
        for mut action in action_list(ctx, subject, env.data()) {
            let value = action.evaluate(ctx, env);
            if value > max_value {
                max_value = value;
                best = Some(action);
            }
        }
        if let Some(action) = best
            && let Some(combatant) = ctx.combatant_mut(subject)
        {
            tracing::debug!(
                combatant = %subject,
                slot,
                usable = ?action.usable(),
                score = max_value,
                "auto-battle choice"
            );
            combatant.set_action(slot, action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Combatant, Side};
    use crate::config::BattleConfig;
    use crate::env::{
        ActorDefinition, DamageKind, DamageSpec, DataSnapshot, HitType, Scope, SequenceRng,
        SkillDefinition,
    };
    use crate::group::Group;
    use crate::stats::BaseParams;

    const HEAL: SkillId = SkillId(10);
    const BLAST: SkillId = SkillId(11);

    fn skill(id: SkillId, scope: Scope, kind: DamageKind, formula: &str) -> SkillDefinition {
        SkillDefinition {
            id,
            usable: UsableDefinition {
                scope,
                hit_type: HitType::Certain,
                damage: DamageSpec {
                    kind,
                    formula: formula.into(),
                    ..DamageSpec::default()
                },
                ..UsableDefinition::default()
            },
            ..SkillDefinition::default()
        }
    }

    fn data() -> DataSnapshot {
        let mut data = DataSnapshot::standard()
            .with_skill(skill(HEAL, Scope::OneFriend, DamageKind::HpRecover, "50"))
            .with_skill(skill(BLAST, Scope::AllOpponents, DamageKind::HpDamage, "40"));
        if let Some(attack) = data.skills.get_mut(&SkillId::ATTACK) {
            attack.usable.damage.variance = 0;
        }
        data
    }

    fn hero(skills: Vec<SkillId>) -> Combatant {
        Combatant::from_actor(&ActorDefinition {
            name: "Hero".into(),
            level: 1,
            params: BaseParams::new([100, 50, 20, 5, 10, 10, 10, 10]),
            skills,
            ..ActorDefinition::default()
        })
    }

    fn ctx_with(hero: Combatant, enemies: usize) -> BattleContext {
        let mut ctx = BattleContext::with_party([hero]);
        ctx.troop = Group::with_members(
            Side::Enemy,
            (0..enemies).map(|_| {
                Combatant::new("Slime", Side::Enemy, BaseParams::new([100, 0, 10, 5, 5, 5, 5, 5]))
            }),
        );
        ctx
    }

    #[test]
    fn attack_prefers_the_weakest_opponent() {
        let data = data();
        let config = BattleConfig::default();
        let mut ctx = ctx_with(hero(vec![]), 2);
        if let Some(slime) = ctx.combatant_mut(CombatantRef::enemy(1)) {
            slime.set_hp(40);
        }
        let mut rng = SequenceRng::constant(0.0);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut attack = Action::attack(CombatantRef::ally(0));
        let score = attack.evaluate(&ctx, &mut env);
        // 70 damage against 40 HP
        assert_eq!(attack.target_index(), Some(1));
        assert!((score - 70.0 / 40.0).abs() < 1e-9);
    }

    #[test]
    fn healing_scores_missing_hp_only() {
        let data = data();
        let config = BattleConfig::default();
        let mut ctx = ctx_with(hero(vec![HEAL]), 1);
        if let Some(hero) = ctx.combatant_mut(CombatantRef::ally(0)) {
            hero.set_hp(80);
        }
        let mut rng = SequenceRng::constant(0.0);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut heal = Action::new(CombatantRef::ally(0));
        heal.set_skill(HEAL);
        let score = heal.evaluate(&ctx, &mut env);
        assert!((score - 20.0 / 100.0).abs() < 1e-9);
    }

    #[test]
    fn area_skill_sums_over_targets() {
        let data = data();
        let config = BattleConfig::default();
        let ctx = ctx_with(hero(vec![BLAST]), 3);
        let mut rng = SequenceRng::constant(0.0);
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut blast = Action::new(CombatantRef::ally(0));
        blast.set_skill(BLAST);
        let score = blast.evaluate(&ctx, &mut env);
        assert!((score - 3.0 * 40.0 / 100.0).abs() < 1e-9);
        assert_eq!(blast.target_index(), None);
    }

    #[test]
    fn auto_battle_picks_the_best_scorer() {
        let data = data();
        let config = BattleConfig::default();
        let mut ctx = ctx_with(hero(vec![HEAL, BLAST]), 3);
        let mut rng = SequenceRng::constant(0.0);
        if let Some(hero) = ctx.combatant_mut(CombatantRef::ally(0)) {
            hero.make_actions(&mut rng);
        }
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        make_auto_battle_actions(CombatantRef::ally(0), &mut ctx, &mut env);
        let hero = ctx.combatant(CombatantRef::ally(0)).expect("hero");
        // blast: 1.2, attack: 0.7, heal: nothing missing
        assert_eq!(hero.actions()[0].usable(), Some(UsableRef::Skill(BLAST)));
    }

    #[test]
    fn known_skills_merge_traits() {
        let ctx = ctx_with(
            hero(vec![BLAST]).with_traits(vec![Trait::SkillAdd(HEAL), Trait::SkillAdd(BLAST)]),
            1,
        );
        assert_eq!(known_skills(&ctx, CombatantRef::ally(0)), vec![HEAL, BLAST]);
    }
}
