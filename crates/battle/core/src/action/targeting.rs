//! Target resolution by scope.
//!
//! The target list is built once per invocation and already contains every
//! repeat, so replaying it hit by hit always strikes the same combatants.

use crate::combatant::CombatantRef;
use crate::context::BattleContext;
use crate::env::{BattleEnv, Restriction, Scope};
use crate::group::Group;

use super::Action;

impl Action {
    /// Resolves the ordered target list, each target repeated
    /// [`Action::num_repeats`] times.
    pub fn make_targets(&self, ctx: &BattleContext, env: &mut BattleEnv<'_>) -> Vec<CombatantRef> {
        let Some(def) = self.definition(env.data()) else {
            return Vec::new();
        };
        let confused = !self.forced
            && ctx
                .combatant(self.subject)
                .is_some_and(|subject| subject.is_confused());

        let targets: Vec<CombatantRef> = if confused {
            self.confusion_target(ctx, env).into_iter().collect()
        } else if def.scope.is_for_opponent() {
            self.targets_for_opponents(def.scope, ctx, env)
        } else if def.scope.is_for_friend() {
            self.targets_for_friends(def.scope, ctx, env)
        } else {
            Vec::new()
        };

        let repeats = self.num_repeats(ctx, env.data());
        let repeated: Vec<CombatantRef> = targets
            .into_iter()
            .flat_map(|target| std::iter::repeat_n(target, repeats))
            .collect();
        tracing::debug!(subject = %self.subject, targets = repeated.len(), "resolved targets");
        repeated
    }

    /// Random victim of a confused subject, chosen by its restriction.
    fn confusion_target(
        &self,
        ctx: &BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> Option<CombatantRef> {
        let restriction = ctx
            .combatant(self.subject)
            .map(|subject| subject.restriction())
            .unwrap_or_default();
        let opponents = ctx.opponents_of(self.subject);
        let friends = ctx.friends_of(self.subject);
        match restriction {
            Restriction::AttackEnemy => opponents.random_target(env.rng()),
            Restriction::AttackAnyone => {
                if env.random_int(2) == 0 {
                    opponents.random_target(env.rng())
                } else {
                    friends.random_target(env.rng())
                }
            }
            _ => friends.random_target(env.rng()),
        }
    }

    fn targets_for_opponents(
        &self,
        scope: Scope,
        ctx: &BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> Vec<CombatantRef> {
        let unit = ctx.opponents_of(self.subject);
        if scope.is_for_random() {
            (0..scope.random_count())
                .filter_map(|_| unit.random_target(env.rng()))
                .collect()
        } else if scope.is_for_one() {
            self.single_alive_target(unit, env).into_iter().collect()
        } else {
            unit.alive_refs()
        }
    }

    fn targets_for_friends(
        &self,
        scope: Scope,
        ctx: &BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> Vec<CombatantRef> {
        let unit = ctx.friends_of(self.subject);
        if scope.is_for_user() {
            vec![self.subject]
        } else if scope.is_for_dead_friend() {
            if scope.is_for_one() {
                unit.smooth_dead_target(self.target_index)
                    .into_iter()
                    .collect()
            } else {
                unit.dead_refs()
            }
        } else if scope.is_for_one() {
            self.single_alive_target(unit, env).into_iter().collect()
        } else {
            unit.alive_refs()
        }
    }

    /// Explicit index (smoothed onto a living member) or a weighted random draw.
    fn single_alive_target(&self, unit: &Group, env: &mut BattleEnv<'_>) -> Option<CombatantRef> {
        match self.target_index {
            Some(index) => unit.smooth_target(Some(index)),
            None => unit.random_target(env.rng()),
        }
    }

    /// Picks a random target index for input-less subjects, or clears the
    /// action when the scope has nobody to pick from.
    pub fn decide_random_target(&mut self, ctx: &BattleContext, env: &mut BattleEnv<'_>) {
        let Some(scope) = self.definition(env.data()).map(|def| def.scope) else {
            return;
        };
        let target = if scope.is_for_dead_friend() {
            ctx.friends_of(self.subject).random_dead_target(env.rng())
        } else if scope.is_for_friend() {
            ctx.friends_of(self.subject).random_target(env.rng())
        } else {
            ctx.opponents_of(self.subject).random_target(env.rng())
        };
        match target {
            Some(target) => self.target_index = Some(target.index),
            None => self.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Combatant, Side};
    use crate::config::BattleConfig;
    use crate::env::{DataSnapshot, SequenceRng, SkillDefinition, UsableDefinition};
    use crate::group::Group;
    use crate::ids::SkillId;
    use crate::stats::{BaseParams, Trait};

    fn unit(name: &str, side: Side) -> Combatant {
        Combatant::new(name, side, BaseParams::new([100, 20, 20, 10, 10, 10, 10, 10]))
    }

    fn battle() -> BattleContext {
        let mut ctx = BattleContext::with_party([unit("Hero", Side::Ally), unit("Mage", Side::Ally)]);
        ctx.troop = Group::with_members(
            Side::Enemy,
            [unit("Bat", Side::Enemy), unit("Rat", Side::Enemy), unit("Orc", Side::Enemy)],
        );
        ctx
    }

    fn skill(id: u32, scope: Scope) -> SkillDefinition {
        SkillDefinition {
            id: SkillId(id),
            usable: UsableDefinition {
                scope,
                ..UsableDefinition::default()
            },
            ..SkillDefinition::default()
        }
    }

    fn data() -> DataSnapshot {
        DataSnapshot::standard()
            .with_skill(skill(10, Scope::AllOpponents))
            .with_skill(skill(11, Scope::RandomOpponents(3)))
            .with_skill(skill(12, Scope::OneDeadFriend))
            .with_skill(skill(13, Scope::AllFriends))
    }

    #[test]
    fn explicit_index_is_smoothed_to_a_living_target() {
        let data = data();
        let config = BattleConfig::default();
        let mut rng = SequenceRng::constant(0.0);
        let mut ctx = battle();
        if let Some(bat) = ctx.combatant_mut(CombatantRef::enemy(0)) {
            bat.set_hp(0);
        }
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut attack = Action::attack(CombatantRef::ally(0));
        attack.set_target(Some(0));
        assert_eq!(attack.make_targets(&ctx, &mut env), vec![CombatantRef::enemy(1)]);
        attack.set_target(Some(2));
        assert_eq!(attack.make_targets(&ctx, &mut env), vec![CombatantRef::enemy(2)]);
    }

    #[test]
    fn all_scope_lists_living_members_in_order() {
        let data = data();
        let config = BattleConfig::default();
        let mut rng = SequenceRng::constant(0.0);
        let mut ctx = battle();
        if let Some(rat) = ctx.combatant_mut(CombatantRef::enemy(1)) {
            rat.set_hp(0);
        }
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut action = Action::new(CombatantRef::ally(0));
        action.set_skill(SkillId(10));
        assert_eq!(
            action.make_targets(&ctx, &mut env),
            vec![CombatantRef::enemy(0), CombatantRef::enemy(2)]
        );
    }

    #[test]
    fn random_scope_draws_weighted_targets() {
        let data = data();
        let config = BattleConfig::default();
        // tgr sum 3.0: 0.1 -> first, 0.5 -> second, 0.9 -> third
        let mut rng = SequenceRng::new(vec![0.1, 0.5, 0.9]);
        let ctx = battle();
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut action = Action::new(CombatantRef::ally(0));
        action.set_skill(SkillId(11));
        assert_eq!(
            action.make_targets(&ctx, &mut env),
            vec![CombatantRef::enemy(0), CombatantRef::enemy(1), CombatantRef::enemy(2)]
        );
    }

    #[test]
    fn repeats_replay_the_same_target() {
        let data = data();
        let config = BattleConfig::default();
        let mut rng = SequenceRng::constant(0.0);
        let mut ctx = battle();
        ctx.party = Group::with_members(
            Side::Ally,
            [unit("Twin", Side::Ally).with_traits(vec![Trait::AttackTimes(2.0)])],
        );
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut attack = Action::attack(CombatantRef::ally(0));
        attack.set_target(Some(1));
        assert_eq!(attack.make_targets(&ctx, &mut env), vec![CombatantRef::enemy(1); 3]);
    }

    #[test]
    fn dead_friend_scope_without_dead_members_is_empty() {
        let data = data();
        let config = BattleConfig::default();
        let mut rng = SequenceRng::constant(0.0);
        let mut ctx = battle();
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut revive = Action::new(CombatantRef::ally(0));
        revive.set_skill(SkillId(12));
        assert!(revive.make_targets(&ctx, &mut env).is_empty());

        if let Some(mage) = ctx.combatant_mut(CombatantRef::ally(1)) {
            mage.set_hp(0);
        }
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        assert_eq!(revive.make_targets(&ctx, &mut env), vec![CombatantRef::ally(1)]);
    }

    #[test]
    fn random_target_decision_clears_when_nobody_fits() {
        let data = data();
        let config = BattleConfig::default();
        let mut rng = SequenceRng::constant(0.0);
        let ctx = battle();
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut revive = Action::new(CombatantRef::ally(0));
        revive.set_skill(SkillId(12));
        revive.decide_random_target(&ctx, &mut env);
        assert_eq!(revive.usable(), None);

        let mut heal_all = Action::new(CombatantRef::ally(0));
        heal_all.set_skill(SkillId(13));
        heal_all.decide_random_target(&ctx, &mut env);
        assert_eq!(heal_all.target_index(), Some(0));
    }
}
