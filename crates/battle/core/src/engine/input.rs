//! Input phase: action making for both sides and command-input helpers.

use crate::action::Action;
use crate::action::evaluate::make_auto_battle_actions;
use crate::combatant::{Combatant, CombatantRef};
use crate::config::BattleConfig;
use crate::context::BattleContext;
use crate::env::{ActionCondition, ActionPattern, BattleEnv, BattleEvent, RngOracle, UsableRef};
use crate::ids::SkillId;

use super::{BattleOrchestrator, BattlePhase, CommandError};

// ============================================================================
// Enemy action selection
// ============================================================================

/// Whether an enemy action pattern's condition holds for `combatant`.
///
/// Turn conditions read the context's turn count: `b == 0` matches turn `a`
/// only, otherwise every turn `a + b·x` from turn 1 on.
pub fn meets_condition(
    combatant: &Combatant,
    condition: &ActionCondition,
    ctx: &BattleContext,
) -> bool {
    match *condition {
        ActionCondition::Always => true,
        ActionCondition::Turn { a, b } => {
            let n = ctx.turn_count();
            if b == 0 {
                n == a
            } else {
                n > 0 && n >= a && n % b == a % b
            }
        }
        ActionCondition::HpRate { min, max } => (min..=max).contains(&combatant.hp_rate()),
        ActionCondition::MpRate { min, max } => (min..=max).contains(&combatant.mp_rate()),
        ActionCondition::State(state) => combatant.is_state_affected(state),
        ActionCondition::PartyLevel(level) => ctx.party.highest_level() >= level,
        ActionCondition::Switch(id) => ctx.switch(id),
    }
}

/// Rated-pool draw over `patterns`.
///
/// Only patterns rated above `rating_zero` take part, each weighted by
/// `rating - rating_zero`. Returns `None` when no pattern qualifies.
pub fn select_enemy_action(
    patterns: &[ActionPattern],
    rating_zero: i32,
    rng: &mut dyn RngOracle,
) -> Option<SkillId> {
    let weight = |pattern: &ActionPattern| pattern.rating - rating_zero;
    let sum: i32 = patterns.iter().map(weight).filter(|w| *w > 0).sum();
    if sum <= 0 {
        return None;
    }
    let mut value = i64::from(rng.random_int(sum as u32));
    for pattern in patterns {
        let w = weight(pattern);
        if w <= 0 {
            continue;
        }
        value -= i64::from(w);
        if value < 0 {
            return Some(pattern.skill);
        }
    }
    None
}

impl BattleOrchestrator {
    // ========================================================================
    // Input phase
    // ========================================================================

    /// Makes every battle member's actions and enters the input phase.
    ///
    /// Skips straight to the turn when surprised or when no ally can input.
    pub(crate) fn start_input(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        self.set_phase(BattlePhase::Input);
        self.notify(BattleEvent::InputStart);
        self.make_party_actions(ctx, env);
        self.make_troop_actions(ctx, env);
        self.actor_index = None;
        if self.surprise || !ctx.party_can_input() {
            self.start_turn(ctx, env);
        }
    }

    fn make_party_actions(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        for member in ctx.party.member_refs() {
            let Some(combatant) = ctx.combatant_mut(member) else {
                continue;
            };
            combatant.make_actions(env.rng());
            if combatant.actions().is_empty() {
                continue;
            }
            if combatant.is_auto_battle() {
                make_auto_battle_actions(member, ctx, env);
            } else if combatant.is_confused() {
                for slot in 0..combatant.actions().len() {
                    combatant.set_action(slot, Action::attack(member));
                }
            }
        }
    }

    fn make_troop_actions(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        let data = env.data();
        for member in ctx.troop.member_refs() {
            let Some(combatant) = ctx.combatant_mut(member) else {
                continue;
            };
            combatant.make_actions(env.rng());
            let slots = combatant.actions().len();
            if slots == 0 {
                continue;
            }

            let Some(combatant) = ctx.combatant(member) else {
                continue;
            };
            let valid: Vec<ActionPattern> = combatant
                .enemy_profile()
                .map(|profile| profile.patterns.as_slice())
                .unwrap_or_default()
                .iter()
                .filter(|pattern| {
                    meets_condition(combatant, &pattern.condition, ctx)
                        && ctx.can_use(member, Some(UsableRef::Skill(pattern.skill)), data)
                })
                .cloned()
                .collect();
            let Some(max_rating) = valid.iter().map(|pattern| pattern.rating).max() else {
                continue;
            };
            let rating_zero = max_rating - BattleConfig::ENEMY_RATING_WINDOW;

            let choices: Vec<Option<SkillId>> = (0..slots)
                .map(|_| select_enemy_action(&valid, rating_zero, env.rng()))
                .collect();
            if let Some(combatant) = ctx.combatant_mut(member) {
                for (slot, skill) in choices.into_iter().enumerate() {
                    if let Some(action) = combatant.action_mut(slot) {
                        action.set_enemy_action(skill);
                    }
                }
            }
            tracing::trace!(enemy = %member, patterns = valid.len(), rating_zero, "enemy actions made");
        }
    }

    // ========================================================================
    // Command input
    // ========================================================================

    /// Ally currently choosing commands, if any.
    pub fn current_actor(&self, ctx: &BattleContext) -> Option<CombatantRef> {
        let index = self.actor_index?;
        ctx.party.member_refs().get(index).copied()
    }

    /// Jumps command input to the `index`-th party battle member.
    pub fn change_actor(&mut self, index: usize, ctx: &BattleContext) -> Result<(), CommandError> {
        if !self.is_inputting() {
            return Err(CommandError::NotInputting { phase: self.phase });
        }
        let len = ctx.party.member_refs().len();
        if index >= len {
            return Err(CommandError::ActorOutOfRange { index, len });
        }
        self.actor_index = Some(index);
        Ok(())
    }

    pub fn clear_actor(&mut self) {
        self.actor_index = None;
    }

    /// Slot being edited by the current actor.
    pub fn inputting_action_mut<'c>(
        &self,
        ctx: &'c mut BattleContext,
    ) -> Option<&'c mut Action> {
        let actor = self.current_actor(ctx)?;
        ctx.combatant_mut(actor)?.inputting_action_mut()
    }

    /// Advances to the current actor's next slot, else to the next actor who
    /// can input. Past the last actor the turn starts.
    pub fn select_next_command(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        if !self.is_inputting() {
            return;
        }
        if let Some(actor) = self.current_actor(ctx)
            && let Some(combatant) = ctx.combatant_mut(actor)
            && combatant.select_next_command()
        {
            return;
        }
        if self.change_actor_step(ctx, true) {
            if let Some(actor) = self.current_actor(ctx)
                && let Some(combatant) = ctx.combatant_mut(actor)
            {
                combatant.reset_input_cursor(false);
            }
        } else {
            self.start_turn(ctx, env);
        }
    }

    /// Steps back one slot, else to the previous actor who can input (on
    /// their last slot). Before the first actor, no actor is selected.
    pub fn select_previous_command(&mut self, ctx: &mut BattleContext) {
        if !self.is_inputting() {
            return;
        }
        if let Some(actor) = self.current_actor(ctx)
            && let Some(combatant) = ctx.combatant_mut(actor)
            && combatant.select_previous_command()
        {
            return;
        }
        if self.change_actor_step(ctx, false)
            && let Some(actor) = self.current_actor(ctx)
            && let Some(combatant) = ctx.combatant_mut(actor)
        {
            combatant.reset_input_cursor(true);
        }
    }

    /// Moves `actor_index` to the next (or previous) battle member who can
    /// input. Returns false and clears the actor when none remains.
    fn change_actor_step(&mut self, ctx: &BattleContext, forward: bool) -> bool {
        let members = ctx.party.member_refs();
        let mut index = self.actor_index;
        loop {
            let next = match (index, forward) {
                (None, true) => Some(0),
                (None, false) => members.len().checked_sub(1),
                (Some(i), true) => Some(i + 1),
                (Some(i), false) => i.checked_sub(1),
            };
            let Some(candidate) = next.filter(|i| *i < members.len()) else {
                self.actor_index = None;
                return false;
            };
            index = Some(candidate);
            if ctx
                .combatant(members[candidate])
                .is_some_and(Combatant::can_input)
            {
                self.actor_index = index;
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Side;
    use crate::env::SequenceRng;
    use crate::stats::BaseParams;

    fn pattern(skill: u32, rating: i32) -> ActionPattern {
        ActionPattern {
            skill: SkillId(skill),
            rating,
            condition: ActionCondition::Always,
        }
    }

    #[test]
    fn rated_pool_drops_low_ratings() {
        // max 5 → zero 2; weights: 5→3, 2→0, 4→2; sum 5
        let patterns = [pattern(1, 5), pattern(2, 2), pattern(3, 4)];
        let mut rng = SequenceRng::constant(0.0);
        assert_eq!(select_enemy_action(&patterns, 2, &mut rng), Some(SkillId(1)));
        // 0.7 * 5 = 3.5 → 3; 3 - 3 = 0, 0 - 2 < 0
        let mut rng = SequenceRng::constant(0.7);
        assert_eq!(select_enemy_action(&patterns, 2, &mut rng), Some(SkillId(3)));
    }

    #[test]
    fn rated_pool_empty_when_nothing_qualifies() {
        let mut rng = SequenceRng::constant(0.5);
        assert_eq!(select_enemy_action(&[pattern(1, 3)], 3, &mut rng), None);
        assert_eq!(select_enemy_action(&[], 0, &mut rng), None);
    }

    #[test]
    fn turn_condition() {
        let mut ctx = BattleContext::default();
        let enemy = Combatant::new("Slime", Side::Enemy, BaseParams::new([10; 8]));
        let every_other = ActionCondition::Turn { a: 1, b: 2 };
        let only_two = ActionCondition::Turn { a: 2, b: 0 };

        assert!(!meets_condition(&enemy, &every_other, &ctx));
        ctx.increase_turn();
        assert!(meets_condition(&enemy, &every_other, &ctx));
        assert!(!meets_condition(&enemy, &only_two, &ctx));
        ctx.increase_turn();
        assert!(!meets_condition(&enemy, &every_other, &ctx));
        assert!(meets_condition(&enemy, &only_two, &ctx));
        ctx.increase_turn();
        assert!(meets_condition(&enemy, &every_other, &ctx));
    }

    #[test]
    fn hp_band_and_switch_conditions() {
        let mut ctx = BattleContext::default();
        let enemy = Combatant::new("Slime", Side::Enemy, BaseParams::new([10; 8])).with_hp(5);
        let low = ActionCondition::HpRate { min: 0.0, max: 0.5 };
        assert!(meets_condition(&enemy, &low, &ctx));
        assert!(!meets_condition(&enemy, &ActionCondition::Switch(3), &ctx));
        ctx.set_switch(3, true);
        assert!(meets_condition(&enemy, &ActionCondition::Switch(3), &ctx));
    }
}
