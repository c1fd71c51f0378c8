//! Action queue, usage costs, and battle lifecycle hooks.

use crate::action::Action;
use crate::config::BattleConfig;
use crate::env::{AutoRemoval, RngOracle, SkillDefinition, UsableDefinition, UsableRef};

use super::Combatant;

// ============================================================================
// Action queue
// ============================================================================

impl Combatant {
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn action_mut(&mut self, index: usize) -> Option<&mut Action> {
        self.actions.get_mut(index)
    }

    pub fn current_action(&self) -> Option<&Action> {
        self.actions.first()
    }

    /// Pops the head of the queue.
    pub fn remove_current_action(&mut self) -> Option<Action> {
        if self.actions.is_empty() {
            None
        } else {
            Some(self.actions.remove(0))
        }
    }

    pub fn set_action(&mut self, index: usize, action: Action) {
        if let Some(slot) = self.actions.get_mut(index) {
            *slot = action;
        }
    }

    pub fn push_action(&mut self, action: Action) {
        if self.actions.try_push(action).is_err() {
            tracing::warn!(combatant = %self.id, "action queue full, dropping extra action");
        }
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
        self.action_input_index = 0;
    }

    /// One action plus one more for every successful action-times roll.
    pub fn make_action_times(&self, rng: &mut dyn RngOracle) -> usize {
        1 + self
            .action_plus_set()
            .into_iter()
            .filter(|p| rng.random() < *p)
            .count()
    }

    /// Fills the queue with empty action slots. Immobile combatants get none.
    pub fn make_actions(&mut self, rng: &mut dyn RngOracle) {
        self.clear_actions();
        if !self.can_move() {
            return;
        }
        let times = self.make_action_times(rng);
        for _ in 0..times {
            self.push_action(Action::new(self.id));
        }
    }

    /// Replaces the queue with a single forced action.
    pub fn force_action(&mut self, usable: UsableRef, target_index: Option<usize>) {
        self.clear_actions();
        let mut action = Action::forced(self.id);
        action.set_usable(usable);
        action.set_target(target_index);
        self.push_action(action);
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub(crate) fn set_speed(&mut self, speed: i32) {
        self.speed = speed;
    }

    // ------------------------------------------------------------------------
    // Command input cursor
    // ------------------------------------------------------------------------

    pub fn action_input_index(&self) -> usize {
        self.action_input_index
    }

    pub fn inputting_action(&self) -> Option<&Action> {
        self.actions.get(self.action_input_index)
    }

    pub fn inputting_action_mut(&mut self) -> Option<&mut Action> {
        self.actions.get_mut(self.action_input_index)
    }

    /// Advances to the next action slot; false when already on the last one.
    pub fn select_next_command(&mut self) -> bool {
        if self.action_input_index + 1 < self.actions.len() {
            self.action_input_index += 1;
            true
        } else {
            false
        }
    }

    pub fn select_previous_command(&mut self) -> bool {
        if self.action_input_index > 0 {
            self.action_input_index -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset_input_cursor(&mut self, last: bool) {
        self.action_input_index = if last {
            self.actions.len().saturating_sub(1)
        } else {
            0
        };
    }
}

// ============================================================================
// Usage costs and conditions
// ============================================================================

impl Combatant {
    pub fn skill_mp_cost(&self, skill: &SkillDefinition) -> i32 {
        let rate = self.sp_param(crate::stats::SpParamKind::MpCostRate);
        (f64::from(skill.mp_cost) * rate).floor() as i32
    }

    pub fn skill_tp_cost(&self, skill: &SkillDefinition) -> i32 {
        skill.tp_cost
    }

    pub fn can_pay_skill_cost(&self, skill: &SkillDefinition) -> bool {
        self.tp >= self.skill_tp_cost(skill) && self.mp >= self.skill_mp_cost(skill)
    }

    pub fn pay_skill_cost(&mut self, skill: &SkillDefinition) {
        let mp = self.mp - self.skill_mp_cost(skill);
        let tp = self.tp - self.skill_tp_cost(skill);
        self.mp = mp;
        self.tp = tp;
        self.refresh();
    }

    /// Movable and the usable is allowed in battle.
    pub fn meets_usable_conditions(&self, usable: &UsableDefinition) -> bool {
        self.can_move() && usable.occasion.allows_battle()
    }

    pub fn meets_skill_conditions(&self, skill: &SkillDefinition) -> bool {
        self.meets_usable_conditions(&skill.usable)
            && self.can_pay_skill_cost(skill)
            && !self.is_skill_sealed(skill.id)
            && !skill
                .skill_type
                .is_some_and(|stype| self.is_skill_type_sealed(stype))
    }
}

// ============================================================================
// Battle hooks
// ============================================================================

impl Combatant {
    pub fn on_battle_start(&mut self, config: &BattleConfig, rng: &mut dyn RngOracle) {
        if !self.is_preserve_tp() {
            self.init_tp(config, rng);
        }
    }

    /// Runs once the combatant has no queued actions left this turn.
    pub fn on_all_actions_end(&mut self) {
        self.clear_result();
        self.remove_states_auto(AutoRemoval::ActionEnd);
        self.remove_buffs_auto();
    }

    /// Regeneration, duration countdown (skipped on forced turns), and
    /// turn-end auto-removal.
    pub fn on_turn_end(&mut self, forced: bool, config: &BattleConfig) {
        self.clear_result();
        self.regenerate_all(config);
        if !forced {
            self.update_state_turns();
            self.update_buff_turns();
        }
        self.remove_states_auto(AutoRemoval::TurnEnd);
    }

    pub fn on_battle_end(&mut self) {
        self.clear_result();
        self.remove_battle_states();
        self.remove_all_buffs();
        self.clear_actions();
        if !self.is_preserve_tp() {
            self.clear_tp();
        }
        self.appear();
    }

    /// Leaves the battle: hidden, no actions, no states.
    pub fn escape(&mut self) {
        self.hide();
        self.clear_actions();
        self.clear_states();
    }

    pub fn gain_exp(&mut self, exp: u64) {
        let rate = self.sp_param(crate::stats::SpParamKind::ExperienceRate);
        if let Some(profile) = self.ally_profile_mut() {
            let gained = (exp as f64 * rate).round().max(0.0) as u64;
            profile.exp = profile.exp.saturating_add(gained);
        }
    }
}
