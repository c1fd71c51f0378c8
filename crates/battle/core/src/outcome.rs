//! Outcome Record: what happened when one action resolved against one target.
//!
//! Each combatant owns one record. It is cleared at the start of every
//! resolution against that combatant, then appended to by the hit roll, the
//! damage step, and every effect handler. Display code reads it afterwards
//! without recomputing anything.

use bitflags::bitflags;

use crate::ids::StateId;
use crate::stats::ParamKind;

bitflags! {
    /// Boolean facts about one resolution.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OutcomeFlags: u16 {
        /// Target was a legal recipient of the action's scope.
        const USED = 1 << 0;
        const MISSED = 1 << 1;
        const EVADED = 1 << 2;
        const PHYSICAL = 1 << 3;
        const DRAIN = 1 << 4;
        const CRITICAL = 1 << 5;
        /// Something observable changed (damage or an effect landed).
        const SUCCESS = 1 << 6;
        const HP_AFFECTED = 1 << 7;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    pub flags: OutcomeFlags,
    pub hp_damage: i32,
    pub mp_damage: i32,
    pub tp_damage: i32,
    pub added_states: Vec<StateId>,
    pub removed_states: Vec<StateId>,
    pub added_buffs: Vec<ParamKind>,
    pub added_debuffs: Vec<ParamKind>,
    pub removed_buffs: Vec<ParamKind>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_used(&self) -> bool {
        self.flags.contains(OutcomeFlags::USED)
    }

    pub fn is_missed(&self) -> bool {
        self.flags.contains(OutcomeFlags::MISSED)
    }

    pub fn is_evaded(&self) -> bool {
        self.flags.contains(OutcomeFlags::EVADED)
    }

    pub fn is_critical(&self) -> bool {
        self.flags.contains(OutcomeFlags::CRITICAL)
    }

    pub fn is_success(&self) -> bool {
        self.flags.contains(OutcomeFlags::SUCCESS)
    }

    pub fn is_drain(&self) -> bool {
        self.flags.contains(OutcomeFlags::DRAIN)
    }

    pub fn is_physical(&self) -> bool {
        self.flags.contains(OutcomeFlags::PHYSICAL)
    }

    pub fn is_hp_affected(&self) -> bool {
        self.flags.contains(OutcomeFlags::HP_AFFECTED)
    }

    /// Used, and neither missed nor evaded.
    pub fn is_hit(&self) -> bool {
        self.is_used() && !self.is_missed() && !self.is_evaded()
    }

    pub fn set(&mut self, flag: OutcomeFlags, value: bool) {
        self.flags.set(flag, value);
    }

    pub fn mark_success(&mut self) {
        self.flags.insert(OutcomeFlags::SUCCESS);
    }

    pub fn is_status_affected(&self) -> bool {
        !(self.added_states.is_empty()
            && self.removed_states.is_empty()
            && self.added_buffs.is_empty()
            && self.added_debuffs.is_empty()
            && self.removed_buffs.is_empty())
    }

    pub fn is_state_added(&self, state: StateId) -> bool {
        self.added_states.contains(&state)
    }

    pub fn is_state_removed(&self, state: StateId) -> bool {
        self.removed_states.contains(&state)
    }

    pub fn push_added_state(&mut self, state: StateId) {
        push_unique(&mut self.added_states, state);
    }

    pub fn push_removed_state(&mut self, state: StateId) {
        push_unique(&mut self.removed_states, state);
    }

    pub fn push_added_buff(&mut self, param: ParamKind) {
        push_unique(&mut self.added_buffs, param);
    }

    pub fn push_added_debuff(&mut self, param: ParamKind) {
        push_unique(&mut self.added_debuffs, param);
    }

    pub fn push_removed_buff(&mut self, param: ParamKind) {
        push_unique(&mut self.removed_buffs, param);
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_requires_used_and_not_missed_or_evaded() {
        let mut outcome = Outcome::new();
        assert!(!outcome.is_hit());
        outcome.set(OutcomeFlags::USED, true);
        assert!(outcome.is_hit());
        outcome.set(OutcomeFlags::EVADED, true);
        assert!(!outcome.is_hit());
    }

    #[test]
    fn pushes_are_idempotent() {
        let mut outcome = Outcome::new();
        outcome.push_added_state(StateId(4));
        outcome.push_added_state(StateId(4));
        outcome.push_added_buff(ParamKind::Attack);
        outcome.push_added_buff(ParamKind::Attack);
        assert_eq!(outcome.added_states, vec![StateId(4)]);
        assert_eq!(outcome.added_buffs, vec![ParamKind::Attack]);
        assert!(outcome.is_status_affected());
    }

    #[test]
    fn clear_resets_everything() {
        let mut outcome = Outcome::new();
        outcome.hp_damage = 30;
        outcome.set(OutcomeFlags::CRITICAL | OutcomeFlags::USED, true);
        outcome.push_removed_state(StateId(3));
        outcome.clear();
        assert_eq!(outcome, Outcome::default());
    }
}
