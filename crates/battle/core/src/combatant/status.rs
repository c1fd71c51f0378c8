//! Active status effects.
//!
//! States are kept sorted by priority (highest first, ties by id) so the most
//! important one is always at the front for display. Each carries its own
//! remaining-turn counter; a counter of zero means expired.

use crate::env::{AutoRemoval, RngOracle, StateDefinition};
use crate::ids::StateId;

use super::Combatant;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveState {
    pub definition: StateDefinition,
    pub turns: u32,
}

impl ActiveState {
    pub fn id(&self) -> StateId {
        self.definition.id
    }

    pub fn is_expired(&self) -> bool {
        self.turns == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateTable {
    entries: Vec<ActiveState>,
}

impl StateTable {
    pub fn contains(&self, id: StateId) -> bool {
        self.entries.iter().any(|s| s.id() == id)
    }

    pub fn get(&self, id: StateId) -> Option<&ActiveState> {
        self.entries.iter().find(|s| s.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveState> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<StateId> {
        self.entries.iter().map(ActiveState::id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a new state with zero turns; callers reset the counter.
    pub fn insert(&mut self, definition: StateDefinition) {
        if self.contains(definition.id) {
            return;
        }
        self.entries.push(ActiveState {
            definition,
            turns: 0,
        });
        self.entries.sort_by(|a, b| {
            b.definition
                .priority
                .cmp(&a.definition.priority)
                .then(a.id().cmp(&b.id()))
        });
    }

    pub fn erase(&mut self, id: StateId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.id() != id);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn set_turns(&mut self, id: StateId, turns: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|s| s.id() == id) {
            entry.turns = turns;
        }
    }

    pub fn decrement_turns(&mut self) {
        for entry in &mut self.entries {
            entry.turns = entry.turns.saturating_sub(1);
        }
    }
}

// ============================================================================
// Combatant state operations
// ============================================================================

impl Combatant {
    pub fn states(&self) -> &StateTable {
        &self.states
    }

    pub fn is_state_affected(&self, id: StateId) -> bool {
        self.states.contains(id)
    }

    pub fn is_death_state_affected(&self) -> bool {
        self.states.contains(StateId::DEATH)
    }

    /// Adds `definition` if the combatant can receive it and records the
    /// addition on the outcome record. Re-adding an active state only
    /// resets its duration.
    pub fn add_state(&mut self, definition: &StateDefinition, rng: &mut dyn RngOracle) {
        if !self.is_state_addable(definition) {
            return;
        }
        if !self.is_state_affected(definition.id) {
            self.add_new_state(definition.clone());
            self.refresh();
        }
        self.reset_state_counts(definition, rng);
        self.result.push_added_state(definition.id);
    }

    pub fn is_state_addable(&self, definition: &StateDefinition) -> bool {
        self.is_alive()
            && !self.is_state_resisted(definition.id)
            && !self.result.is_state_removed(definition.id)
            && !self.is_state_restrict(definition)
    }

    /// A restriction-removable state cannot stick while already restricted.
    fn is_state_restrict(&self, definition: &StateDefinition) -> bool {
        definition.remove_by_restriction && self.is_restricted()
    }

    pub(crate) fn add_new_state(&mut self, definition: StateDefinition) {
        if definition.id == StateId::DEATH {
            self.die();
        }
        let was_restricted = self.is_restricted();
        self.states.insert(definition);
        if !was_restricted && self.is_restricted() {
            self.on_restrict();
        }
    }

    /// Clears queued actions and drops states removed by restriction.
    fn on_restrict(&mut self) {
        self.actions.clear();
        let removable: Vec<StateId> = self
            .states
            .iter()
            .filter(|s| s.definition.remove_by_restriction)
            .map(ActiveState::id)
            .collect();
        for id in removable {
            self.remove_state(id);
        }
    }

    pub fn remove_state(&mut self, id: StateId) {
        if !self.is_state_affected(id) {
            return;
        }
        if id == StateId::DEATH {
            self.revive();
        }
        self.states.erase(id);
        self.refresh();
        self.result.push_removed_state(id);
    }

    pub(crate) fn erase_state(&mut self, id: StateId) {
        self.states.erase(id);
    }

    pub fn clear_states(&mut self) {
        self.states.clear();
    }

    fn reset_state_counts(&mut self, definition: &StateDefinition, rng: &mut dyn RngOracle) {
        let variance = 1 + definition.max_turns.saturating_sub(definition.min_turns);
        let turns = definition.min_turns + rng.random_int(variance);
        self.states.set_turns(definition.id, turns);
    }

    pub fn update_state_turns(&mut self) {
        self.states.decrement_turns();
    }

    /// Removes expired states whose auto-removal timing matches.
    pub fn remove_states_auto(&mut self, timing: AutoRemoval) {
        let expired: Vec<StateId> = self
            .states
            .iter()
            .filter(|s| s.is_expired() && s.definition.auto_removal == timing)
            .map(ActiveState::id)
            .collect();
        for id in expired {
            self.remove_state(id);
        }
    }

    pub fn remove_states_by_damage(&mut self, rng: &mut dyn RngOracle) {
        let candidates: Vec<(StateId, u32)> = self
            .states
            .iter()
            .filter_map(|s| s.definition.remove_by_damage.map(|chance| (s.id(), chance)))
            .collect();
        for (id, chance) in candidates {
            if rng.random_int(100) < chance {
                self.remove_state(id);
            }
        }
    }

    pub fn remove_battle_states(&mut self) {
        let ids: Vec<StateId> = self
            .states
            .iter()
            .filter(|s| s.definition.remove_at_battle_end)
            .map(ActiveState::id)
            .collect();
        for id in ids {
            self.remove_state(id);
        }
    }
}
