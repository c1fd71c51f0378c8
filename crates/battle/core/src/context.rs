//! Caller-owned battle session state.
//!
//! [`BattleContext`] replaces every ambient global the resolution code would
//! otherwise reach for: both groups, game variables and switches, the party
//! inventory and gold, the troop turn counter, and common events reserved by
//! item effects. The orchestrator and actions borrow it explicitly.

use std::collections::{BTreeMap, BTreeSet};

use crate::action::formula::VariableStore;
use crate::combatant::{Combatant, CombatantRef, Side};
use crate::env::{DataOracle, ItemDefinition, ItemKey, UsableRef};
use crate::group::Group;
use crate::ids::{CommonEventId, ItemId};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleContext {
    pub party: Group,
    pub troop: Group,
    variables: BTreeMap<u32, f64>,
    switches: BTreeSet<u32>,
    inventory: BTreeMap<ItemKey, u32>,
    gold: u64,
    turn_count: u32,
    reserved_events: Vec<CommonEventId>,
}

impl Default for BattleContext {
    fn default() -> Self {
        Self::new(Group::new(Side::Ally))
    }
}

impl BattleContext {
    pub fn new(party: Group) -> Self {
        Self {
            party,
            troop: Group::new(Side::Enemy),
            variables: BTreeMap::new(),
            switches: BTreeSet::new(),
            inventory: BTreeMap::new(),
            gold: 0,
            turn_count: 0,
            reserved_events: Vec::new(),
        }
    }

    pub fn with_party(members: impl IntoIterator<Item = Combatant>) -> Self {
        Self::new(Group::with_members(Side::Ally, members))
    }

    // ========================================================================
    // Groups and combatants
    // ========================================================================

    pub fn group(&self, side: Side) -> &Group {
        match side {
            Side::Ally => &self.party,
            Side::Enemy => &self.troop,
        }
    }

    pub fn group_mut(&mut self, side: Side) -> &mut Group {
        match side {
            Side::Ally => &mut self.party,
            Side::Enemy => &mut self.troop,
        }
    }

    /// Group the combatant fights for.
    pub fn friends_of(&self, combatant: CombatantRef) -> &Group {
        self.group(combatant.side)
    }

    /// Group the combatant fights against.
    pub fn opponents_of(&self, combatant: CombatantRef) -> &Group {
        self.group(combatant.side.opponent())
    }

    pub fn combatant(&self, id: CombatantRef) -> Option<&Combatant> {
        self.group(id.side).get(id.index)
    }

    pub fn combatant_mut(&mut self, id: CombatantRef) -> Option<&mut Combatant> {
        self.group_mut(id.side).get_mut(id.index)
    }

    /// Battle members of both sides, party first.
    pub fn battle_members(&self) -> Vec<CombatantRef> {
        let mut refs = self.party.member_refs();
        refs.extend(self.troop.member_refs());
        refs
    }

    /// Whether `subject` may use `usable` right now (costs, seals, stock).
    pub fn can_use(
        &self,
        subject: CombatantRef,
        usable: Option<UsableRef>,
        data: &dyn DataOracle,
    ) -> bool {
        let (Some(combatant), Some(usable)) = (self.combatant(subject), usable) else {
            return false;
        };
        match usable {
            UsableRef::Skill(id) => data
                .skill(id)
                .is_some_and(|skill| combatant.meets_skill_conditions(skill)),
            UsableRef::Item(id) => data.item(id).is_some_and(|item| {
                combatant.meets_usable_conditions(&item.usable) && self.has_item(ItemKey::item(id))
            }),
        }
    }

    /// Whether any ally battle member can choose commands.
    pub fn party_can_input(&self) -> bool {
        self.party.members().any(Combatant::can_input)
    }

    // ========================================================================
    // Inventory and gold
    // ========================================================================

    pub fn item_count(&self, key: ItemKey) -> u32 {
        self.inventory.get(&key).copied().unwrap_or(0)
    }

    pub fn has_item(&self, key: ItemKey) -> bool {
        self.item_count(key) > 0
    }

    pub fn gain_item(&mut self, key: ItemKey, amount: u32) {
        let count = self.inventory.entry(key).or_insert(0);
        *count = count.saturating_add(amount);
    }

    pub fn lose_item(&mut self, key: ItemKey, amount: u32) {
        if let Some(count) = self.inventory.get_mut(&key) {
            *count = count.saturating_sub(amount);
            if *count == 0 {
                self.inventory.remove(&key);
            }
        }
    }

    /// Removes one unit of a consumable item.
    pub fn consume_item(&mut self, item: &ItemDefinition) {
        if item.consumable {
            self.lose_item(ItemKey::item(item.id), 1);
        }
    }

    pub fn inventory(&self) -> impl Iterator<Item = (&ItemKey, &u32)> {
        self.inventory.iter()
    }

    pub fn gold(&self) -> u64 {
        self.gold
    }

    pub fn gain_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    // ========================================================================
    // Variables, switches, events
    // ========================================================================

    pub fn set_variable(&mut self, id: u32, value: f64) {
        self.variables.insert(id, value);
    }

    pub fn switch(&self, id: u32) -> bool {
        self.switches.contains(&id)
    }

    pub fn set_switch(&mut self, id: u32, on: bool) {
        if on {
            self.switches.insert(id);
        } else {
            self.switches.remove(&id);
        }
    }

    /// Turns started in the current battle; 0 during the first input phase.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub(crate) fn increase_turn(&mut self) {
        self.turn_count += 1;
    }

    pub(crate) fn reset_turn_count(&mut self) {
        self.turn_count = 0;
    }

    pub fn reserve_common_event(&mut self, event: CommonEventId) {
        self.reserved_events.push(event);
    }

    /// Hands reserved common events to the caller's event interpreter.
    pub fn take_reserved_events(&mut self) -> Vec<CommonEventId> {
        std::mem::take(&mut self.reserved_events)
    }

    /// Convenience for stocking a plain item.
    pub fn stock_item(&mut self, id: ItemId, amount: u32) {
        self.gain_item(ItemKey::item(id), amount);
    }
}

impl VariableStore for BattleContext {
    fn variable(&self, id: u32) -> f64 {
        self.variables.get(&id).copied().unwrap_or(0.0)
    }
}
