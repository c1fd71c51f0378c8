//! Group: the ordered combatants on one side (party or troop).
//!
//! The group owns its combatants. A member's index in the group is its stable
//! identity for the whole battle; membership only changes through explicit
//! [`Group::add_member`] / [`Group::remove_member`] calls.
//!
//! On the ally side only the first [`BattleConfig::MAX_BATTLE_MEMBERS`]
//! appeared members fight while the group is in battle; the rest are reserves.

use crate::combatant::{Combatant, CombatantRef, Side};
use crate::config::BattleConfig;
use crate::env::RngOracle;
use crate::stats::{PartyAbility, SpParamKind};

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    side: Side,
    members: Vec<Combatant>,
    in_battle: bool,
}

impl Group {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            members: Vec::new(),
            in_battle: false,
        }
    }

    pub fn with_members(side: Side, members: impl IntoIterator<Item = Combatant>) -> Self {
        let mut group = Self::new(side);
        for member in members {
            group.add_member(member);
        }
        group
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn in_battle(&self) -> bool {
        self.in_battle
    }

    pub(crate) fn set_in_battle(&mut self, in_battle: bool) {
        self.in_battle = in_battle;
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Appends a combatant and returns its identity.
    pub fn add_member(&mut self, mut member: Combatant) -> CombatantRef {
        let index = self.members.len();
        member.assign_slot(self.side, index);
        self.members.push(member);
        CombatantRef::new(self.side, index)
    }

    /// Removes a member; later members shift down one index.
    pub fn remove_member(&mut self, index: usize) -> Option<Combatant> {
        if index >= self.members.len() {
            return None;
        }
        let removed = self.members.remove(index);
        for (i, member) in self.members.iter_mut().enumerate().skip(index) {
            member.assign_slot(self.side, i);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Every member, including reserves and hidden ones.
    pub fn all_members(&self) -> &[Combatant] {
        &self.members
    }

    pub fn get(&self, index: usize) -> Option<&Combatant> {
        self.members.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Combatant> {
        self.members.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members().next().is_none()
    }

    /// Whether the member at `index` takes part in the current battle.
    pub fn is_battle_member(&self, index: usize) -> bool {
        let Some(member) = self.members.get(index) else {
            return false;
        };
        match self.side {
            Side::Ally if self.in_battle => {
                index < BattleConfig::MAX_BATTLE_MEMBERS && member.is_appeared()
            }
            _ => true,
        }
    }

    /// Members relevant to battle queries (battle members for an in-battle party).
    pub fn members(&self) -> impl Iterator<Item = &Combatant> {
        self.members
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_battle_member(*i))
            .map(|(_, m)| m)
    }

    pub fn member_refs(&self) -> Vec<CombatantRef> {
        self.members().map(Combatant::id).collect()
    }

    pub fn alive_members(&self) -> impl Iterator<Item = &Combatant> {
        self.members().filter(|m| m.is_alive())
    }

    pub fn dead_members(&self) -> impl Iterator<Item = &Combatant> {
        self.members().filter(|m| m.is_dead())
    }

    pub fn movable_members(&self) -> impl Iterator<Item = &Combatant> {
        self.members().filter(|m| m.can_move())
    }

    pub fn alive_refs(&self) -> Vec<CombatantRef> {
        self.alive_members().map(Combatant::id).collect()
    }

    pub fn dead_refs(&self) -> Vec<CombatantRef> {
        self.dead_members().map(Combatant::id).collect()
    }

    // ========================================================================
    // Aggregate queries
    // ========================================================================

    /// No alive members. An empty party outside battle does not count as wiped.
    pub fn is_wiped(&self) -> bool {
        let none_alive = self.alive_members().next().is_none();
        match self.side {
            Side::Ally if none_alive => self.in_battle || !self.is_empty(),
            _ => none_alive,
        }
    }

    /// Mean agility of members, or 1 for an empty group.
    pub fn average_agility(&self) -> f64 {
        let (count, sum) = self
            .members()
            .fold((0u32, 0i64), |(n, s), m| (n + 1, s + i64::from(m.agi())));
        if count == 0 {
            1.0
        } else {
            sum as f64 / f64::from(count)
        }
    }

    /// Sum of target rates over alive members.
    pub fn tgr_sum(&self) -> f64 {
        self.alive_members()
            .map(|m| m.sp_param(SpParamKind::TargetRate))
            .sum()
    }

    /// Alive member picked with probability proportional to its target rate.
    pub fn random_target(&self, rng: &mut dyn RngOracle) -> Option<CombatantRef> {
        let mut remaining = rng.random() * self.tgr_sum();
        let mut last = None;
        for member in self.alive_members() {
            remaining -= member.sp_param(SpParamKind::TargetRate);
            if remaining <= 0.0 {
                return Some(member.id());
            }
            last = Some(member.id());
        }
        last
    }

    /// Uniformly chosen dead member.
    pub fn random_dead_target(&self, rng: &mut dyn RngOracle) -> Option<CombatantRef> {
        let dead = self.dead_refs();
        if dead.is_empty() {
            return None;
        }
        let pick = rng.random_int(dead.len() as u32) as usize;
        dead.get(pick).copied()
    }

    /// The member at `index` if alive, else the first alive member.
    pub fn smooth_target(&self, index: Option<usize>) -> Option<CombatantRef> {
        let index = index.unwrap_or(0);
        match self.members.get(index) {
            Some(m) if self.is_battle_member(index) && m.is_alive() => Some(m.id()),
            _ => self.alive_members().next().map(Combatant::id),
        }
    }

    /// The member at `index` if dead, else the first dead member.
    pub fn smooth_dead_target(&self, index: Option<usize>) -> Option<CombatantRef> {
        let index = index.unwrap_or(0);
        match self.members.get(index) {
            Some(m) if self.is_battle_member(index) && m.is_dead() => Some(m.id()),
            _ => self.dead_members().next().map(Combatant::id),
        }
    }

    /// First member able to cover for a dying ally.
    pub fn substitute_battler(&self) -> Option<CombatantRef> {
        self.members()
            .find(|m| m.is_substitute())
            .map(Combatant::id)
    }

    pub fn party_ability(&self, ability: PartyAbility) -> bool {
        self.members().any(|m| m.party_ability(ability))
    }

    pub fn highest_level(&self) -> u32 {
        self.members().filter_map(Combatant::level).max().unwrap_or(0)
    }

    /// Distinct names of alive members, in order.
    pub fn alive_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for member in self.alive_members() {
            let name = member.name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Gives repeated enemy templates letter suffixes ("Slime A", "Slime B").
    pub fn make_unique_names(&mut self) {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for member in &mut self.members {
            if !member.is_alive() {
                continue;
            }
            let Some(profile) = member.enemy_profile_mut() else {
                continue;
            };
            if !profile.letter.is_empty() {
                continue;
            }
            let name = profile.original_name.clone();
            let slot = match counts.iter().position(|(n, _)| *n == name) {
                Some(pos) => pos,
                None => {
                    counts.push((name, 0));
                    counts.len() - 1
                }
            };
            let n = counts[slot].1;
            profile.letter = char::from(LETTERS[n % LETTERS.len()]).to_string();
            counts[slot].1 = n + 1;
        }
        // a template that appears once keeps its plain name
        for member in &mut self.members {
            let Some(profile) = member.enemy_profile_mut() else {
                continue;
            };
            let single = counts
                .iter()
                .any(|(n, c)| *n == profile.original_name && *c == 1);
            if single {
                profile.letter.clear();
            }
        }
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    pub fn clear_actions(&mut self) {
        for i in 0..self.members.len() {
            if self.is_battle_member(i) {
                self.members[i].clear_actions();
            }
        }
    }

    pub fn remove_battle_states(&mut self) {
        for member in &mut self.members {
            member.remove_battle_states();
        }
    }

    pub fn clear_results(&mut self) {
        for member in &mut self.members {
            member.clear_result();
        }
    }

    pub fn on_battle_start(&mut self, config: &BattleConfig, rng: &mut dyn RngOracle) {
        self.set_in_battle(true);
        for i in 0..self.members.len() {
            if self.is_battle_member(i) {
                self.members[i].on_battle_start(config, rng);
            }
        }
    }

    pub fn on_battle_end(&mut self) {
        for i in 0..self.members.len() {
            if self.is_battle_member(i) {
                self.members[i].on_battle_end();
            }
        }
        self.set_in_battle(false);
    }

    /// Dead battle members come back with 1 HP.
    pub fn revive_battle_members(&mut self) {
        for i in 0..self.members.len() {
            if self.is_battle_member(i) && self.members[i].is_dead() {
                self.members[i].set_hp(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{EnemyDefinition, SequenceRng};
    use crate::stats::{BaseParams, Trait};

    fn member(name: &str, agi: i32) -> Combatant {
        Combatant::new(name, Side::Ally, BaseParams::new([100, 10, 10, 10, 10, 10, agi, 10]))
    }

    fn party(n: usize) -> Group {
        Group::with_members(Side::Ally, (0..n).map(|i| member(&format!("A{i}"), 10)))
    }

    #[test]
    fn indices_are_stable_and_reassigned_on_removal() {
        let mut group = party(3);
        assert_eq!(group.get(2).map(Combatant::id), Some(CombatantRef::ally(2)));
        group.remove_member(0);
        assert_eq!(group.get(1).map(Combatant::id), Some(CombatantRef::ally(1)));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn only_four_battle_members_in_battle() {
        let mut group = party(6);
        assert_eq!(group.members().count(), 6);
        group.set_in_battle(true);
        assert_eq!(group.members().count(), 4);
        assert!(!group.is_battle_member(4));
    }

    #[test]
    fn battle_hooks_toggle_the_member_filter() {
        let mut group = party(6);
        let mut rng = SequenceRng::constant(0.5);
        group.on_battle_start(&BattleConfig::default(), &mut rng);
        assert!(group.in_battle());
        assert_eq!(group.members().count(), 4);

        group.on_battle_end();
        assert!(!group.in_battle());
        assert_eq!(group.members().count(), 6);
    }

    #[test]
    fn average_agility_defaults_to_one() {
        let empty = Group::new(Side::Enemy);
        assert_eq!(empty.average_agility(), 1.0);
        let group = Group::with_members(Side::Ally, [member("a", 10), member("b", 21)]);
        assert_eq!(group.average_agility(), 15.5);
    }

    #[test]
    fn weighted_target_walks_cumulative_rates() {
        let heavy = member("Tank", 10).with_traits(vec![Trait::SpParam {
            param: SpParamKind::TargetRate,
            rate: 3.0,
        }]);
        let group = Group::with_members(Side::Ally, [member("Mage", 10), heavy]);
        // sum 4.0: 0.2 * 4 = 0.8 lands on the first, 0.5 * 4 = 2.0 on the second
        let mut rng = SequenceRng::new(vec![0.2, 0.5]);
        assert_eq!(group.random_target(&mut rng), Some(CombatantRef::ally(0)));
        assert_eq!(group.random_target(&mut rng), Some(CombatantRef::ally(1)));
        let empty = Group::new(Side::Enemy);
        assert_eq!(empty.random_target(&mut rng), None);
    }

    #[test]
    fn smooth_target_falls_back_to_first_alive() {
        let mut group = party(3);
        if let Some(m) = group.get_mut(1) {
            m.set_hp(0);
        }
        assert_eq!(group.smooth_target(Some(1)), Some(CombatantRef::ally(0)));
        assert_eq!(group.smooth_target(Some(2)), Some(CombatantRef::ally(2)));
        assert_eq!(group.smooth_target(Some(9)), Some(CombatantRef::ally(0)));
        assert_eq!(group.smooth_dead_target(Some(0)), Some(CombatantRef::ally(1)));
    }

    #[test]
    fn party_wipe_rules() {
        let mut group = party(1);
        assert!(!group.is_wiped());
        if let Some(m) = group.get_mut(0) {
            m.set_hp(0);
        }
        assert!(group.is_wiped());

        let mut empty = Group::new(Side::Ally);
        assert!(!empty.is_wiped());
        empty.set_in_battle(true);
        assert!(empty.is_wiped());
    }

    #[test]
    fn unique_names_get_letters() {
        let slime = EnemyDefinition {
            name: "Slime".into(),
            params: BaseParams::new([30, 0, 5, 5, 5, 5, 5, 5]),
            ..EnemyDefinition::default()
        };
        let bat = EnemyDefinition {
            name: "Bat".into(),
            ..slime.clone()
        };
        let mut troop = Group::with_members(
            Side::Enemy,
            [
                Combatant::from_enemy(&slime, false),
                Combatant::from_enemy(&bat, false),
                Combatant::from_enemy(&slime, false),
            ],
        );
        troop.make_unique_names();
        let names: Vec<String> = troop.all_members().iter().map(Combatant::name).collect();
        assert_eq!(names, vec!["Slime A", "Bat", "Slime B"]);
    }

    #[test]
    fn revive_restores_one_hp() {
        let mut group = party(2);
        group.set_in_battle(true);
        if let Some(m) = group.get_mut(1) {
            m.set_hp(0);
        }
        group.revive_battle_members();
        assert_eq!(group.get(1).map(Combatant::hp), Some(1));
    }
}
