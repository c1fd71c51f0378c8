//! In-memory data provider.
//!
//! [`DataSnapshot`] holds every database record in ordered maps and
//! implements [`DataOracle`]. Content loaders fill one from files; tests build
//! one inline with the `with_*` builders.

use std::collections::BTreeMap;

use crate::ids::{ActorId, EnemyId, ItemId, SkillId, StateId, TroopId};
use crate::stats::{SpecialFlag, Trait};

use super::data::{
    ActorDefinition, AutoRemoval, DamageElement, DamageKind, DamageSpec, DataOracle, Effect,
    EnemyDefinition, HitType, ItemDefinition, Scope, SkillDefinition, StateDefinition,
    TroopDefinition, UsableDefinition,
};

// ============================================================================
// Snapshot Structure
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DataSnapshot {
    pub skills: BTreeMap<SkillId, SkillDefinition>,
    pub items: BTreeMap<ItemId, ItemDefinition>,
    pub states: BTreeMap<StateId, StateDefinition>,
    pub enemies: BTreeMap<EnemyId, EnemyDefinition>,
    pub troops: BTreeMap<TroopId, TroopDefinition>,
    pub actors: BTreeMap<ActorId, ActorDefinition>,
}

impl DataSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot pre-filled with the records every battle relies on:
    /// attack (skill 1), guard (skill 2), death (state 1), and guarding (state 2).
    pub fn standard() -> Self {
        Self::new()
            .with_skill(standard_attack())
            .with_skill(standard_guard())
            .with_state(StateDefinition::death())
            .with_state(StateDefinition {
                id: StateId(2),
                name: "Guard".into(),
                priority: 0,
                auto_removal: AutoRemoval::TurnEnd,
                min_turns: 1,
                max_turns: 1,
                traits: vec![Trait::Special(SpecialFlag::Guard)],
                ..StateDefinition::default()
            })
    }

    pub fn with_skill(mut self, skill: SkillDefinition) -> Self {
        self.skills.insert(skill.id, skill);
        self
    }

    pub fn with_item(mut self, item: ItemDefinition) -> Self {
        self.items.insert(item.id, item);
        self
    }

    pub fn with_state(mut self, state: StateDefinition) -> Self {
        self.states.insert(state.id, state);
        self
    }

    pub fn with_enemy(mut self, enemy: EnemyDefinition) -> Self {
        self.enemies.insert(enemy.id, enemy);
        self
    }

    pub fn with_troop(mut self, troop: TroopDefinition) -> Self {
        self.troops.insert(troop.id, troop);
        self
    }

    pub fn with_actor(mut self, actor: ActorDefinition) -> Self {
        self.actors.insert(actor.id, actor);
        self
    }

    /// Merges `other` into `self`; records in `other` win on id collisions.
    pub fn merge(&mut self, other: DataSnapshot) {
        self.skills.extend(other.skills);
        self.items.extend(other.items);
        self.states.extend(other.states);
        self.enemies.extend(other.enemies);
        self.troops.extend(other.troops);
        self.actors.extend(other.actors);
    }
}

fn standard_attack() -> SkillDefinition {
    SkillDefinition {
        id: SkillId::ATTACK,
        usable: UsableDefinition {
            name: "Attack".into(),
            scope: Scope::OneOpponent,
            hit_type: HitType::Physical,
            tp_gain: 10,
            damage: DamageSpec {
                kind: DamageKind::HpDamage,
                element: DamageElement::NormalAttack,
                formula: "a.atk * 4 - b.def * 2".into(),
                variance: 20,
                critical: true,
            },
            effects: vec![Effect::AddAttackStates { chance: 1.0 }],
            ..UsableDefinition::default()
        },
        ..SkillDefinition::default()
    }
}

fn standard_guard() -> SkillDefinition {
    SkillDefinition {
        id: SkillId::GUARD,
        usable: UsableDefinition {
            name: "Guard".into(),
            scope: Scope::User,
            speed: 2000,
            effects: vec![Effect::AddState {
                state: StateId(2),
                chance: 1.0,
            }],
            ..UsableDefinition::default()
        },
        ..SkillDefinition::default()
    }
}

// ============================================================================
// Oracle implementation
// ============================================================================

impl DataOracle for DataSnapshot {
    fn skill(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.skills.get(&id)
    }

    fn item(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }

    fn state(&self, id: StateId) -> Option<&StateDefinition> {
        self.states.get(&id)
    }

    fn enemy(&self, id: EnemyId) -> Option<&EnemyDefinition> {
        self.enemies.get(&id)
    }

    fn troop(&self, id: TroopId) -> Option<&TroopDefinition> {
        self.troops.get(&id)
    }

    fn actor(&self, id: ActorId) -> Option<&ActorDefinition> {
        self.actors.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::data::UsableRef;
    use crate::env::error::OracleError;

    #[test]
    fn standard_contains_core_records() {
        let data = DataSnapshot::standard();
        assert!(data.skill(SkillId::ATTACK).is_some());
        assert!(data.skill(SkillId::GUARD).is_some());
        assert_eq!(
            data.state(StateId::DEATH).map(|s| s.priority),
            Some(100)
        );
        let attack = data.usable(UsableRef::Skill(SkillId::ATTACK));
        assert_eq!(attack.map(|u| u.scope), Some(Scope::OneOpponent));
    }

    #[test]
    fn missing_records_surface_as_oracle_errors() {
        let data = DataSnapshot::new();
        assert_eq!(
            data.require_troop(TroopId(4)).err(),
            Some(OracleError::TroopNotFound(TroopId(4)))
        );
    }

    #[test]
    fn merge_overrides_by_id() {
        let mut base = DataSnapshot::standard();
        let mut custom = standard_attack();
        custom.usable.damage.formula = "100".into();
        base.merge(DataSnapshot::new().with_skill(custom));
        assert_eq!(base.skills[&SkillId::ATTACK].usable.damage.formula, "100");
    }
}
