//! Side-specific data carried by a combatant.

use crate::env::{ActionPattern, ActorDefinition, DropItem, EnemyDefinition};
use crate::ids::{ActorId, EnemyId, SkillId};

/// Persistent player character data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllyProfile {
    pub actor_id: ActorId,
    pub level: u32,
    pub exp: u64,
    pub skills: Vec<SkillId>,
    pub has_weapon: bool,
}

impl AllyProfile {
    pub fn from_definition(def: &ActorDefinition) -> Self {
        Self {
            actor_id: def.id,
            level: def.level.max(1),
            exp: 0,
            skills: def.skills.clone(),
            has_weapon: def.has_weapon,
        }
    }

    pub fn has_skill(&self, skill: SkillId) -> bool {
        self.skills.contains(&skill)
    }

    pub fn learn_skill(&mut self, skill: SkillId) {
        if !self.has_skill(skill) {
            self.skills.push(skill);
            self.skills.sort();
        }
    }
}

/// Troop member data, discarded at battle end.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyProfile {
    pub enemy_id: EnemyId,
    pub original_name: String,
    /// Disambiguating suffix ("A", "B", ...) when a template repeats.
    pub letter: String,
    pub exp: u32,
    pub gold: u32,
    pub drops: Vec<DropItem>,
    pub patterns: Vec<ActionPattern>,
}

impl EnemyProfile {
    pub fn from_definition(def: &EnemyDefinition) -> Self {
        Self {
            enemy_id: def.id,
            original_name: def.name.clone(),
            letter: String::new(),
            exp: def.exp,
            gold: def.gold,
            drops: def.drops.clone(),
            patterns: def.actions.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Profile {
    Ally(AllyProfile),
    Enemy(EnemyProfile),
    /// Ad-hoc combatant without database backing.
    Plain,
}
