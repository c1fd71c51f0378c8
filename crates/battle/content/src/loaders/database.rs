//! Database catalog loader.
//!
//! A database directory holds any number of `*.ron` catalogs. Files are read
//! in name order and merged onto [`DataSnapshot::standard`], so a later file
//! can redefine a record (including the built-in attack, guard, and death
//! records) by reusing its id.

use std::path::{Path, PathBuf};

use battle_core::DataSnapshot;
use battle_core::env::{
    ActorDefinition, EnemyDefinition, ItemDefinition, SkillDefinition, StateDefinition,
    TroopDefinition,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loaders::{LoadResult, read_file, validate_database};

/// One RON catalog file. Every section is optional.
///
/// ```ron
/// (
///     enemies: [
///         (id: 1, name: "Slime", params: (60, 0, 12, 4, 5, 5, 6, 5), exp: 10, gold: 8,
///          actions: [(skill: 1, rating: 5)]),
///     ],
///     troops: [(id: 1, name: "Slimes", members: [(enemy: 1), (enemy: 1)])],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub skills: Vec<SkillDefinition>,
    pub items: Vec<ItemDefinition>,
    pub states: Vec<StateDefinition>,
    pub enemies: Vec<EnemyDefinition>,
    pub troops: Vec<TroopDefinition>,
    pub actors: Vec<ActorDefinition>,
}

impl Catalog {
    pub fn record_count(&self) -> usize {
        self.skills.len()
            + self.items.len()
            + self.states.len()
            + self.enemies.len()
            + self.troops.len()
            + self.actors.len()
    }

    pub fn into_snapshot(self) -> DataSnapshot {
        let mut data = DataSnapshot::new();
        for skill in self.skills {
            data.skills.insert(skill.id, skill);
        }
        for item in self.items {
            data.items.insert(item.id, item);
        }
        for state in self.states {
            data.states.insert(state.id, state);
        }
        for enemy in self.enemies {
            data.enemies.insert(enemy.id, enemy);
        }
        for troop in self.troops {
            data.troops.insert(troop.id, troop);
        }
        for actor in self.actors {
            data.actors.insert(actor.id, actor);
        }
        data
    }
}

/// Loader for database catalogs from RON files.
pub struct DatabaseLoader;

impl DatabaseLoader {
    /// Parse a catalog from RON text.
    pub fn parse(content: &str) -> LoadResult<Catalog> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse catalog RON: {}", e))
    }

    /// Load a single catalog file.
    pub fn load(path: &Path) -> LoadResult<Catalog> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Load every catalog in `dir`, merge them onto the standard records,
    /// and validate cross references.
    pub fn load_dir(dir: &Path) -> LoadResult<DataSnapshot> {
        let files = catalog_files(dir)?;
        anyhow::ensure!(
            !files.is_empty(),
            "No .ron catalogs found in {}",
            dir.display()
        );

        let mut data = DataSnapshot::standard();
        for path in files {
            let catalog = Self::load(&path)?;
            debug!(
                file = %path.display(),
                records = catalog.record_count(),
                "loaded catalog"
            );
            data.merge(catalog.into_snapshot());
        }

        validate_database(&data)?;
        Ok(data)
    }
}

fn catalog_files(dir: &Path) -> LoadResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::env::{
        ActionCondition, AutoRemoval, DamageElement, DamageKind, Effect, HitType, Scope,
    };
    use battle_core::{
        DataOracle, EnemyId, ExParamKind, SkillId, StateId, TroopId, Trait,
    };
    use tempfile::TempDir;

    const BESTIARY: &str = r#"
        (
            skills: [
                (
                    id: 10,
                    usable: (
                        name: "Fire",
                        scope: OneOpponent,
                        hit_type: Magical,
                        damage: (
                            kind: HpDamage,
                            element: Element(2),
                            formula: "100 + a.mat * 2 - b.mdf * 2",
                            variance: 20,
                        ),
                        effects: [AddState(state: 4, chance: 0.5)],
                    ),
                    mp_cost: 5,
                ),
            ],
            states: [
                (
                    id: 4,
                    name: "Poison",
                    auto_removal: TurnEnd,
                    min_turns: 3,
                    max_turns: 5,
                    remove_at_battle_end: true,
                    traits: [ExParam(param: HpRegen, value: -0.1)],
                ),
            ],
            enemies: [
                (
                    id: 1,
                    name: "Slime",
                    params: (60, 0, 12, 4, 5, 5, 6, 5),
                    exp: 10,
                    gold: 8,
                    drops: [(item: (kind: Item, id: 1), denominator: 2)],
                    actions: [
                        (skill: 1, rating: 5),
                        (skill: 10, rating: 4, condition: HpRate(min: 0.0, max: 0.5)),
                    ],
                ),
            ],
            items: [
                (
                    id: 1,
                    usable: (
                        name: "Potion",
                        scope: OneFriend,
                        effects: [RecoverHp(rate: 0.0, flat: 500.0)],
                    ),
                ),
            ],
            troops: [(id: 1, name: "Slimes", members: [(enemy: 1), (enemy: 1, hidden: true)])],
        )
    "#;

    #[test]
    fn parses_hand_written_catalog() {
        let catalog = DatabaseLoader::parse(BESTIARY).unwrap();
        assert_eq!(catalog.record_count(), 5);

        let fire = &catalog.skills[0];
        assert_eq!(fire.id, SkillId(10));
        assert_eq!(fire.usable.scope, Scope::OneOpponent);
        assert_eq!(fire.usable.hit_type, HitType::Magical);
        assert_eq!(fire.usable.damage.kind, DamageKind::HpDamage);
        assert_eq!(fire.usable.damage.element, DamageElement::Element(2.into()));
        assert_eq!(fire.usable.repeats, 1);
        assert_eq!(fire.mp_cost, 5);
        assert_eq!(
            fire.usable.effects,
            vec![Effect::AddState {
                state: StateId(4),
                chance: 0.5
            }]
        );

        let poison = &catalog.states[0];
        assert_eq!(poison.auto_removal, AutoRemoval::TurnEnd);
        assert_eq!(
            poison.traits,
            vec![Trait::ExParam {
                param: ExParamKind::HpRegen,
                value: -0.1
            }]
        );

        let slime = &catalog.enemies[0];
        assert_eq!(slime.params.0, [60, 0, 12, 4, 5, 5, 6, 5]);
        assert_eq!(slime.actions[0].condition, ActionCondition::Always);
        assert_eq!(
            slime.actions[1].condition,
            ActionCondition::HpRate { min: 0.0, max: 0.5 }
        );

        assert!(catalog.items[0].consumable);
        assert!(catalog.troops[0].members[1].hidden);
    }

    #[test]
    fn load_dir_merges_in_name_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("10_bestiary.ron"), BESTIARY).unwrap();
        std::fs::write(
            dir.path().join("20_overrides.ron"),
            r#"(enemies: [(id: 1, name: "King Slime", params: (300, 0, 30, 10, 10, 10, 8, 10))])"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a catalog").unwrap();

        let data = DatabaseLoader::load_dir(dir.path()).unwrap();
        assert_eq!(data.enemy(EnemyId(1)).map(|e| e.name.as_str()), Some("King Slime"));
        assert!(data.troop(TroopId(1)).is_some());
        // standard records are still present underneath
        assert!(data.skill(SkillId::ATTACK).is_some());
        assert!(data.state(StateId::DEATH).is_some());
    }

    #[test]
    fn load_dir_rejects_dangling_references() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("troops.ron"),
            r#"(troops: [(id: 1, name: "Ghosts", members: [(enemy: 42)])])"#,
        )
        .unwrap();

        let err = DatabaseLoader::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("enemy 42"));
    }

    #[test]
    fn load_dir_requires_catalogs() {
        let dir = TempDir::new().unwrap();
        assert!(DatabaseLoader::load_dir(dir.path()).is_err());
        assert!(DatabaseLoader::load_dir(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "(skills: [").unwrap();

        let err = DatabaseLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
