//! Cross-reference checks over a loaded database.
//!
//! The engine tolerates dangling ids at runtime (a missing skill invalidates
//! the action). These checks report them at load time, named after the
//! record that holds the reference.

use battle_core::DataSnapshot;
use battle_core::action::formula;
use battle_core::env::{ActionCondition, Effect, ItemKind, UsableDefinition};
use battle_core::{ItemId, SkillId, StateId, Trait};

use crate::loaders::LoadResult;

/// Checks every id a record refers to, every damage formula, and the
/// ranges the engine assumes (pattern ratings `1..=9`, non-zero drop
/// denominators, non-empty troops). All problems are reported together.
pub fn validate_database(data: &DataSnapshot) -> LoadResult<()> {
    let mut problems = Vec::new();

    if !data.states.contains_key(&StateId::DEATH) {
        problems.push(format!("death state {} is missing", StateId::DEATH));
    }

    for skill in data.skills.values() {
        check_usable(data, &format!("skill {}", skill.id), &skill.usable, &mut problems);
    }
    for item in data.items.values() {
        check_usable(data, &format!("item {}", item.id), &item.usable, &mut problems);
    }
    for state in data.states.values() {
        check_traits(data, &format!("state {}", state.id), &state.traits, &mut problems);
    }

    for enemy in data.enemies.values() {
        let owner = format!("enemy {} ({})", enemy.id, enemy.name);
        for pattern in &enemy.actions {
            check_skill(data, &owner, pattern.skill, &mut problems);
            if !(1..=9).contains(&pattern.rating) {
                problems.push(format!(
                    "{owner}: action rating {} is outside 1..=9",
                    pattern.rating
                ));
            }
            if let ActionCondition::State(state) = pattern.condition {
                check_state(data, &owner, state, &mut problems);
            }
        }
        for drop in &enemy.drops {
            if drop.denominator == 0 {
                problems.push(format!("{owner}: drop denominator is zero"));
            }
            if drop.item.kind == ItemKind::Item && !data.items.contains_key(&ItemId(drop.item.id)) {
                problems.push(format!("{owner}: drops unknown item {}", drop.item.id));
            }
        }
        check_traits(data, &owner, &enemy.traits, &mut problems);
    }

    for troop in data.troops.values() {
        let owner = format!("troop {} ({})", troop.id, troop.name);
        if troop.members.is_empty() {
            problems.push(format!("{owner}: has no members"));
        }
        for member in &troop.members {
            if !data.enemies.contains_key(&member.enemy) {
                problems.push(format!("{owner}: unknown enemy {}", member.enemy));
            }
        }
    }

    for actor in data.actors.values() {
        let owner = format!("actor {} ({})", actor.id, actor.name);
        for &skill in &actor.skills {
            check_skill(data, &owner, skill, &mut problems);
        }
        check_traits(data, &owner, &actor.traits, &mut problems);
    }

    if problems.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Invalid database:\n  {}", problems.join("\n  "))
    }
}

fn check_usable(
    data: &DataSnapshot,
    owner: &str,
    usable: &UsableDefinition,
    problems: &mut Vec<String>,
) {
    if !usable.damage.kind.is_none()
        && let Err(e) = formula::parse(&usable.damage.formula)
    {
        problems.push(format!(
            "{owner}: damage formula {:?}: {}",
            usable.damage.formula, e
        ));
    }

    for effect in &usable.effects {
        match *effect {
            Effect::AddState { state, .. } | Effect::RemoveState { state, .. } => {
                check_state(data, owner, state, problems);
            }
            Effect::LearnSkill { skill } => check_skill(data, owner, skill, problems),
            _ => {}
        }
    }
}

fn check_traits(data: &DataSnapshot, owner: &str, traits: &[Trait], problems: &mut Vec<String>) {
    for entry in traits {
        match *entry {
            Trait::StateRate { state, .. }
            | Trait::StateResist(state)
            | Trait::AttackState { state, .. } => check_state(data, owner, state, problems),
            Trait::SkillAdd(skill) => check_skill(data, owner, skill, problems),
            _ => {}
        }
    }
}

fn check_skill(data: &DataSnapshot, owner: &str, skill: SkillId, problems: &mut Vec<String>) {
    if !data.skills.contains_key(&skill) {
        problems.push(format!("{owner}: unknown skill {skill}"));
    }
}

fn check_state(data: &DataSnapshot, owner: &str, state: StateId, problems: &mut Vec<String>) {
    if !data.states.contains_key(&state) {
        problems.push(format!("{owner}: unknown state {state}"));
    }
}
