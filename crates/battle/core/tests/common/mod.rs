#![allow(dead_code)]

use battle_core::env::{
    ActionCondition, ActionPattern, EnemyDefinition, TroopDefinition, TroopMember,
};
use battle_core::{
    BaseParams, BattleContext, BattleEnv, BattleOrchestrator, Combatant, DataSnapshot, EnemyId,
    ExParamKind, Side, SkillId, Trait, TroopId,
};

pub const SLIME: EnemyId = EnemyId(1);
pub const IDLE: EnemyId = EnemyId(2);
pub const ONE_SLIME: TroopId = TroopId(1);
pub const TWO_SLIMES: TroopId = TroopId(2);
pub const ONE_IDLE: TroopId = TroopId(3);

/// mhp 100, atk 20, def 5, agi 10.
pub fn params() -> BaseParams {
    BaseParams::new([100, 0, 20, 5, 10, 10, 10, 10])
}

/// Hits land unless the roll reaches 1.0.
pub fn sure_hit() -> Trait {
    Trait::ExParam {
        param: ExParamKind::Hit,
        value: 1.0,
    }
}

pub fn hero() -> Combatant {
    Combatant::new("Hero", Side::Ally, params()).with_traits(vec![sure_hit()])
}

fn enemy(id: EnemyId, name: &str, actions: Vec<ActionPattern>) -> EnemyDefinition {
    EnemyDefinition {
        id,
        name: name.into(),
        params: params(),
        exp: 12,
        gold: 30,
        actions,
        traits: vec![sure_hit()],
        ..Default::default()
    }
}

fn troop(id: TroopId, members: &[EnemyId]) -> TroopDefinition {
    TroopDefinition {
        id,
        name: format!("Troop {id}"),
        members: members
            .iter()
            .map(|enemy| TroopMember {
                enemy: *enemy,
                hidden: false,
            })
            .collect(),
    }
}

/// Standard records, a slime that always attacks, and a slime that does
/// nothing.
pub fn data() -> DataSnapshot {
    let attacks = vec![ActionPattern {
        skill: SkillId::ATTACK,
        rating: 5,
        condition: ActionCondition::Always,
    }];
    DataSnapshot::standard()
        .with_enemy(enemy(SLIME, "Slime", attacks))
        .with_enemy(enemy(IDLE, "Slime", Vec::new()))
        .with_troop(troop(ONE_SLIME, &[SLIME]))
        .with_troop(troop(TWO_SLIMES, &[SLIME, SLIME]))
        .with_troop(troop(ONE_IDLE, &[IDLE]))
}

/// Same as [`data`] with a variance-free basic attack.
pub fn data_without_variance() -> DataSnapshot {
    let mut data = data();
    if let Some(attack) = data.skills.get_mut(&SkillId::ATTACK) {
        attack.usable.damage.variance = 0;
    }
    data
}

/// Steps the orchestrator until `done` holds, at most `limit` times.
pub fn run_until(
    orchestrator: &mut BattleOrchestrator,
    ctx: &mut BattleContext,
    env: &mut BattleEnv<'_>,
    limit: usize,
    done: impl Fn(&BattleOrchestrator) -> bool,
) -> bool {
    for _ in 0..limit {
        if done(orchestrator) {
            return true;
        }
        orchestrator.update(ctx, env);
    }
    done(orchestrator)
}
