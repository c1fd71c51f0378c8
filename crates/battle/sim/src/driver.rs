//! Headless battle loop: sets a battle up and plays it to the end.
use anyhow::{Result, anyhow};
use battle_core::action::evaluate::make_auto_battle_actions;
use battle_core::{
    BattleConfig, BattleContext, BattleEnv, BattleOrchestrator, BattleResult, DataSnapshot,
    PcgRng, Rewards, TroopId,
};
use tracing::{debug, info, warn};

use crate::presenter::TracingPresenter;

/// Select-next steps allowed per input phase; each battle member needs at
/// most one step per action slot.
const COMMAND_STEP_LIMIT: usize = 64;

#[derive(Clone, Debug)]
pub struct BattleOptions {
    pub troop: TroopId,
    pub seed: u64,
    pub can_escape: bool,
    pub can_lose: bool,
    pub max_ticks: u32,
    pub flee_below: Option<f64>,
}

/// Summary of a finished battle.
#[derive(Clone, Debug)]
pub struct SimReport {
    pub result: BattleResult,
    pub turns: u32,
    pub ticks: u32,
    pub rewards: Rewards,
    pub game_over: bool,
    pub digest: [u8; 32],
}

/// Runs one battle against `options.troop` until the orchestrator terminates.
///
/// Commands are chosen the way auto-battle actors choose them; slots the
/// evaluator leaves empty fall back to the basic attack.
pub fn run_battle(
    ctx: &mut BattleContext,
    data: &DataSnapshot,
    rules: &BattleConfig,
    options: &BattleOptions,
) -> Result<SimReport> {
    let mut rng = PcgRng::new(options.seed);
    let mut env = BattleEnv::new(data, rules, &mut rng);

    let mut orchestrator = BattleOrchestrator::new();
    orchestrator.setup(
        ctx,
        &env,
        options.troop,
        options.can_escape,
        options.can_lose,
    )?;
    let mut orchestrator = orchestrator.with_presenter(TracingPresenter::new(ctx, data));
    orchestrator.set_end_callback(|result| debug!(code = result.code(), "end callback"));
    orchestrator.on_encounter(ctx, &mut env);

    let mut ticks = 0;
    while !orchestrator.is_terminated() {
        if ticks >= options.max_ticks {
            return Err(anyhow!(
                "battle did not finish within {} ticks (phase {})",
                options.max_ticks,
                orchestrator.phase()
            ));
        }
        if orchestrator.is_inputting() {
            input_commands(&mut orchestrator, ctx, &mut env, options);
        }
        orchestrator.update(ctx, &mut env);
        ticks += 1;
    }

    let result = orchestrator
        .result()
        .ok_or_else(|| anyhow!("battle terminated without a result"))?;

    Ok(SimReport {
        result,
        turns: ctx.turn_count(),
        ticks,
        rewards: orchestrator.rewards().clone(),
        game_over: orchestrator.is_game_over(),
        digest: orchestrator.state_digest(ctx),
    })
}

/// Fills every inputting ally's slots, then confirms commands until the
/// turn starts. Tries to run instead when the party is below the flee
/// threshold.
fn input_commands(
    orchestrator: &mut BattleOrchestrator,
    ctx: &mut BattleContext,
    env: &mut BattleEnv<'_>,
    options: &BattleOptions,
) {
    if let Some(threshold) = options.flee_below
        && orchestrator.can_escape()
        && party_hp_rate(ctx) < threshold
    {
        match orchestrator.process_escape(ctx, env) {
            Ok(escaped) => {
                info!(escaped, ratio = orchestrator.escape_ratio(), "escape attempt");
                return;
            }
            Err(e) => warn!(error = %e, "escape command rejected"),
        }
    }

    for member in ctx.party.member_refs() {
        if !ctx.combatant(member).is_some_and(|c| c.can_input()) {
            continue;
        }
        make_auto_battle_actions(member, ctx, env);
        if let Some(combatant) = ctx.combatant_mut(member) {
            for slot in 0..combatant.actions().len() {
                if let Some(action) = combatant.action_mut(slot)
                    && action.usable().is_none()
                {
                    action.set_attack();
                }
            }
        }
    }

    for _ in 0..COMMAND_STEP_LIMIT {
        if !orchestrator.is_inputting() {
            return;
        }
        orchestrator.select_next_command(ctx, env);
    }
    warn!("command input did not finish");
}

/// Combined HP over combined max HP of the living battle members.
fn party_hp_rate(ctx: &BattleContext) -> f64 {
    let (hp, mhp) = ctx
        .party
        .alive_members()
        .fold((0i64, 0i64), |(hp, mhp), c| {
            (hp + i64::from(c.hp()), mhp + i64::from(c.mhp()))
        });
    if mhp == 0 { 0.0 } else { hp as f64 / mhp as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::env::{ActorDefinition, EnemyDefinition, TroopDefinition, TroopMember};
    use battle_core::{ActorId, BaseParams, Combatant, EnemyId, ExParamKind, Trait};

    fn data() -> DataSnapshot {
        let sure_hit = Trait::ExParam {
            param: ExParamKind::Hit,
            value: 1.0,
        };
        DataSnapshot::standard()
            .with_actor(ActorDefinition {
                id: ActorId(1),
                name: "Reid".into(),
                level: 5,
                params: BaseParams::new([300, 0, 30, 10, 10, 10, 20, 10]),
                traits: vec![sure_hit.clone()],
                has_weapon: true,
                ..ActorDefinition::default()
            })
            .with_enemy(EnemyDefinition {
                id: EnemyId(1),
                name: "Slime".into(),
                params: BaseParams::new([60, 0, 12, 4, 5, 5, 6, 5]),
                exp: 10,
                gold: 8,
                traits: vec![sure_hit],
                ..EnemyDefinition::default()
            })
            .with_troop(TroopDefinition {
                id: TroopId(1),
                name: "Slimes".into(),
                members: vec![
                    TroopMember {
                        enemy: EnemyId(1),
                        hidden: false,
                    },
                    TroopMember {
                        enemy: EnemyId(1),
                        hidden: false,
                    },
                ],
            })
    }

    fn options(seed: u64) -> BattleOptions {
        BattleOptions {
            troop: TroopId(1),
            seed,
            can_escape: true,
            can_lose: false,
            max_ticks: 5_000,
            flee_below: None,
        }
    }

    fn party(data: &DataSnapshot) -> BattleContext {
        let hero = data.actors.get(&ActorId(1)).map(Combatant::from_actor);
        BattleContext::with_party(hero)
    }

    #[test]
    fn strong_hero_wins_and_collects_rewards() {
        let data = data();
        let rules = BattleConfig::default();
        let mut ctx = party(&data);

        let report = run_battle(&mut ctx, &data, &rules, &options(7)).unwrap();
        assert_eq!(report.result, BattleResult::Win);
        assert_eq!(report.rewards.gold, 16);
        assert_eq!(ctx.gold(), 16);
        assert!(report.turns >= 1);
        assert!(!report.game_over);
    }

    #[test]
    fn same_seed_same_battle() {
        let data = data();
        let rules = BattleConfig::default();

        let mut first = party(&data);
        let mut second = party(&data);
        let a = run_battle(&mut first, &data, &rules, &options(99)).unwrap();
        let b = run_battle(&mut second, &data, &rules, &options(99)).unwrap();

        assert_eq!(a.digest, b.digest);
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_troop_fails_setup() {
        let data = data();
        let rules = BattleConfig::default();
        let mut ctx = party(&data);
        let mut opts = options(1);
        opts.troop = TroopId(5);

        assert!(run_battle(&mut ctx, &data, &rules, &opts).is_err());
    }

    #[test]
    fn tick_limit_is_reported() {
        let data = data();
        let rules = BattleConfig::default();
        let mut ctx = party(&data);
        let mut opts = options(1);
        opts.max_ticks = 2;

        let err = run_battle(&mut ctx, &data, &rules, &opts).unwrap_err();
        assert!(err.to_string().contains("2 ticks"));
    }

    #[test]
    fn fleeing_party_leaves_with_escape() {
        let data = data();
        let rules = BattleConfig::default();
        let mut ctx = party(&data);
        let mut opts = options(3);
        opts.flee_below = Some(1.1);

        // agility 20 against 6 puts the escape ratio above 1
        let report = run_battle(&mut ctx, &data, &rules, &opts).unwrap();
        assert_eq!(report.result, BattleResult::Escape);
        assert_eq!(report.rewards.gold, 0);
        assert_eq!(ctx.gold(), 0);
    }

    #[test]
    fn bundled_content_plays_every_troop() {
        let factory =
            battle_content::ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
        let rules = factory.load_config().unwrap();
        let data = factory.load_database().unwrap();
        let party = factory.load_party().unwrap();

        for troop in data.troops.keys().copied() {
            let mut ctx = party.build(&data).unwrap();
            let mut opts = options(11);
            opts.troop = troop;
            opts.max_ticks = 20_000;

            let report = run_battle(&mut ctx, &data, &rules, &opts).unwrap();
            assert!(report.turns >= 1, "troop {troop} ended before a turn");
        }
    }
}
