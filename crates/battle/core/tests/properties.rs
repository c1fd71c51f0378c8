mod common;

use battle_core::action::apply_variance;
use battle_core::env::EventLog;
use battle_core::{
    BattleConfig, BattleContext, BattleEnv, BattleOrchestrator, BattleResult, Combatant,
    CombatantRef, PcgRng, RecordingPresenter, RngOracle, SequenceRng, Side, SpecialFlag, Trait,
};
use common::*;

fn auto_hero(name: &str) -> Combatant {
    Combatant::new(name, Side::Ally, params()).with_traits(vec![
        sure_hit(),
        Trait::Special(SpecialFlag::AutoBattle),
    ])
}

/// Plays a full auto battle and returns the final digest, result, and log.
fn play(seed: u64) -> ([u8; 32], Option<BattleResult>, EventLog) {
    let data = data();
    let config = BattleConfig::default();
    let mut rng = PcgRng::new(seed);
    let (presenter, log) = RecordingPresenter::shared();
    let mut ctx = BattleContext::with_party([auto_hero("Hero"), auto_hero("Knight")]);
    let mut orchestrator = BattleOrchestrator::new().with_presenter(presenter);
    let mut env = BattleEnv::new(&data, &config, &mut rng);

    orchestrator
        .setup(&mut ctx, &env, TWO_SLIMES, false, true)
        .expect("troop exists");
    orchestrator.on_encounter(&ctx, &mut env);
    let finished = run_until(
        &mut orchestrator,
        &mut ctx,
        &mut env,
        2_000,
        BattleOrchestrator::is_terminated,
    );
    assert!(finished, "battle did not finish");
    (orchestrator.state_digest(&ctx), orchestrator.result(), log)
}

#[test]
fn seeded_battles_replay_identically() {
    let (first_digest, first_result, first_log) = play(42);
    let (second_digest, second_result, second_log) = play(42);

    assert!(first_result.is_some());
    assert_eq!(first_result, second_result);
    assert_eq!(hex::encode(first_digest), hex::encode(second_digest));
    assert_eq!(*first_log.borrow(), *second_log.borrow());
}

#[test]
fn escape_ratio_grows_by_step_per_failure_and_resets() {
    let data = data();
    let config = BattleConfig::default();
    let mut rng = SequenceRng::constant(0.99);
    let mut ctx = BattleContext::with_party([hero()]);
    let mut orchestrator = BattleOrchestrator::new();
    let mut env = BattleEnv::new(&data, &config, &mut rng);

    orchestrator
        .setup(&mut ctx, &env, ONE_IDLE, true, false)
        .expect("troop exists");
    assert!((orchestrator.escape_ratio() - 0.5).abs() < 1e-9);
    assert!(run_until(&mut orchestrator, &mut ctx, &mut env, 4, BattleOrchestrator::is_inputting));

    let mut previous = orchestrator.escape_ratio();
    for _ in 0..4 {
        let escaped = orchestrator
            .process_escape(&mut ctx, &mut env)
            .expect("escape allowed during input");
        assert!(!escaped);
        let ratio = orchestrator.escape_ratio();
        assert!((ratio - previous - config.escape_ratio_step).abs() < 1e-9);
        previous = ratio;
        assert!(run_until(&mut orchestrator, &mut ctx, &mut env, 20, BattleOrchestrator::is_inputting));
    }

    orchestrator
        .setup(&mut ctx, &env, ONE_IDLE, true, false)
        .expect("troop exists");
    assert!((orchestrator.escape_ratio() - 0.5).abs() < 1e-9);
}

#[test]
fn variance_is_exact_at_zero_and_centred_otherwise() {
    let mut rng = PcgRng::new(7);
    for _ in 0..100 {
        assert_eq!(apply_variance(70.0, 0, &mut rng), 70.0);
    }

    let samples = 20_000;
    let total: f64 = (0..samples)
        .map(|_| apply_variance(100.0, 20, &mut rng))
        .sum();
    let mean = total / f64::from(samples);
    assert!((mean - 100.0).abs() < 0.5, "mean {mean}");

    let recovery: f64 = (0..samples)
        .map(|_| apply_variance(-100.0, 20, &mut rng))
        .sum();
    assert!((recovery / f64::from(samples) + 100.0).abs() < 0.5);
}

#[test]
fn hp_stays_within_bounds_for_any_gain_sequence() {
    let mut rng = PcgRng::new(99);
    let mut hero = hero();
    for _ in 0..1_000 {
        let value = rng.random_int(401) as i32 - 200;
        hero.gain_hp(value);
        assert!((0..=hero.mhp()).contains(&hero.hp()), "hp {}", hero.hp());
    }
}

#[test]
fn drain_never_takes_more_than_remaining_hp() {
    use battle_core::action::Action;
    use battle_core::env::{
        DamageKind, DamageSpec, HitType, Scope, SkillDefinition, UsableDefinition,
    };
    use battle_core::{Group, SkillId};

    let drain = SkillDefinition {
        id: SkillId(40),
        usable: UsableDefinition {
            scope: Scope::OneOpponent,
            hit_type: HitType::Certain,
            damage: DamageSpec {
                kind: DamageKind::HpDrain,
                formula: "a.atk * 4".into(),
                ..DamageSpec::default()
            },
            ..UsableDefinition::default()
        },
        ..SkillDefinition::default()
    };
    let data = data().with_skill(drain);
    let config = BattleConfig::default();
    let mut rng = SequenceRng::constant(0.5);

    for target_hp in [1, 30, 79, 80, 100] {
        let mut ctx = BattleContext::with_party([hero()]);
        ctx.troop = Group::with_members(Side::Enemy, [hero()]);
        if let Some(drainer) = ctx.combatant_mut(CombatantRef::ally(0)) {
            drainer.set_hp(10);
        }
        if let Some(target) = ctx.combatant_mut(CombatantRef::enemy(0)) {
            target.set_hp(target_hp);
        }
        let mut env = BattleEnv::new(&data, &config, &mut rng);
        let mut action = Action::new(CombatantRef::ally(0));
        action.set_skill(SkillId(40));
        action.apply(CombatantRef::enemy(0), &mut ctx, &mut env);

        let taken = target_hp.min(80);
        let target = ctx.combatant(CombatantRef::enemy(0)).expect("target");
        assert!(target.hp() >= 0);
        assert_eq!(target.hp(), target_hp - taken);
        let drainer = ctx.combatant(CombatantRef::ally(0)).expect("drainer");
        assert_eq!(drainer.result().hp_damage, -taken);
        assert_eq!(drainer.hp(), 10 + taken);
    }
}
