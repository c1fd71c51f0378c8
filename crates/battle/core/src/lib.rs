//! Deterministic turn-based combat rules.
//!
//! `battle-core` resolves one battle between an ally party and an enemy
//! troop. Combatants live in a [`context::BattleContext`] owned by the
//! caller; [`engine::BattleOrchestrator`] advances the battle one step per
//! [`update`](engine::BattleOrchestrator::update). Database records,
//! randomness, and presentation are reached only through the oracle traits
//! in [`env`], so the same inputs and random stream always replay the same
//! battle.
pub mod action;
pub mod combatant;
pub mod config;
pub mod context;
pub mod engine;
pub mod env;
pub mod error;
pub mod group;
pub mod ids;
pub mod outcome;
pub mod stats;

pub use action::formula::{FormulaError, FormulaOperand, FormulaScope, VariableStore};
pub use action::{Action, HitReport, HitRoute};
pub use combatant::{Combatant, CombatantRef, Side};
pub use config::BattleConfig;
pub use context::BattleContext;
pub use engine::{
    BattleOrchestrator, BattlePhase, BattleResult, CommandError, Rewards, SetupError,
};
pub use env::{
    BattleEnv, BattleEvent, BattlePresenter, DataOracle, DataSnapshot, OracleError, PcgRng,
    RecordingPresenter, RngOracle, SequenceRng, VisualEffects,
};
pub use error::{BattleError, ErrorSeverity};
pub use group::Group;
pub use ids::{
    ActorId, CommonEventId, ElementId, EnemyId, ItemId, SkillId, SkillTypeId, StateId, TroopId,
};
pub use outcome::{Outcome, OutcomeFlags};
pub use stats::{BaseParams, ExParamKind, ParamKind, PartyAbility, SpParamKind, SpecialFlag, Trait};
