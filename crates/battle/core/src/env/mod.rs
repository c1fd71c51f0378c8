//! Collaborators the engine depends on through narrow traits.
//!
//! - [`DataOracle`]: read-only database records (skills, items, states, ...)
//! - [`RngOracle`]: the single random stream every roll draws from
//! - [`BattlePresenter`] / [`VisualEffects`]: notification sink and busy predicates
//!
//! [`BattleEnv`] bundles the data provider, rule configuration, and RNG so
//! resolution code can take one argument instead of three.
mod data;
mod error;
mod presenter;
mod rng;
mod snapshot;

pub use data::{
    ActionCondition, ActionPattern, ActorDefinition, AutoRemoval, DamageElement, DamageKind,
    DamageSpec, DataOracle, DropItem, Effect, EnemyDefinition, HitType, ItemDefinition, ItemKey,
    ItemKind, Occasion, Restriction, Scope, SkillDefinition, StateDefinition, StateMessages,
    TroopDefinition, TroopMember, UsableDefinition, UsableRef,
};
pub use error::OracleError;
pub use presenter::{
    BattleEvent, BattlePresenter, EventLog, NullPresenter, NullVisuals, RecordingPresenter,
    VisualEffects,
};
pub use rng::{PcgRng, RngOracle, SequenceRng, compute_seed};
pub use snapshot::DataSnapshot;

use crate::config::BattleConfig;

/// Aggregates the collaborators resolution code reads from.
pub struct BattleEnv<'a> {
    data: &'a dyn DataOracle,
    config: &'a BattleConfig,
    rng: &'a mut dyn RngOracle,
}

impl<'a> BattleEnv<'a> {
    pub fn new(
        data: &'a dyn DataOracle,
        config: &'a BattleConfig,
        rng: &'a mut dyn RngOracle,
    ) -> Self {
        Self { data, config, rng }
    }

    pub fn data(&self) -> &'a dyn DataOracle {
        self.data
    }

    pub fn config(&self) -> &'a BattleConfig {
        self.config
    }

    pub fn rng(&mut self) -> &mut dyn RngOracle {
        &mut *self.rng
    }

    /// Uniform draw in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        self.rng.random()
    }

    /// Uniform integer in `[0, max)`.
    pub fn random_int(&mut self, max: u32) -> u32 {
        self.rng.random_int(max)
    }
}
