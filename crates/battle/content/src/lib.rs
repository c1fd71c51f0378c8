//! Data-driven battle content.
//!
//! This crate turns data files into the inputs `battle-core` consumes:
//! - Database records: skills, items, states, enemies, troops, actors (RON)
//! - Battle rule configuration (TOML)
//! - Starting party: members, gold, inventory, switches (RON)
//!
//! Everything loaded here ends up in a [`battle_core::DataSnapshot`],
//! a [`battle_core::BattleConfig`], or a [`battle_core::BattleContext`].

pub mod party;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use party::PartySpec;

#[cfg(feature = "loaders")]
pub use loaders::{
    Catalog, ConfigLoader, ContentFactory, DatabaseLoader, PartyLoader, validate_database,
};
