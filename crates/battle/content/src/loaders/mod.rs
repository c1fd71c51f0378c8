//! Content loaders for reading battle data from files.
//!
//! Loaders convert RON/TOML files into `battle-core` types. Parsing uses the
//! core types' own serde derives; no intermediate format structs besides the
//! per-file [`Catalog`] wrapper.

pub mod config;
pub mod database;
pub mod factory;
pub mod party;
pub mod validate;

pub use config::ConfigLoader;
pub use database::{Catalog, DatabaseLoader};
pub use factory::ContentFactory;
pub use party::PartyLoader;
pub use validate::validate_database;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
