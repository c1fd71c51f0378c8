//! Content factory for loading a whole battle setup from a data directory.

use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, DataSnapshot};
use tracing::debug;

use crate::loaders::{ConfigLoader, DatabaseLoader, LoadResult, PartyLoader};
use crate::party::PartySpec;

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml        (optional)
/// ├── party.ron
/// └── database/
///     ├── actors.ron
///     ├── skills.ron
///     ├── states.ron
///     └── enemies.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load battle rules from `config.toml`, or the defaults when absent.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(BattleConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load and validate every catalog in `database/`.
    pub fn load_database(&self) -> LoadResult<DataSnapshot> {
        DatabaseLoader::load_dir(&self.data_dir.join("database"))
    }

    /// Load the starting party from `party.ron`.
    pub fn load_party(&self) -> LoadResult<PartySpec> {
        PartyLoader::load(&self.data_dir.join("party.ron"))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
