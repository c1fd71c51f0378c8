//! Battle rule configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle rules from TOML files.
///
/// Every field is optional; missing keys keep the classic defaults.
///
/// ```toml
/// critical_multiplier = 2.5
/// escape_ratio_step = 0.2
/// slip_death = true
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse config data from TOML text.
    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        anyhow::ensure!(
            config.critical_multiplier >= 1.0,
            "critical_multiplier must be at least 1, got {}",
            config.critical_multiplier
        );
        anyhow::ensure!(
            config.escape_ratio_step >= 0.0,
            "escape_ratio_step must not be negative"
        );

        Ok(config)
    }
}
