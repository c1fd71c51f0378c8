//! Simulator configuration read from the process environment.
use std::env;
use std::path::PathBuf;

use battle_core::TroopId;

/// Headless runner settings.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Directory holding `config.toml`, `party.ron`, and `database/`.
    pub content_dir: PathBuf,
    pub troop: TroopId,
    /// Fixed RNG seed; a time-based seed is drawn (and logged) when absent.
    pub seed: Option<u64>,
    pub can_escape: bool,
    pub can_lose: bool,
    /// Upper bound on `update()` calls before the run is declared stuck.
    pub max_ticks: u32,
    /// Party HP rate under which the party tries to run instead of fighting.
    pub flee_below: Option<f64>,
    /// Also write logs to `battle.log` in this directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data")),
            troop: TroopId(1),
            seed: None,
            can_escape: true,
            can_lose: false,
            max_ticks: 10_000,
            flee_below: None,
            log_dir: None,
        }
    }
}

impl SimConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_CONTENT_DIR` - content directory (default: the crate's `data/`)
    /// - `BATTLE_TROOP_ID` - troop to fight (default: 1)
    /// - `BATTLE_SEED` - RNG seed (default: time-based)
    /// - `BATTLE_CAN_ESCAPE` - allow escape commands (default: true)
    /// - `BATTLE_CAN_LOSE` - defeat does not end the game (default: false)
    /// - `BATTLE_MAX_TICKS` - update limit (default: 10000)
    /// - `BATTLE_FLEE_BELOW` - party HP rate that triggers escape attempts
    /// - `BATTLE_LOG_DIR` - directory for a log file copy
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("BATTLE_CONTENT_DIR") {
            config.content_dir = PathBuf::from(dir);
        }
        if let Some(troop) = read_env::<u32>("BATTLE_TROOP_ID") {
            config.troop = TroopId(troop);
        }
        config.seed = read_env("BATTLE_SEED");
        if let Some(can_escape) = read_env("BATTLE_CAN_ESCAPE") {
            config.can_escape = can_escape;
        }
        if let Some(can_lose) = read_env("BATTLE_CAN_LOSE") {
            config.can_lose = can_lose;
        }
        if let Some(max_ticks) = read_env::<u32>("BATTLE_MAX_TICKS") {
            config.max_ticks = max_ticks.max(1);
        }
        config.flee_below = read_env::<f64>("BATTLE_FLEE_BELOW").map(|rate| rate.clamp(0.0, 1.0));
        config.log_dir = env::var_os("BATTLE_LOG_DIR").map(PathBuf::from);

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_bundled_content() {
        let config = SimConfig::default();
        assert!(config.content_dir.ends_with("data"));
        assert_eq!(config.troop, TroopId(1));
        assert!(config.can_escape);
        assert!(!config.can_lose);
        assert!(config.seed.is_none());
    }
}
