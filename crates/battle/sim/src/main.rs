//! Headless battle runner.
//!
//! Loads content from a data directory, sets up the configured troop against
//! the starting party, and plays the battle to the end with auto-chosen
//! commands. Every event is narrated through `tracing`.
mod config;
mod driver;
mod logging;
mod presenter;

use anyhow::Result;
use battle_content::ContentFactory;
use config::SimConfig;
use driver::{BattleOptions, run_battle};
use tracing::info;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SimConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    let factory = ContentFactory::new(&config.content_dir);
    let rules = factory.load_config()?;
    let data = factory.load_database()?;
    let mut ctx = factory.load_party()?.build(&data)?;
    info!(
        content = %factory.data_dir().display(),
        skills = data.skills.len(),
        enemies = data.enemies.len(),
        troops = data.troops.len(),
        party = ctx.party.len(),
        "content loaded"
    );

    let seed = config.seed.unwrap_or_else(time_seed);
    info!(seed, troop = %config.troop, "starting battle");

    let options = BattleOptions {
        troop: config.troop,
        seed,
        can_escape: config.can_escape,
        can_lose: config.can_lose,
        max_ticks: config.max_ticks,
        flee_below: config.flee_below,
    };
    let report = run_battle(&mut ctx, &data, &rules, &options)?;

    info!(
        result = %report.result,
        turns = report.turns,
        ticks = report.ticks,
        exp = report.rewards.exp,
        gold = report.rewards.gold,
        game_over = report.game_over,
        digest = %hex::encode(report.digest),
        "battle finished"
    );
    for member in ctx.party.all_members() {
        info!(
            "{}: HP {}/{} MP {}/{}",
            member.name(),
            member.hp(),
            member.mhp(),
            member.mp(),
            member.mmp()
        );
    }

    Ok(())
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos() as u64)
}
