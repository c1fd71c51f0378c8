//! Battle end: victory, defeat, abort, and the rewards they hand out.

use crate::combatant::Combatant;
use crate::context::BattleContext;
use crate::env::{BattleEnv, BattleEvent, ItemKey, RngOracle};
use crate::group::Group;
use crate::stats::PartyAbility;

use super::{BattleOrchestrator, BattlePhase, BattleResult};

/// Spoils of a won battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rewards {
    pub gold: u64,
    pub exp: u64,
    pub items: Vec<ItemKey>,
}

impl Rewards {
    /// Totals the troop's defeated enemies against the party's abilities.
    pub fn make(ctx: &BattleContext, rng: &mut dyn RngOracle) -> Self {
        Self {
            gold: Self::gold_total(ctx),
            exp: Self::exp_total(&ctx.troop),
            items: Self::drop_items(ctx, rng),
        }
    }

    /// Sum of defeated enemies' exp.
    pub fn exp_total(troop: &Group) -> u64 {
        troop
            .dead_members()
            .filter_map(Combatant::enemy_profile)
            .map(|profile| u64::from(profile.exp))
            .sum()
    }

    /// Sum of defeated enemies' gold, doubled by the gold-double ability.
    pub fn gold_total(ctx: &BattleContext) -> u64 {
        let gold: u64 = ctx
            .troop
            .dead_members()
            .filter_map(Combatant::enemy_profile)
            .map(|profile| u64::from(profile.gold))
            .sum();
        if ctx.party.party_ability(PartyAbility::GoldDouble) {
            gold * 2
        } else {
            gold
        }
    }

    /// One draw per drop entry of every defeated enemy, in troop order.
    ///
    /// An entry drops when `random() * denominator` falls below the drop
    /// rate (1, or 2 with the drop-item-double ability).
    pub fn drop_items(ctx: &BattleContext, rng: &mut dyn RngOracle) -> Vec<ItemKey> {
        let rate = if ctx.party.party_ability(PartyAbility::DropItemDouble) {
            2.0
        } else {
            1.0
        };
        let mut items = Vec::new();
        for enemy in ctx.troop.dead_members() {
            let Some(profile) = enemy.enemy_profile() else {
                continue;
            };
            for drop in &profile.drops {
                if rng.random() * f64::from(drop.denominator) < rate {
                    items.push(drop.item);
                }
            }
        }
        items
    }
}

impl BattleOrchestrator {
    /// Rewards made at victory; empty otherwise.
    pub fn rewards(&self) -> &Rewards {
        &self.rewards
    }

    // ========================================================================
    // Battle-end check
    // ========================================================================

    /// Abort, defeat, then victory. Returns true when the battle ended.
    ///
    /// An empty party or a pending abort counts as an escape.
    pub(crate) fn check_battle_end(
        &mut self,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> bool {
        if ctx.party.is_empty() || self.phase == BattlePhase::Aborting {
            self.escaped = true;
            self.process_abort(ctx);
            true
        } else if ctx.party.is_wiped() {
            self.process_defeat();
            true
        } else if ctx.troop.is_wiped() {
            self.process_victory(ctx, env);
            true
        } else {
            false
        }
    }

    fn process_victory(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        ctx.party.remove_battle_states();
        self.rewards = Rewards::make(ctx, env.rng());
        self.notify(BattleEvent::Victory {
            rewards: self.rewards.clone(),
        });
        self.gain_rewards(ctx);
        self.end_battle(BattleResult::Win);
    }

    fn gain_rewards(&self, ctx: &mut BattleContext) {
        ctx.gain_gold(self.rewards.gold);
        for index in 0..ctx.party.all_members().len() {
            if let Some(member) = ctx.party.get_mut(index) {
                member.gain_exp(self.rewards.exp);
            }
        }
        for item in &self.rewards.items {
            ctx.gain_item(*item, 1);
        }
    }

    fn process_defeat(&mut self) {
        self.notify(BattleEvent::Defeat);
        self.end_battle(BattleResult::Lose);
    }

    pub(crate) fn process_abort(&mut self, ctx: &mut BattleContext) {
        ctx.party.remove_battle_states();
        self.end_battle(BattleResult::Escape);
    }

    /// Records the result and fires the end callback, once per battle.
    fn end_battle(&mut self, result: BattleResult) {
        self.set_phase(BattlePhase::BattleEnd);
        self.actor_index = None;
        self.result = Some(result);
        if let Some(mut callback) = self.on_end.take() {
            callback(result);
        }
        self.notify(BattleEvent::BattleEnd { result });
        tracing::info!(
            result = %result,
            gold = self.rewards.gold,
            exp = self.rewards.exp,
            items = self.rewards.items.len(),
            "battle end"
        );
    }

    /// Final teardown of both groups.
    ///
    /// A wiped party that may lose is revived at 1 HP; one that may not lose
    /// flags game over.
    pub(crate) fn update_battle_end(&mut self, ctx: &mut BattleContext) {
        if !self.escaped && ctx.party.is_wiped() {
            if self.can_lose {
                ctx.party.revive_battle_members();
            } else {
                self.game_over = true;
            }
        }
        ctx.party.on_battle_end();
        ctx.troop.on_battle_end();
        self.set_phase(BattlePhase::Terminated);
    }
}
