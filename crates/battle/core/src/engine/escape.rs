//! Encounter rolls and escape attempts.

use crate::context::BattleContext;
use crate::env::{BattleEnv, BattleEvent};
use crate::stats::PartyAbility;

use super::{BattleOrchestrator, BattlePhase, CommandError};

impl BattleOrchestrator {
    /// Rolls the preemptive and surprise flags for a fresh encounter.
    ///
    /// Both draws are always consumed. Surprise never happens together with
    /// a preemptive strike.
    pub fn on_encounter(&mut self, ctx: &BattleContext, env: &mut BattleEnv<'_>) {
        let preemptive_rate = self.preemptive_rate(ctx, env);
        let surprise_rate = self.surprise_rate(ctx, env);
        self.preemptive = env.random() < preemptive_rate;
        self.surprise = env.random() < surprise_rate && !self.preemptive;
        tracing::trace!(
            preemptive_rate,
            surprise_rate,
            preemptive = self.preemptive,
            surprise = self.surprise,
            "encounter rolled"
        );
    }

    fn preemptive_rate(&self, ctx: &BattleContext, env: &BattleEnv<'_>) -> f64 {
        let config = env.config();
        let mut rate = if ctx.party.average_agility() >= ctx.troop.average_agility() {
            config.preemptive_rate_fast
        } else {
            config.preemptive_rate_slow
        };
        if ctx.party.party_ability(PartyAbility::RaisePreemptive) {
            rate *= 4.0;
        }
        rate
    }

    fn surprise_rate(&self, ctx: &BattleContext, env: &BattleEnv<'_>) -> f64 {
        if ctx.party.party_ability(PartyAbility::CancelSurprise) {
            return 0.0;
        }
        let config = env.config();
        if ctx.party.average_agility() >= ctx.troop.average_agility() {
            config.surprise_rate_fast
        } else {
            config.surprise_rate_slow
        }
    }

    /// Attempts to flee during command input.
    ///
    /// A preemptive encounter always succeeds; otherwise one draw is compared
    /// against the escape ratio. Success aborts the battle. Failure raises
    /// the ratio by the configured step, clears the party's actions, and runs
    /// the turn with only the troop acting.
    pub fn process_escape(
        &mut self,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> Result<bool, CommandError> {
        if !self.can_escape {
            return Err(CommandError::EscapeNotAllowed);
        }
        if self.phase != BattlePhase::Input {
            return Err(CommandError::NotInputting { phase: self.phase });
        }

        self.notify(BattleEvent::EscapeStart);
        let success = self.preemptive || env.random() < self.escape_ratio;
        if success {
            self.notify(BattleEvent::Escaped);
            self.escaped = true;
            self.process_abort(ctx);
        } else {
            ctx.party.clear_actions();
            self.notify(BattleEvent::EscapeFailure);
            self.escape_ratio += env.config().escape_ratio_step;
            self.start_turn(ctx, env);
        }
        tracing::debug!(success, escape_ratio = self.escape_ratio, "escape attempt");
        Ok(success)
    }
}
