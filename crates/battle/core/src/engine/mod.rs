//! Battle orchestration: the phase machine that drives one battle.
//!
//! The [`BattleOrchestrator`] owns only flow state (phase, queues, escape
//! ratio, rewards). Combatants live in the caller's [`BattleContext`] and
//! everything external comes through [`BattleEnv`], so every entry point
//! takes both explicitly.
//!
//! ```text
//! Init → Start → Input → Turn ⇄ Action → TurnEnd → Input → ...
//!                      ↘ Aborting / BattleEnd → Terminated
//! ```
//!
//! Each call to [`BattleOrchestrator::update`] performs at most one step.
//! Before any phase work it polls the busy predicates, runs a pending forced
//! action, and checks whether the battle is over.
//!
//! The orchestrator's methods are split across files by concern:
//! - `turns`: turn order, per-subject processing, action phase
//! - `input`: command input helpers and action making for both sides
//! - `escape`: encounter rolls and escape attempts
//! - `rewards`: victory/defeat/abort and reward computation

mod errors;
mod escape;
mod input;
mod rewards;
mod turns;

pub use errors::{CommandError, SetupError};
pub use input::{meets_condition, select_enemy_action};
pub use rewards::Rewards;

use std::collections::VecDeque;

use sha2::{Digest, Sha256};

use crate::action::Action;
use crate::combatant::{Combatant, CombatantRef, Side};
use crate::context::BattleContext;
use crate::env::{
    BattleEnv, BattleEvent, BattlePresenter, DataOracle, NullPresenter, NullVisuals,
    VisualEffects,
};
use crate::group::Group;
use crate::ids::TroopId;

/// Orchestrator phase.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattlePhase {
    /// Set up, waiting for the first update.
    Init,
    Start,
    Input,
    Turn,
    Action,
    TurnEnd,
    Aborting,
    BattleEnd,
    /// No battle in progress.
    Terminated,
}

impl BattlePhase {
    /// Phases in which a pending forced action runs before anything else.
    pub fn accepts_forced_action(self) -> bool {
        matches!(
            self,
            BattlePhase::Start | BattlePhase::Input | BattlePhase::Turn | BattlePhase::TurnEnd
        )
    }

    /// Phases in which the battle-end check runs every tick.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            BattlePhase::Start
                | BattlePhase::Input
                | BattlePhase::Turn
                | BattlePhase::Action
                | BattlePhase::TurnEnd
                | BattlePhase::Aborting
        )
    }
}

/// Result code handed to the end-of-battle callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum BattleResult {
    Win = 0,
    /// Escape or abort.
    Escape = 1,
    Lose = 2,
}

impl BattleResult {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

type EndCallback = Box<dyn FnMut(BattleResult)>;

/// Drives a single battle through its phases.
pub struct BattleOrchestrator {
    phase: BattlePhase,
    can_escape: bool,
    can_lose: bool,
    preemptive: bool,
    surprise: bool,
    /// Index into the party's battle members of the actor choosing commands.
    actor_index: Option<usize>,
    forced_battler: Option<CombatantRef>,
    turn_forced: bool,
    /// A forced action interrupted input; go back to input once it ends.
    resume_input: bool,
    action_battlers: VecDeque<CombatantRef>,
    subject: Option<CombatantRef>,
    action: Option<Action>,
    targets: VecDeque<CombatantRef>,
    escape_ratio: f64,
    escaped: bool,
    result: Option<BattleResult>,
    rewards: Rewards,
    game_over: bool,
    presenter: Box<dyn BattlePresenter>,
    visuals: Box<dyn VisualEffects>,
    on_end: Option<EndCallback>,
}

impl Default for BattleOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleOrchestrator {
    pub fn new() -> Self {
        Self {
            phase: BattlePhase::Terminated,
            can_escape: false,
            can_lose: false,
            preemptive: false,
            surprise: false,
            actor_index: None,
            forced_battler: None,
            turn_forced: false,
            resume_input: false,
            action_battlers: VecDeque::new(),
            subject: None,
            action: None,
            targets: VecDeque::new(),
            escape_ratio: 0.0,
            escaped: false,
            result: None,
            rewards: Rewards::default(),
            game_over: false,
            presenter: Box::new(NullPresenter),
            visuals: Box::new(NullVisuals),
            on_end: None,
        }
    }

    #[must_use]
    pub fn with_presenter(mut self, presenter: impl BattlePresenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    #[must_use]
    pub fn with_visuals(mut self, visuals: impl VisualEffects + 'static) -> Self {
        self.visuals = Box::new(visuals);
        self
    }

    /// Registers the callback invoked once with the battle result.
    pub fn set_end_callback(&mut self, callback: impl FnMut(BattleResult) + 'static) {
        self.on_end = Some(Box::new(callback));
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Builds the troop from its definition and resets all flow state.
    ///
    /// Enemy names get letter suffixes when a template repeats; the escape
    /// ratio is computed once here from both groups' average agility.
    pub fn setup(
        &mut self,
        ctx: &mut BattleContext,
        env: &BattleEnv<'_>,
        troop_id: TroopId,
        can_escape: bool,
        can_lose: bool,
    ) -> Result<(), SetupError> {
        let troop = build_troop(env.data(), troop_id)?;
        self.reset();
        self.can_escape = can_escape;
        self.can_lose = can_lose;
        ctx.troop = troop;
        ctx.reset_turn_count();
        self.escape_ratio = env.config().escape_ratio_factor * ctx.party.average_agility()
            / ctx.troop.average_agility();
        self.set_phase(BattlePhase::Init);
        tracing::info!(
            troop = %troop_id,
            enemies = ctx.troop.len(),
            can_escape,
            can_lose,
            escape_ratio = self.escape_ratio,
            "battle set up"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.can_escape = false;
        self.can_lose = false;
        self.preemptive = false;
        self.surprise = false;
        self.actor_index = None;
        self.forced_battler = None;
        self.turn_forced = false;
        self.resume_input = false;
        self.action_battlers.clear();
        self.subject = None;
        self.action = None;
        self.targets.clear();
        self.escape_ratio = 0.0;
        self.escaped = false;
        self.result = None;
        self.rewards = Rewards::default();
        self.game_over = false;
    }

    // ========================================================================
    // Main loop
    // ========================================================================

    /// Performs at most one phase step. No-op while a collaborator is busy.
    pub fn update(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        if self.is_busy() {
            return;
        }
        if self.phase.accepts_forced_action() && self.forced_battler.is_some() {
            self.process_forced_action(ctx, env);
            return;
        }
        if self.phase.is_live() && self.check_battle_end(ctx, env) {
            return;
        }
        match self.phase {
            BattlePhase::Init => self.start_battle(ctx, env),
            BattlePhase::Start => self.start_input(ctx, env),
            BattlePhase::Turn => self.update_turn(ctx, env),
            BattlePhase::Action => self.update_action(ctx, env),
            BattlePhase::TurnEnd => self.start_input(ctx, env),
            BattlePhase::BattleEnd => self.update_battle_end(ctx),
            // input waits for commands; aborting is handled by the end check
            BattlePhase::Input | BattlePhase::Aborting | BattlePhase::Terminated => {}
        }
    }

    fn start_battle(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        self.set_phase(BattlePhase::Start);
        ctx.party.on_battle_start(env.config(), env.rng());
        ctx.troop.on_battle_start(env.config(), env.rng());
        let event = BattleEvent::BattleStart {
            enemy_names: ctx.troop.alive_names(),
            preemptive: self.preemptive,
            surprise: self.surprise,
        };
        self.notify(event);
        tracing::info!(
            party = ctx.party.members().count(),
            troop = ctx.troop.members().count(),
            preemptive = self.preemptive,
            surprise = self.surprise,
            "battle start"
        );
    }

    pub(crate) fn set_phase(&mut self, phase: BattlePhase) {
        if self.phase != phase {
            tracing::debug!(from = %self.phase, to = %phase, "phase transition");
        }
        self.phase = phase;
    }

    pub(crate) fn notify(&mut self, event: BattleEvent) {
        self.presenter.notify(&event);
    }

    // ========================================================================
    // Interrupts
    // ========================================================================

    /// Requests an immediate action from `battler`, taken from its current
    /// queued action. The battler leaves the turn order if it was in it.
    pub fn force_action(&mut self, battler: CombatantRef) {
        self.forced_battler = Some(battler);
        self.action_battlers.retain(|queued| *queued != battler);
        tracing::debug!(battler = %battler, "action forced");
    }

    pub fn is_action_forced(&self) -> bool {
        self.forced_battler.is_some()
    }

    /// Ends the battle as an escape on the next update.
    ///
    /// Ignored once the battle has ended or before it has been set up.
    pub fn abort(&mut self) {
        if !(self.phase.is_live() || self.phase == BattlePhase::Init) {
            tracing::debug!(phase = %self.phase, "abort ignored");
            return;
        }
        self.set_phase(BattlePhase::Aborting);
    }

    // ========================================================================
    // Predicates and accessors
    // ========================================================================

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.presenter.is_busy() || self.visuals.is_busy()
    }

    pub fn is_inputting(&self) -> bool {
        self.phase == BattlePhase::Input
    }

    pub fn is_in_turn(&self) -> bool {
        self.phase == BattlePhase::Turn
    }

    pub fn is_turn_end(&self) -> bool {
        self.phase == BattlePhase::TurnEnd
    }

    pub fn is_aborting(&self) -> bool {
        self.phase == BattlePhase::Aborting
    }

    pub fn is_battle_end(&self) -> bool {
        self.phase == BattlePhase::BattleEnd
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == BattlePhase::Terminated
    }

    pub fn can_escape(&self) -> bool {
        self.can_escape
    }

    pub fn can_lose(&self) -> bool {
        self.can_lose
    }

    pub fn is_preemptive(&self) -> bool {
        self.preemptive
    }

    pub fn is_surprise(&self) -> bool {
        self.surprise
    }

    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    pub fn is_forced_turn(&self) -> bool {
        self.turn_forced
    }

    pub fn escape_ratio(&self) -> f64 {
        self.escape_ratio
    }

    pub fn result(&self) -> Option<BattleResult> {
        self.result
    }

    /// Set when the party was wiped in a battle it was not allowed to lose.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Remaining turn order for the current turn.
    pub fn action_battlers(&self) -> impl Iterator<Item = CombatantRef> + '_ {
        self.action_battlers.iter().copied()
    }

    pub fn subject(&self) -> Option<CombatantRef> {
        self.subject
    }

    /// Action being resolved in the action phase.
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn pending_targets(&self) -> impl Iterator<Item = CombatantRef> + '_ {
        self.targets.iter().copied()
    }

    /// SHA-256 over every combatant's resources, states, and buffs plus the
    /// turn count. Equal digests mean equal battle state.
    pub fn state_digest(&self, ctx: &BattleContext) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for member in ctx.party.all_members().iter().chain(ctx.troop.all_members()) {
            member.digest_into(&mut hasher);
        }
        hasher.update(ctx.turn_count().to_le_bytes());
        hasher.finalize().into()
    }
}

/// Instantiates the troop's enemies in formation order.
fn build_troop(data: &dyn DataOracle, troop_id: TroopId) -> Result<Group, SetupError> {
    let definition = data.require_troop(troop_id)?;
    if definition.members.is_empty() {
        return Err(SetupError::EmptyTroop(troop_id));
    }
    let mut troop = Group::new(Side::Enemy);
    for member in &definition.members {
        let enemy = data.require_enemy(member.enemy)?;
        troop.add_member(Combatant::from_enemy(enemy, member.hidden));
    }
    troop.make_unique_names();
    Ok(troop)
}
