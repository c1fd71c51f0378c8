//! Turn order, per-subject processing, and the action phase.

use crate::action::{Action, HitRoute};
use crate::combatant::CombatantRef;
use crate::context::BattleContext;
use crate::env::{BattleEnv, BattleEvent, Scope, UsableRef};
use crate::outcome::Outcome;

use super::{BattleOrchestrator, BattlePhase};

impl BattleOrchestrator {
    // ========================================================================
    // Turn start
    // ========================================================================

    /// Enters the turn phase and builds this turn's action order.
    pub(crate) fn start_turn(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        self.set_phase(BattlePhase::Turn);
        self.actor_index = None;
        self.subject = None;
        ctx.increase_turn();
        self.make_action_orders(ctx, env);
        self.notify(BattleEvent::TurnStart {
            turn: ctx.turn_count(),
        });
    }

    /// Collects party (unless surprised) then troop (unless preemptive) and
    /// stable-sorts them by descending speed.
    ///
    /// A combatant's speed is the slowest of its queued actions. One with no
    /// queued actions sorts first.
    fn make_action_orders(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        let mut battlers: Vec<CombatantRef> = Vec::new();
        if !self.surprise {
            battlers.extend(ctx.party.member_refs());
        }
        if !self.preemptive {
            battlers.extend(ctx.troop.member_refs());
        }

        let mut ordered: Vec<(CombatantRef, i32)> = Vec::with_capacity(battlers.len());
        for battler in battlers {
            let actions: Vec<Action> = ctx
                .combatant(battler)
                .map(|c| c.actions().to_vec())
                .unwrap_or_default();
            let speed = actions
                .iter()
                .map(|action| action.speed(ctx, env))
                .min()
                .unwrap_or(i32::MAX);
            if let Some(combatant) = ctx.combatant_mut(battler) {
                combatant.set_speed(speed);
            }
            ordered.push((battler, speed));
        }
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        self.action_battlers = ordered.into_iter().map(|(battler, _)| battler).collect();
        tracing::debug!(
            order = ?self.action_battlers.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "action order"
        );
    }

    // ========================================================================
    // Turn processing
    // ========================================================================

    pub(crate) fn update_turn(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        if self.subject.is_none() {
            self.subject = self.next_subject(ctx);
        }
        match self.subject {
            Some(subject) => self.process_turn(subject, ctx, env),
            None => self.end_turn(ctx, env),
        }
    }

    /// Next queued battler that is still an alive battle member.
    fn next_subject(&mut self, ctx: &BattleContext) -> Option<CombatantRef> {
        while let Some(battler) = self.action_battlers.pop_front() {
            let eligible = ctx.group(battler.side).is_battle_member(battler.index)
                && ctx.combatant(battler).is_some_and(|c| c.is_alive());
            if eligible {
                return Some(battler);
            }
        }
        None
    }

    fn process_turn(
        &mut self,
        subject: CombatantRef,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) {
        let current = ctx
            .combatant(subject)
            .and_then(|c| c.current_action().cloned());
        match current {
            Some(mut action) => {
                action.prepare(ctx);
                if action.is_valid(ctx, env.data()) {
                    self.start_action(subject, action, ctx, env);
                } else {
                    tracing::debug!(subject = %subject, usable = ?action.usable(), "skipping invalid action");
                }
                if let Some(combatant) = ctx.combatant_mut(subject) {
                    combatant.remove_current_action();
                }
            }
            None => {
                if let Some(combatant) = ctx.combatant_mut(subject) {
                    combatant.on_all_actions_end();
                }
                self.report_status(subject, ctx);
                self.subject = self.next_subject(ctx);
            }
        }
    }

    /// Turn-end hooks for every battle member, then the turn-end phase.
    fn end_turn(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        self.set_phase(BattlePhase::TurnEnd);
        self.preemptive = false;
        self.surprise = false;
        for member in ctx.battle_members() {
            if let Some(combatant) = ctx.combatant_mut(member) {
                combatant.on_turn_end(self.turn_forced, env.config());
            }
            self.report_status(member, ctx);
        }
        self.turn_forced = false;
        self.notify(BattleEvent::TurnEnd {
            turn: ctx.turn_count(),
        });
    }

    /// Reports regeneration and automatic state changes, if any happened.
    fn report_status(&mut self, combatant: CombatantRef, ctx: &BattleContext) {
        let Some(outcome) = ctx.combatant(combatant).map(|c| c.result().clone()) else {
            return;
        };
        if outcome != Outcome::default() {
            self.notify(BattleEvent::StatusChanged { combatant, outcome });
        }
    }

    // ========================================================================
    // Action phase
    // ========================================================================

    /// Resolves targets, pays the cost, and enters the action phase.
    ///
    /// An action with a scope but no legal target is dropped without cost;
    /// returns whether the action phase was entered.
    pub(crate) fn start_action(
        &mut self,
        subject: CombatantRef,
        action: Action,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) -> bool {
        let data = env.data();
        let Some(usable) = action.usable() else {
            return false;
        };
        let scope = action.definition(data).map_or(Scope::None, |def| def.scope);
        let targets = action.make_targets(ctx, env);
        if targets.is_empty() && scope != Scope::None {
            tracing::debug!(subject = %subject, usable = ?usable, "no legal targets, action dropped");
            return false;
        }

        match usable {
            UsableRef::Skill(id) => {
                if let Some(skill) = data.skill(id)
                    && let Some(combatant) = ctx.combatant_mut(subject)
                {
                    combatant.pay_skill_cost(skill);
                }
            }
            UsableRef::Item(id) => {
                if let Some(item) = data.item(id) {
                    ctx.consume_item(item);
                }
            }
        }
        action.apply_global(ctx, data);

        self.set_phase(BattlePhase::Action);
        self.subject = Some(subject);
        self.targets = targets.iter().copied().collect();
        self.action = Some(action);
        self.notify(BattleEvent::ActionStart {
            subject,
            usable,
            targets,
        });
        true
    }

    pub(crate) fn update_action(&mut self, ctx: &mut BattleContext, env: &mut BattleEnv<'_>) {
        match self.targets.pop_front() {
            Some(target) => self.invoke_action(target, ctx, env),
            None => self.end_action(),
        }
    }

    /// Resolves the current action against one target and reports it.
    fn invoke_action(
        &mut self,
        target: CombatantRef,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) {
        let Some(action) = self.action.as_mut() else {
            return;
        };
        let subject = action.subject();
        let Some(report) = action.resolve_hit(target, ctx, env) else {
            return;
        };

        match report.route {
            HitRoute::Counter => self.notify(BattleEvent::Counter {
                counterer: report.actor,
                target: report.recipient,
            }),
            HitRoute::Reflection => self.notify(BattleEvent::Reflection {
                reflector: report.actor,
                subject: report.recipient,
            }),
            HitRoute::Normal => {
                if let Some(original) = report.substitute_for {
                    self.notify(BattleEvent::Substitute {
                        substitute: report.recipient,
                        target: original,
                    });
                }
            }
        }
        tracing::debug!(
            route = %report.route,
            actor = %report.actor,
            recipient = %report.recipient,
            hit = report.outcome.is_hit(),
            hp_damage = report.outcome.hp_damage,
            mp_damage = report.outcome.mp_damage,
            "action result"
        );
        self.notify(BattleEvent::ActionResult {
            subject: report.actor,
            target: report.recipient,
            outcome: report.outcome,
        });

        if let Some(combatant) = ctx.combatant_mut(subject) {
            combatant.set_last_target_index(Some(target.index));
        }
    }

    fn end_action(&mut self) {
        if let Some(subject) = self.subject {
            self.notify(BattleEvent::ActionEnd { subject });
        }
        self.action = None;
        if self.resume_input {
            self.resume_input = false;
            self.subject = None;
            self.set_phase(BattlePhase::Input);
        } else {
            self.set_phase(BattlePhase::Turn);
        }
    }

    // ========================================================================
    // Forced actions
    // ========================================================================

    /// Runs the forced battler's current action right away.
    ///
    /// After the action the battler keeps acting through its remaining queue
    /// in the turn phase, unless input was interrupted, in which case input
    /// resumes.
    pub(crate) fn process_forced_action(
        &mut self,
        ctx: &mut BattleContext,
        env: &mut BattleEnv<'_>,
    ) {
        let Some(battler) = self.forced_battler.take() else {
            return;
        };
        self.turn_forced = true;
        let from_input = self.phase == BattlePhase::Input;
        self.subject = Some(battler);

        let current = ctx
            .combatant(battler)
            .and_then(|c| c.current_action().cloned());
        let started = match current {
            Some(action) => self.start_action(battler, action, ctx, env),
            None => false,
        };
        if let Some(combatant) = ctx.combatant_mut(battler) {
            combatant.remove_current_action();
        }

        if from_input {
            if started {
                self.resume_input = true;
            } else {
                self.subject = None;
            }
        }
        tracing::debug!(battler = %battler, started, "forced action processed");
    }
}
