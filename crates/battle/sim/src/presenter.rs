//! Presenter that narrates battle events through `tracing`.
use std::collections::HashMap;

use battle_core::env::UsableRef;
use battle_core::{BattleContext, BattleEvent, BattlePresenter, CombatantRef, DataSnapshot, Outcome};
use tracing::{debug, info};

/// Logs every orchestrator event with combatant and usable names resolved.
///
/// Names are captured at construction, after the troop is set up, so enemy
/// letter suffixes are included.
pub struct TracingPresenter {
    names: HashMap<CombatantRef, String>,
    usables: HashMap<UsableRef, String>,
}

impl TracingPresenter {
    pub fn new(ctx: &BattleContext, data: &DataSnapshot) -> Self {
        let names = ctx
            .party
            .all_members()
            .iter()
            .chain(ctx.troop.all_members())
            .map(|c| (c.id(), c.name()))
            .collect();

        let skills = data
            .skills
            .values()
            .map(|s| (UsableRef::Skill(s.id), s.usable.name.clone()));
        let items = data
            .items
            .values()
            .map(|i| (UsableRef::Item(i.id), i.usable.name.clone()));
        let usables = skills.chain(items).collect();

        Self { names, usables }
    }

    fn name(&self, id: CombatantRef) -> &str {
        self.names.get(&id).map_or("?", String::as_str)
    }

    fn usable(&self, usable: UsableRef) -> String {
        self.usables
            .get(&usable)
            .cloned()
            .unwrap_or_else(|| format!("{usable:?}"))
    }
}

impl BattlePresenter for TracingPresenter {
    fn notify(&mut self, event: &BattleEvent) {
        match event {
            BattleEvent::BattleStart {
                enemy_names,
                preemptive,
                surprise,
            } => {
                info!(enemies = ?enemy_names, preemptive, surprise, "{} emerged!", enemy_names.join(", "));
            }
            BattleEvent::InputStart => debug!("input"),
            BattleEvent::TurnStart { turn } => info!("── turn {turn} ──"),
            BattleEvent::ActionStart {
                subject,
                usable,
                targets,
            } => {
                let usable = self.usable(*usable);
                let targets: Vec<&str> = targets.iter().map(|t| self.name(*t)).collect();
                info!("{} uses {} on {}", self.name(*subject), usable, targets.join(", "));
            }
            BattleEvent::Counter { counterer, target } => {
                info!("{} counterattacks {}", self.name(*counterer), self.name(*target));
            }
            BattleEvent::Reflection { reflector, subject } => {
                info!("{} reflects the spell back at {}", self.name(*reflector), self.name(*subject));
            }
            BattleEvent::Substitute { substitute, target } => {
                info!("{} protects {}", self.name(*substitute), self.name(*target));
            }
            BattleEvent::ActionResult {
                subject,
                target,
                outcome,
            } => self.log_outcome(*subject, *target, outcome),
            BattleEvent::ActionEnd { subject } => debug!(subject = %subject, "action end"),
            BattleEvent::StatusChanged { combatant, outcome } => {
                info!(
                    hp_damage = outcome.hp_damage,
                    mp_damage = outcome.mp_damage,
                    added = ?outcome.added_states,
                    removed = ?outcome.removed_states,
                    "{} status changed",
                    self.name(*combatant)
                );
            }
            BattleEvent::TurnEnd { turn } => debug!(turn, "turn end"),
            BattleEvent::EscapeStart => info!("The party tries to run"),
            BattleEvent::EscapeFailure => info!("...but could not escape"),
            BattleEvent::Victory { rewards } => {
                info!(
                    exp = rewards.exp,
                    gold = rewards.gold,
                    items = rewards.items.len(),
                    "Victory!"
                );
            }
            BattleEvent::Defeat => info!("The party was defeated"),
            BattleEvent::Escaped => info!("The party escaped"),
            BattleEvent::BattleEnd { result } => debug!(%result, "battle end"),
        }
    }
}

impl TracingPresenter {
    fn log_outcome(&self, subject: CombatantRef, target: CombatantRef, outcome: &Outcome) {
        let target_name = self.name(target);
        if outcome.is_missed() {
            info!("{} missed {}", self.name(subject), target_name);
        } else if outcome.is_evaded() {
            info!("{} evaded the attack", target_name);
        } else {
            info!(
                critical = outcome.is_critical(),
                hp_damage = outcome.hp_damage,
                mp_damage = outcome.mp_damage,
                tp_damage = outcome.tp_damage,
                added = ?outcome.added_states,
                removed = ?outcome.removed_states,
                "{} → {}",
                self.name(subject),
                target_name
            );
        }
    }
}
