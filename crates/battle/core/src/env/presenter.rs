//! Presentation collaborators.
//!
//! The orchestrator never renders anything. It reports what happened through
//! [`BattlePresenter::notify`] and polls both collaborators' busy predicates
//! before doing any phase work.

use std::cell::RefCell;
use std::rc::Rc;

use crate::combatant::CombatantRef;
use crate::engine::{BattleResult, Rewards};
use crate::env::data::UsableRef;
use crate::outcome::Outcome;

/// Notification emitted by the orchestrator, in resolution order.
#[derive(Clone, Debug, PartialEq)]
pub enum BattleEvent {
    BattleStart {
        enemy_names: Vec<String>,
        preemptive: bool,
        surprise: bool,
    },
    InputStart,
    TurnStart {
        turn: u32,
    },
    ActionStart {
        subject: CombatantRef,
        usable: UsableRef,
        targets: Vec<CombatantRef>,
    },
    Counter {
        counterer: CombatantRef,
        target: CombatantRef,
    },
    Reflection {
        reflector: CombatantRef,
        subject: CombatantRef,
    },
    Substitute {
        substitute: CombatantRef,
        target: CombatantRef,
    },
    ActionResult {
        subject: CombatantRef,
        target: CombatantRef,
        outcome: Outcome,
    },
    ActionEnd {
        subject: CombatantRef,
    },
    /// Regeneration or automatic state changes outside an action.
    StatusChanged {
        combatant: CombatantRef,
        outcome: Outcome,
    },
    TurnEnd {
        turn: u32,
    },
    EscapeStart,
    EscapeFailure,
    Victory {
        rewards: Rewards,
    },
    Defeat,
    Escaped,
    BattleEnd {
        result: BattleResult,
    },
}

/// Display/log collaborator.
pub trait BattlePresenter {
    fn notify(&mut self, event: &BattleEvent);

    /// True while a message is still on screen.
    fn is_busy(&self) -> bool {
        false
    }
}

/// Animation collaborator; only its busy predicate matters to the engine.
pub trait VisualEffects {
    fn is_busy(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl BattlePresenter for NullPresenter {
    fn notify(&mut self, _event: &BattleEvent) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullVisuals;

impl VisualEffects for NullVisuals {
    fn is_busy(&self) -> bool {
        false
    }
}

/// Shared event log handle returned by [`RecordingPresenter::shared`].
pub type EventLog = Rc<RefCell<Vec<BattleEvent>>>;

/// Presenter that appends every event to a shared log.
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    log: EventLog,
}

impl RecordingPresenter {
    /// Returns the presenter and a handle to read its log afterwards.
    pub fn shared() -> (Self, EventLog) {
        let log = EventLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl BattlePresenter for RecordingPresenter {
    fn notify(&mut self, event: &BattleEvent) {
        self.log.borrow_mut().push(event.clone());
    }
}
