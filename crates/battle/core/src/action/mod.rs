//! Action: one combatant using one skill or item.
//!
//! An [`Action`] is a small value stored in its subject's queue. It names the
//! subject by [`CombatantRef`] and the usable by [`UsableRef`]; definitions are
//! looked up through the [`DataOracle`] whenever they are needed, so actions
//! never hold borrowed data.
//!
//! Resolution is split by concern:
//! - [`targeting`]: scope rules and the repeated target list
//! - [`hit`]: counter, reflection, substitute, and the hit/evade/critical rolls
//! - [`damage`]: the damage pipeline and HP/MP execution
//! - [`effects`]: effect entries and the user-side TP gain
//! - [`evaluate`]: scoring candidate actions for auto-battle

pub mod damage;
pub mod effects;
pub mod evaluate;
pub mod formula;
pub mod hit;
pub mod targeting;

pub use damage::{apply_critical, apply_guard, apply_variance};
pub use hit::{HitReport, HitRoute};

use crate::combatant::CombatantRef;
use crate::context::BattleContext;
use crate::env::{BattleEnv, DataOracle, UsableDefinition, UsableRef};
use crate::ids::{ItemId, SkillId};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    subject: CombatantRef,
    usable: Option<UsableRef>,
    /// Index chosen during input; `None` means "pick at random".
    target_index: Option<usize>,
    forced: bool,
    /// Reflector credited with drained HP/MP when this action bounced.
    reflection_target: Option<CombatantRef>,
}

impl Action {
    pub fn new(subject: CombatantRef) -> Self {
        Self {
            subject,
            usable: None,
            target_index: None,
            forced: false,
            reflection_target: None,
        }
    }

    /// An action that skips usability checks and confusion.
    pub fn forced(subject: CombatantRef) -> Self {
        Self {
            forced: true,
            ..Self::new(subject)
        }
    }

    /// The basic attack of `subject`.
    pub fn attack(subject: CombatantRef) -> Self {
        let mut action = Self::new(subject);
        action.set_attack();
        action
    }

    pub fn subject(&self) -> CombatantRef {
        self.subject
    }

    pub fn usable(&self) -> Option<UsableRef> {
        self.usable
    }

    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    pub fn reflection_target(&self) -> Option<CombatantRef> {
        self.reflection_target
    }

    pub(crate) fn rebind_subject(&mut self, subject: CombatantRef) {
        self.subject = subject;
    }

    // ========================================================================
    // Setters
    // ========================================================================

    pub fn clear(&mut self) {
        self.usable = None;
        self.target_index = None;
    }

    pub fn set_usable(&mut self, usable: UsableRef) {
        self.usable = Some(usable);
    }

    pub fn set_skill(&mut self, skill: SkillId) {
        self.usable = Some(UsableRef::Skill(skill));
    }

    pub fn set_item(&mut self, item: ItemId) {
        self.usable = Some(UsableRef::Item(item));
    }

    pub fn set_attack(&mut self) {
        self.set_skill(SkillId::ATTACK);
    }

    pub fn set_guard(&mut self) {
        self.set_skill(SkillId::GUARD);
    }

    pub fn set_target(&mut self, target_index: Option<usize>) {
        self.target_index = target_index;
    }

    /// Sets the skill chosen from an enemy action pattern, or clears the slot.
    pub fn set_enemy_action(&mut self, skill: Option<SkillId>) {
        match skill {
            Some(skill) => self.set_skill(skill),
            None => self.clear(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_attack(&self) -> bool {
        self.usable == Some(UsableRef::Skill(SkillId::ATTACK))
    }

    pub fn is_guard(&self) -> bool {
        self.usable == Some(UsableRef::Skill(SkillId::GUARD))
    }

    pub fn is_skill(&self) -> bool {
        self.usable.is_some_and(UsableRef::is_skill)
    }

    pub fn is_item(&self) -> bool {
        self.usable.is_some_and(UsableRef::is_item)
    }

    /// Shared body of the referenced skill or item.
    pub fn definition<'d>(&self, data: &'d dyn DataOracle) -> Option<&'d UsableDefinition> {
        self.usable.and_then(|usable| data.usable(usable))
    }

    /// Rewrites a confused subject's action into a basic attack.
    pub fn prepare(&mut self, ctx: &BattleContext) {
        let confused = ctx
            .combatant(self.subject)
            .is_some_and(|subject| subject.is_confused());
        if confused && !self.forced {
            self.set_attack();
        }
    }

    /// Forced actions only need a known usable; everything else must be usable
    /// by the subject right now.
    pub fn is_valid(&self, ctx: &BattleContext, data: &dyn DataOracle) -> bool {
        (self.forced && self.definition(data).is_some())
            || ctx.can_use(self.subject, self.usable, data)
    }

    /// Turn-order score: agility plus a random bonus, usable speed, and the
    /// attack speed trait for basic attacks.
    pub fn speed(&self, ctx: &BattleContext, env: &mut BattleEnv<'_>) -> i32 {
        let Some(subject) = ctx.combatant(self.subject) else {
            return 0;
        };
        let agi = subject.agi();
        let bonus_range = (5.0 + f64::from(agi) / 4.0).floor().max(0.0) as u32;
        let mut speed = agi + env.random_int(bonus_range) as i32;
        if let Some(def) = self.definition(env.data()) {
            speed += def.speed;
        }
        if self.is_attack() {
            speed += subject.attack_speed() as i32;
        }
        speed
    }

    /// Hits per resolved target: usable repeats plus attack-times for basic attacks.
    pub fn num_repeats(&self, ctx: &BattleContext, data: &dyn DataOracle) -> usize {
        let mut repeats = self.definition(data).map_or(1, |def| def.repeats);
        if self.is_attack()
            && let Some(subject) = ctx.combatant(self.subject)
        {
            repeats += subject.attack_times_add();
        }
        repeats as usize
    }

    /// Battle-wide effects of the usable: reserves its common events.
    pub fn apply_global(&self, ctx: &mut BattleContext, data: &dyn DataOracle) {
        let Some(def) = self.definition(data) else {
            return;
        };
        for effect in &def.effects {
            if let crate::env::Effect::CommonEvent { event } = effect {
                ctx.reserve_common_event(*event);
            }
        }
    }
}
