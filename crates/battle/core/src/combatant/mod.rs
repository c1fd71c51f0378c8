//! Combatant: one participant (player character or enemy) in a battle.
//!
//! A combatant owns its stats, active states, buff stages, queued actions, and
//! its Outcome Record. Effective parameters are never cached; they are folded
//! on demand from base values, traits, and buffs so a state change is
//! reflected immediately.
//!
//! Operations are split by concern:
//! - [`status`]: state add/remove and turn counting
//! - [`buffs`]: buff/debuff stages
//! - [`resources`]: HP/MP/TP mutation, death, regeneration
//! - [`lifecycle`]: action queue, costs, and battle hooks

pub mod buffs;
pub mod lifecycle;
pub mod profile;
pub mod resources;
pub mod status;

use arrayvec::ArrayVec;
use sha2::{Digest, Sha256};

use crate::action::Action;
use crate::action::formula::FormulaOperand;
use crate::config::BattleConfig;
use crate::env::{ActorDefinition, EnemyDefinition};
use crate::env::Restriction;
use crate::ids::{ElementId, SkillId, SkillTypeId, StateId};
use crate::outcome::Outcome;
use crate::stats::traits::{self, PartyAbility, SpecialFlag, Trait};
use crate::stats::{BaseParams, ExParamKind, ParamKind, SpParamKind};

pub use buffs::BuffTable;
pub use profile::{AllyProfile, EnemyProfile, Profile};
pub use status::{ActiveState, StateTable};

/// Which group a combatant fights for.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Side {
    Ally,
    Enemy,
}

impl Side {
    pub const fn opponent(self) -> Side {
        match self {
            Side::Ally => Side::Enemy,
            Side::Enemy => Side::Ally,
        }
    }
}

/// Stable identity of a combatant: its side and index within its group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantRef {
    pub side: Side,
    pub index: usize,
}

impl CombatantRef {
    pub const fn new(side: Side, index: usize) -> Self {
        Self { side, index }
    }

    pub const fn ally(index: usize) -> Self {
        Self::new(Side::Ally, index)
    }

    pub const fn enemy(index: usize) -> Self {
        Self::new(Side::Enemy, index)
    }
}

impl core::fmt::Display for CombatantRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.side, self.index)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    id: CombatantRef,
    name: String,
    profile: Profile,
    params: BaseParams,
    param_plus: BaseParams,
    traits: Vec<Trait>,
    hp: i32,
    mp: i32,
    tp: i32,
    hidden: bool,
    states: StateTable,
    buffs: BuffTable,
    actions: ArrayVec<Action, { BattleConfig::MAX_ACTIONS }>,
    action_input_index: usize,
    speed: i32,
    result: Outcome,
    last_target_index: Option<usize>,
}

impl Combatant {
    /// Creates a combatant at full HP/MP with no database backing.
    pub fn new(name: impl Into<String>, side: Side, params: BaseParams) -> Self {
        let mut combatant = Self {
            id: CombatantRef::new(side, 0),
            name: name.into(),
            profile: Profile::Plain,
            params,
            param_plus: BaseParams::default(),
            traits: Vec::new(),
            hp: 0,
            mp: 0,
            tp: 0,
            hidden: false,
            states: StateTable::default(),
            buffs: BuffTable::default(),
            actions: ArrayVec::new(),
            action_input_index: 0,
            speed: 0,
            result: Outcome::default(),
            last_target_index: None,
        };
        combatant.recover_all();
        combatant
    }

    pub fn from_actor(def: &ActorDefinition) -> Self {
        let mut combatant = Self::new(def.name.clone(), Side::Ally, def.params);
        combatant.profile = Profile::Ally(AllyProfile::from_definition(def));
        combatant.traits = def.traits.clone();
        combatant.recover_all();
        combatant
    }

    pub fn from_enemy(def: &EnemyDefinition, hidden: bool) -> Self {
        let mut combatant = Self::new(def.name.clone(), Side::Enemy, def.params);
        combatant.profile = Profile::Enemy(EnemyProfile::from_definition(def));
        combatant.traits = def.traits.clone();
        combatant.hidden = hidden;
        combatant.recover_all();
        combatant
    }

    #[must_use]
    pub fn with_traits(mut self, traits: Vec<Trait>) -> Self {
        self.traits = traits;
        self.refresh();
        self
    }

    #[must_use]
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.set_hp(hp);
        self
    }

    #[must_use]
    pub fn with_mp(mut self, mp: i32) -> Self {
        self.set_mp(mp);
        self
    }

    // ========================================================================
    // Identity
    // ========================================================================

    pub fn id(&self) -> CombatantRef {
        self.id
    }

    pub fn side(&self) -> Side {
        self.id.side
    }

    pub fn index(&self) -> usize {
        self.id.index
    }

    pub(crate) fn assign_slot(&mut self, side: Side, index: usize) {
        self.id = CombatantRef::new(side, index);
        for action in &mut self.actions {
            action.rebind_subject(self.id);
        }
    }

    /// Display name, including the enemy letter suffix if any.
    pub fn name(&self) -> String {
        match &self.profile {
            Profile::Enemy(enemy) if !enemy.letter.is_empty() => {
                format!("{} {}", enemy.original_name, enemy.letter)
            }
            _ => self.name.clone(),
        }
    }

    pub fn is_actor(&self) -> bool {
        self.id.side == Side::Ally
    }

    pub fn is_enemy(&self) -> bool {
        self.id.side == Side::Enemy
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn ally_profile(&self) -> Option<&AllyProfile> {
        match &self.profile {
            Profile::Ally(p) => Some(p),
            _ => None,
        }
    }

    pub fn ally_profile_mut(&mut self) -> Option<&mut AllyProfile> {
        match &mut self.profile {
            Profile::Ally(p) => Some(p),
            _ => None,
        }
    }

    pub fn enemy_profile(&self) -> Option<&EnemyProfile> {
        match &self.profile {
            Profile::Enemy(p) => Some(p),
            _ => None,
        }
    }

    pub fn enemy_profile_mut(&mut self) -> Option<&mut EnemyProfile> {
        match &mut self.profile {
            Profile::Enemy(p) => Some(p),
            _ => None,
        }
    }

    pub fn level(&self) -> Option<u32> {
        self.ally_profile().map(|p| p.level)
    }

    pub fn result(&self) -> &Outcome {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut Outcome {
        &mut self.result
    }

    pub fn clear_result(&mut self) {
        self.result.clear();
    }

    pub fn last_target_index(&self) -> Option<usize> {
        self.last_target_index
    }

    pub fn set_last_target_index(&mut self, index: Option<usize>) {
        self.last_target_index = index;
    }

    // ========================================================================
    // Traits and parameters
    // ========================================================================

    /// Intrinsic traits followed by the traits of every active state.
    pub fn all_traits(&self) -> impl Iterator<Item = &Trait> {
        self.traits
            .iter()
            .chain(self.states.iter().flat_map(|s| s.definition.traits.iter()))
    }

    pub fn param_base(&self, param: ParamKind) -> i32 {
        self.params.get(param)
    }

    pub fn param_plus(&self, param: ParamKind) -> i32 {
        self.param_plus.get(param)
    }

    /// Permanent growth (from items or effects).
    pub fn add_param(&mut self, param: ParamKind, value: i32) {
        self.param_plus.add(param, value);
        self.refresh();
    }

    pub fn param_rate(&self, param: ParamKind) -> f64 {
        traits::product(self.all_traits(), |t| match t {
            Trait::ParamRate { param: p, rate } if *p == param => Some(*rate),
            _ => None,
        })
    }

    /// Effective parameter: base and growth scaled by traits and buff stage,
    /// clamped, then rounded.
    pub fn param(&self, param: ParamKind) -> i32 {
        let base = f64::from(self.param_base(param) + self.param_plus(param));
        let value = base * self.param_rate(param) * self.buffs.rate(param);
        let clamped = value.clamp(
            f64::from(param.min_value()),
            f64::from(param.max_value()),
        );
        clamped.round() as i32
    }

    pub fn mhp(&self) -> i32 {
        self.param(ParamKind::MaxHp)
    }

    pub fn mmp(&self) -> i32 {
        self.param(ParamKind::MaxMp)
    }

    pub fn agi(&self) -> i32 {
        self.param(ParamKind::Agility)
    }

    pub fn luk(&self) -> i32 {
        self.param(ParamKind::Luck)
    }

    pub fn ex_param(&self, param: ExParamKind) -> f64 {
        traits::sum(self.all_traits(), |t| match t {
            Trait::ExParam { param: p, value } if *p == param => Some(*value),
            _ => None,
        })
    }

    pub fn sp_param(&self, param: SpParamKind) -> f64 {
        traits::product(self.all_traits(), |t| match t {
            Trait::SpParam { param: p, rate } if *p == param => Some(*rate),
            _ => None,
        })
    }

    pub fn element_rate(&self, element: ElementId) -> f64 {
        traits::product(self.all_traits(), |t| match t {
            Trait::ElementRate { element: e, rate } if *e == element => Some(*rate),
            _ => None,
        })
    }

    pub fn debuff_rate(&self, param: ParamKind) -> f64 {
        traits::product(self.all_traits(), |t| match t {
            Trait::DebuffRate { param: p, rate } if *p == param => Some(*rate),
            _ => None,
        })
    }

    pub fn state_rate(&self, state: StateId) -> f64 {
        traits::product(self.all_traits(), |t| match t {
            Trait::StateRate { state: s, rate } if *s == state => Some(*rate),
            _ => None,
        })
    }

    pub fn state_resist_set(&self) -> Vec<StateId> {
        traits::collect_set(self.all_traits(), |t| match t {
            Trait::StateResist(s) => Some(*s),
            _ => None,
        })
    }

    pub fn is_state_resisted(&self, state: StateId) -> bool {
        self.state_resist_set().contains(&state)
    }

    /// Elements carried by a basic attack. Unarmed actors strike with element 1.
    pub fn attack_elements(&self) -> Vec<ElementId> {
        let mut elements = traits::collect_set(self.all_traits(), |t| match t {
            Trait::AttackElement(e) => Some(*e),
            _ => None,
        });
        if let Some(ally) = self.ally_profile()
            && !ally.has_weapon
            && !elements.contains(&ElementId(1))
        {
            elements.push(ElementId(1));
        }
        elements
    }

    pub fn attack_states(&self) -> Vec<StateId> {
        traits::collect_set(self.all_traits(), |t| match t {
            Trait::AttackState { state, .. } => Some(*state),
            _ => None,
        })
    }

    pub fn attack_states_rate(&self, state: StateId) -> f64 {
        traits::sum(self.all_traits(), |t| match t {
            Trait::AttackState { state: s, rate } if *s == state => Some(*rate),
            _ => None,
        })
    }

    pub fn attack_speed(&self) -> f64 {
        traits::sum(self.all_traits(), |t| match t {
            Trait::AttackSpeed(v) => Some(*v),
            _ => None,
        })
    }

    pub fn attack_times_add(&self) -> u32 {
        let add = traits::sum(self.all_traits(), |t| match t {
            Trait::AttackTimes(v) => Some(*v),
            _ => None,
        });
        add.max(0.0) as u32
    }

    pub fn action_plus_set(&self) -> Vec<f64> {
        self.all_traits()
            .filter_map(|t| match t {
                Trait::ActionPlus(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn special_flag(&self, flag: SpecialFlag) -> bool {
        self.all_traits()
            .any(|t| matches!(t, Trait::Special(f) if *f == flag))
    }

    pub fn party_ability(&self, ability: PartyAbility) -> bool {
        self.all_traits()
            .any(|t| matches!(t, Trait::Party(a) if *a == ability))
    }

    pub fn is_skill_sealed(&self, skill: SkillId) -> bool {
        self.all_traits()
            .any(|t| matches!(t, Trait::SkillSeal(s) if *s == skill))
    }

    pub fn is_skill_type_sealed(&self, skill_type: SkillTypeId) -> bool {
        self.all_traits()
            .any(|t| matches!(t, Trait::SkillTypeSeal(s) if *s == skill_type))
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_appeared(&self) -> bool {
        !self.hidden
    }

    pub fn appear(&mut self) {
        self.hidden = false;
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    /// Hidden combatants are neither alive nor dead.
    pub fn is_alive(&self) -> bool {
        self.is_appeared() && !self.is_death_state_affected()
    }

    pub fn is_dead(&self) -> bool {
        self.is_appeared() && self.is_death_state_affected()
    }

    /// Alive with less than a quarter of max HP.
    pub fn is_dying(&self) -> bool {
        self.is_alive() && f64::from(self.hp) < f64::from(self.mhp()) / 4.0
    }

    /// Most severe restriction among active states.
    pub fn restriction(&self) -> Restriction {
        self.states
            .iter()
            .map(|s| s.definition.restriction)
            .max()
            .unwrap_or_default()
    }

    pub fn is_restricted(&self) -> bool {
        self.is_appeared() && self.restriction() > Restriction::None
    }

    pub fn can_move(&self) -> bool {
        self.is_appeared() && self.restriction() < Restriction::CannotMove
    }

    pub fn can_input(&self) -> bool {
        self.is_appeared() && !self.is_restricted() && !self.is_auto_battle()
    }

    pub fn is_confused(&self) -> bool {
        self.is_appeared() && self.restriction().is_confusion()
    }

    pub fn is_auto_battle(&self) -> bool {
        self.special_flag(SpecialFlag::AutoBattle)
    }

    pub fn is_guard(&self) -> bool {
        self.special_flag(SpecialFlag::Guard) && self.can_move()
    }

    pub fn is_substitute(&self) -> bool {
        self.special_flag(SpecialFlag::Substitute) && self.can_move()
    }

    pub fn is_preserve_tp(&self) -> bool {
        self.special_flag(SpecialFlag::PreserveTp)
    }

    // ========================================================================
    // Digest
    // ========================================================================

    /// Feeds battle-relevant state into `hasher` in a fixed order.
    pub fn digest_into(&self, hasher: &mut Sha256) {
        hasher.update([self.id.side as u8]);
        hasher.update((self.id.index as u64).to_le_bytes());
        hasher.update(self.hp.to_le_bytes());
        hasher.update(self.mp.to_le_bytes());
        hasher.update(self.tp.to_le_bytes());
        hasher.update([u8::from(self.hidden)]);
        for state in self.states.iter() {
            hasher.update(state.id().get().to_le_bytes());
            hasher.update(state.turns.to_le_bytes());
        }
        for param in ParamKind::ALL {
            hasher.update([self.buffs.level(param) as u8]);
            hasher.update(self.buffs.turns(param).to_le_bytes());
        }
    }
}

impl FormulaOperand for Combatant {
    fn property(&self, name: &str) -> Option<f64> {
        match name {
            "hp" => return Some(f64::from(self.hp)),
            "mp" => return Some(f64::from(self.mp)),
            "tp" => return Some(f64::from(self.tp)),
            "level" => return self.level().map(f64::from),
            _ => {}
        }
        if let Ok(param) = name.parse::<ParamKind>() {
            return Some(f64::from(self.param(param)));
        }
        if let Ok(param) = name.parse::<ExParamKind>() {
            return Some(self.ex_param(param));
        }
        if let Ok(param) = name.parse::<SpParamKind>() {
            return Some(self.sp_param(param));
        }
        None
    }
}
