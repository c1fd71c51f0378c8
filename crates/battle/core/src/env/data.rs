//! Read-only database records supplied by the data provider.
//!
//! Skills and items share a [`UsableDefinition`] body: scope, hit type,
//! damage spec, and effect list. States, enemies, troops, and actors carry the
//! traits that feed combatant parameter computation.

use crate::ids::{
    ActorId, CommonEventId, ElementId, EnemyId, ItemId, SkillId, SkillTypeId, StateId, TroopId,
};
use crate::stats::{BaseParams, ParamKind, Trait};

use super::error::OracleError;

// ============================================================================
// Oracle
// ============================================================================

/// Data provider consumed by the engine.
///
/// Lookups return `None` for unknown ids; callers decide whether a missing
/// record is a setup error or a silently skipped effect.
pub trait DataOracle: Send + Sync {
    fn skill(&self, id: SkillId) -> Option<&SkillDefinition>;
    fn item(&self, id: ItemId) -> Option<&ItemDefinition>;
    fn state(&self, id: StateId) -> Option<&StateDefinition>;
    fn enemy(&self, id: EnemyId) -> Option<&EnemyDefinition>;
    fn troop(&self, id: TroopId) -> Option<&TroopDefinition>;
    fn actor(&self, id: ActorId) -> Option<&ActorDefinition>;

    /// Resolves the shared body of a skill or item reference.
    fn usable(&self, usable: UsableRef) -> Option<&UsableDefinition> {
        match usable {
            UsableRef::Skill(id) => self.skill(id).map(|s| &s.usable),
            UsableRef::Item(id) => self.item(id).map(|i| &i.usable),
        }
    }

    fn require_troop(&self, id: TroopId) -> Result<&TroopDefinition, OracleError> {
        self.troop(id).ok_or(OracleError::TroopNotFound(id))
    }

    fn require_enemy(&self, id: EnemyId) -> Result<&EnemyDefinition, OracleError> {
        self.enemy(id).ok_or(OracleError::EnemyNotFound(id))
    }

    fn require_actor(&self, id: ActorId) -> Result<&ActorDefinition, OracleError> {
        self.actor(id).ok_or(OracleError::ActorNotFound(id))
    }
}

/// Reference to either a skill or a consumable item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UsableRef {
    Skill(SkillId),
    Item(ItemId),
}

impl UsableRef {
    pub fn is_skill(self) -> bool {
        matches!(self, UsableRef::Skill(_))
    }

    pub fn is_item(self) -> bool {
        matches!(self, UsableRef::Item(_))
    }

    pub fn skill_id(self) -> Option<SkillId> {
        match self {
            UsableRef::Skill(id) => Some(id),
            UsableRef::Item(_) => None,
        }
    }
}

// ============================================================================
// Usable body
// ============================================================================

/// Targeting rule of a skill or item.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Scope {
    #[default]
    None,
    OneOpponent,
    AllOpponents,
    /// `n` opponents drawn by weighted random, repeats allowed.
    RandomOpponents(u8),
    OneFriend,
    AllFriends,
    OneDeadFriend,
    AllDeadFriends,
    User,
}

impl Scope {
    /// Maps the classic numeric scope codes (0..=11).
    pub fn from_code(code: u8) -> Option<Scope> {
        Some(match code {
            0 => Scope::None,
            1 => Scope::OneOpponent,
            2 => Scope::AllOpponents,
            3..=6 => Scope::RandomOpponents(code - 2),
            7 => Scope::OneFriend,
            8 => Scope::AllFriends,
            9 => Scope::OneDeadFriend,
            10 => Scope::AllDeadFriends,
            11 => Scope::User,
            _ => return None,
        })
    }

    pub fn is_for_opponent(self) -> bool {
        matches!(
            self,
            Scope::OneOpponent | Scope::AllOpponents | Scope::RandomOpponents(_)
        )
    }

    pub fn is_for_friend(self) -> bool {
        matches!(
            self,
            Scope::OneFriend
                | Scope::AllFriends
                | Scope::OneDeadFriend
                | Scope::AllDeadFriends
                | Scope::User
        )
    }

    pub fn is_for_dead_friend(self) -> bool {
        matches!(self, Scope::OneDeadFriend | Scope::AllDeadFriends)
    }

    pub fn is_for_user(self) -> bool {
        matches!(self, Scope::User)
    }

    pub fn is_for_one(self) -> bool {
        matches!(
            self,
            Scope::OneOpponent | Scope::OneFriend | Scope::OneDeadFriend | Scope::User
        ) || matches!(self, Scope::RandomOpponents(1))
    }

    pub fn is_for_random(self) -> bool {
        matches!(self, Scope::RandomOpponents(_))
    }

    pub fn is_for_all(self) -> bool {
        matches!(
            self,
            Scope::AllOpponents | Scope::AllFriends | Scope::AllDeadFriends
        )
    }

    /// Number of random draws for random scopes; 0 otherwise.
    pub fn random_count(self) -> usize {
        match self {
            Scope::RandomOpponents(n) => n as usize,
            _ => 0,
        }
    }

    /// Whether a player must pick a target index for this scope.
    pub fn needs_selection(self) -> bool {
        matches!(
            self,
            Scope::OneOpponent | Scope::OneFriend | Scope::OneDeadFriend
        )
    }
}

/// Where a usable may be used.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Occasion {
    #[default]
    Always,
    BattleOnly,
    MenuOnly,
    Never,
}

impl Occasion {
    pub fn allows_battle(self) -> bool {
        matches!(self, Occasion::Always | Occasion::BattleOnly)
    }
}

/// How hit and evasion are rolled.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HitType {
    /// Never misses, never evaded, skips luck and guard-by-substitute.
    #[default]
    Certain,
    Physical,
    Magical,
}

/// What resource the damage formula targets and in which direction.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageKind {
    #[default]
    None,
    HpDamage,
    MpDamage,
    HpRecover,
    MpRecover,
    HpDrain,
    MpDrain,
}

impl DamageKind {
    pub fn is_none(self) -> bool {
        matches!(self, DamageKind::None)
    }

    pub fn is_hp_effect(self) -> bool {
        matches!(
            self,
            DamageKind::HpDamage | DamageKind::HpRecover | DamageKind::HpDrain
        )
    }

    pub fn is_mp_effect(self) -> bool {
        matches!(
            self,
            DamageKind::MpDamage | DamageKind::MpRecover | DamageKind::MpDrain
        )
    }

    pub fn is_damage(self) -> bool {
        matches!(self, DamageKind::HpDamage | DamageKind::MpDamage)
    }

    pub fn is_recover(self) -> bool {
        matches!(self, DamageKind::HpRecover | DamageKind::MpRecover)
    }

    pub fn is_drain(self) -> bool {
        matches!(self, DamageKind::HpDrain | DamageKind::MpDrain)
    }

    /// `-1` for recovery, `+1` otherwise.
    pub fn sign(self) -> f64 {
        if self.is_recover() { -1.0 } else { 1.0 }
    }
}

/// Element applied to damage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageElement {
    /// No element; rate is always 1.
    #[default]
    None,
    /// Uses the best rate among the subject's attack elements.
    NormalAttack,
    Element(ElementId),
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageSpec {
    pub kind: DamageKind,
    pub element: DamageElement,
    /// Expression over `a` (subject), `b` (target), and `v` (variables).
    pub formula: String,
    /// Percent spread applied symmetrically.
    pub variance: u32,
    pub critical: bool,
}

/// One effect entry applied on hit, in list order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    RecoverHp { rate: f64, flat: f64 },
    RecoverMp { rate: f64, flat: f64 },
    GainTp { value: f64 },
    AddState { state: StateId, chance: f64 },
    /// Rolls every state in the subject's attack-state list.
    AddAttackStates { chance: f64 },
    RemoveState { state: StateId, chance: f64 },
    AddBuff { param: ParamKind, turns: u32 },
    AddDebuff { param: ParamKind, turns: u32 },
    RemoveBuff { param: ParamKind },
    RemoveDebuff { param: ParamKind },
    /// Target leaves the battle.
    Escape,
    Grow { param: ParamKind, value: i32 },
    LearnSkill { skill: SkillId },
    CommonEvent { event: CommonEventId },
}

/// Shared body of skills and items.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UsableDefinition {
    pub name: String,
    pub scope: Scope,
    pub occasion: Occasion,
    pub speed: i32,
    /// Base success rate in percent.
    pub success_rate: u32,
    pub repeats: u32,
    pub tp_gain: i32,
    pub hit_type: HitType,
    pub damage: DamageSpec,
    pub effects: Vec<Effect>,
}

impl Default for UsableDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            scope: Scope::None,
            occasion: Occasion::Always,
            speed: 0,
            success_rate: 100,
            repeats: 1,
            tp_gain: 0,
            hit_type: HitType::Certain,
            damage: DamageSpec::default(),
            effects: Vec::new(),
        }
    }
}

impl UsableDefinition {
    pub fn is_physical(&self) -> bool {
        self.hit_type == HitType::Physical
    }

    pub fn is_magical(&self) -> bool {
        self.hit_type == HitType::Magical
    }

    pub fn is_certain_hit(&self) -> bool {
        self.hit_type == HitType::Certain
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkillDefinition {
    pub id: SkillId,
    pub usable: UsableDefinition,
    pub skill_type: Option<SkillTypeId>,
    pub mp_cost: i32,
    pub tp_cost: i32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ItemDefinition {
    pub id: ItemId,
    pub usable: UsableDefinition,
    pub consumable: bool,
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self {
            id: ItemId::default(),
            usable: UsableDefinition::default(),
            consumable: true,
        }
    }
}

// ============================================================================
// States
// ============================================================================

/// Movement restriction imposed by a state, ordered by severity.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
pub enum Restriction {
    #[default]
    None,
    AttackEnemy,
    AttackAnyone,
    AttackAlly,
    CannotMove,
}

impl Restriction {
    pub fn is_confusion(self) -> bool {
        matches!(
            self,
            Restriction::AttackEnemy | Restriction::AttackAnyone | Restriction::AttackAlly
        )
    }
}

/// When a state's turn counter is checked for automatic removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AutoRemoval {
    #[default]
    None,
    ActionEnd,
    TurnEnd,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StateMessages {
    pub added: String,
    pub persisting: String,
    pub removed: String,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StateDefinition {
    pub id: StateId,
    pub name: String,
    pub restriction: Restriction,
    pub priority: i32,
    pub remove_at_battle_end: bool,
    pub remove_by_restriction: bool,
    pub auto_removal: AutoRemoval,
    pub min_turns: u32,
    pub max_turns: u32,
    /// Percent chance of removal each time damage is taken.
    pub remove_by_damage: Option<u32>,
    pub traits: Vec<Trait>,
    pub messages: StateMessages,
}

impl Default for StateDefinition {
    fn default() -> Self {
        Self {
            id: StateId::default(),
            name: String::new(),
            restriction: Restriction::None,
            priority: 50,
            remove_at_battle_end: false,
            remove_by_restriction: false,
            auto_removal: AutoRemoval::None,
            min_turns: 1,
            max_turns: 1,
            remove_by_damage: None,
            traits: Vec::new(),
            messages: StateMessages::default(),
        }
    }
}

impl StateDefinition {
    /// Built-in death state used when the provider does not define one.
    pub fn death() -> Self {
        Self {
            id: StateId::DEATH,
            name: "Knockout".into(),
            restriction: Restriction::CannotMove,
            priority: 100,
            remove_at_battle_end: false,
            ..Self::default()
        }
    }
}

// ============================================================================
// Enemies and troops
// ============================================================================

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
pub enum ItemKind {
    #[default]
    Item,
    Weapon,
    Armor,
}

/// Inventory key for any kind of item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: u32,
}

impl ItemKey {
    pub const fn item(id: ItemId) -> Self {
        Self {
            kind: ItemKind::Item,
            id: id.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropItem {
    pub item: ItemKey,
    /// Drops with probability `drop_rate / denominator`.
    pub denominator: u32,
}

/// Precondition for an enemy action pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionCondition {
    #[default]
    Always,
    /// Turn `a + b * x`; with `b == 0` only turn `a`.
    Turn { a: u32, b: u32 },
    HpRate { min: f64, max: f64 },
    MpRate { min: f64, max: f64 },
    State(StateId),
    PartyLevel(u32),
    Switch(u32),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionPattern {
    pub skill: SkillId,
    /// Preference weight in `1..=9`.
    pub rating: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub condition: ActionCondition,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnemyDefinition {
    pub id: EnemyId,
    pub name: String,
    pub params: BaseParams,
    pub exp: u32,
    pub gold: u32,
    pub drops: Vec<DropItem>,
    pub actions: Vec<ActionPattern>,
    pub traits: Vec<Trait>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TroopMember {
    pub enemy: EnemyId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TroopDefinition {
    pub id: TroopId,
    pub name: String,
    pub members: Vec<TroopMember>,
}

// ============================================================================
// Actors
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActorDefinition {
    pub id: ActorId,
    pub name: String,
    pub level: u32,
    pub params: BaseParams,
    /// Class and equipment traits, already merged.
    pub traits: Vec<Trait>,
    pub skills: Vec<SkillId>,
    /// Without a weapon the bare-hands element `1` is added to attacks.
    pub has_weapon: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_codes_map_to_variants() {
        assert_eq!(Scope::from_code(1), Some(Scope::OneOpponent));
        assert_eq!(Scope::from_code(4), Some(Scope::RandomOpponents(2)));
        assert_eq!(Scope::from_code(10), Some(Scope::AllDeadFriends));
        assert_eq!(Scope::from_code(12), None);
    }

    #[test]
    fn scope_classification() {
        assert!(Scope::RandomOpponents(1).is_for_one());
        assert!(!Scope::RandomOpponents(3).is_for_one());
        assert!(Scope::User.is_for_friend());
        assert!(Scope::AllDeadFriends.is_for_dead_friend());
        assert!(Scope::AllOpponents.is_for_all());
        assert_eq!(Scope::RandomOpponents(4).random_count(), 4);
        assert!(!Scope::None.is_for_opponent() && !Scope::None.is_for_friend());
    }

    #[test]
    fn damage_kind_sign_and_class() {
        assert_eq!(DamageKind::HpRecover.sign(), -1.0);
        assert_eq!(DamageKind::HpDrain.sign(), 1.0);
        assert!(DamageKind::MpDrain.is_mp_effect());
        assert!(DamageKind::HpDrain.is_drain());
        assert!(DamageKind::None.is_none());
    }

    #[test]
    fn restriction_ordering() {
        assert!(Restriction::CannotMove > Restriction::AttackAlly);
        assert!(Restriction::AttackAnyone.is_confusion());
        assert!(!Restriction::CannotMove.is_confusion());
    }
}
