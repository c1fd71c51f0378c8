//! Strongly typed identifiers for database records.
//!
//! Every definition supplied by the data oracle is addressed by one of these
//! newtypes so a skill id can never be passed where a state id is expected.

macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            #[cfg_attr(feature = "serde", serde(transparent))]
            pub struct $name(pub u32);

            impl $name {
                /// Returns the raw database index.
                pub const fn get(self) -> u32 {
                    self.0
                }
            }

            impl core::fmt::Display for $name {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<u32> for $name {
                fn from(value: u32) -> Self {
                    Self(value)
                }
            }
        )+
    };
}

define_id! {
    /// Skill record id. Skill `1` is the basic attack, `2` is guard.
    SkillId,
    /// Usable (consumable) item record id.
    ItemId,
    /// Status effect record id. State `1` is the death state.
    StateId,
    /// Enemy template id.
    EnemyId,
    /// Troop (enemy formation) id.
    TroopId,
    /// Player character id.
    ActorId,
    /// Damage element id.
    ElementId,
    /// Skill category id (magic, special, ...).
    SkillTypeId,
    /// Common event id reserved by item effects.
    CommonEventId,
}

impl SkillId {
    pub const ATTACK: SkillId = SkillId(1);
    pub const GUARD: SkillId = SkillId(2);
}

impl StateId {
    pub const DEATH: StateId = StateId(1);
}
