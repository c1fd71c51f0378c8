//! Parameter kinds and the per-combatant base parameter table.
//!
//! Short names (`mhp`, `atk`, `hit`, `pdr`, ...) double as the property names
//! damage formulas use on `a` and `b`.

use crate::config::BattleConfig;

/// The eight alterable base parameters. Each one can carry a buff stage.
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
#[strum(ascii_case_insensitive)]
pub enum ParamKind {
    #[strum(serialize = "mhp")]
    MaxHp,
    #[strum(serialize = "mmp")]
    MaxMp,
    #[strum(serialize = "atk")]
    Attack,
    #[strum(serialize = "def")]
    Defense,
    #[strum(serialize = "mat")]
    MagicAttack,
    #[strum(serialize = "mdf")]
    MagicDefense,
    #[strum(serialize = "agi")]
    Agility,
    #[strum(serialize = "luk")]
    Luck,
}

impl ParamKind {
    pub const ALL: [ParamKind; BattleConfig::PARAM_COUNT] = [
        ParamKind::MaxHp,
        ParamKind::MaxMp,
        ParamKind::Attack,
        ParamKind::Defense,
        ParamKind::MagicAttack,
        ParamKind::MagicDefense,
        ParamKind::Agility,
        ParamKind::Luck,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower clamp bound. Max MP may drop to zero, everything else stays at 1.
    pub const fn min_value(self) -> i32 {
        match self {
            ParamKind::MaxMp => 0,
            _ => 1,
        }
    }

    pub const fn max_value(self) -> i32 {
        match self {
            ParamKind::MaxHp => 999_999,
            ParamKind::MaxMp => 9_999,
            _ => 999,
        }
    }
}

/// Additive rates summed over traits (hit, evasion, critical, regeneration...).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum ExParamKind {
    #[strum(serialize = "hit")]
    Hit,
    #[strum(serialize = "eva")]
    Evasion,
    #[strum(serialize = "cri")]
    Critical,
    #[strum(serialize = "cev")]
    CriticalEvasion,
    #[strum(serialize = "mev")]
    MagicEvasion,
    #[strum(serialize = "mrf")]
    MagicReflection,
    #[strum(serialize = "cnt")]
    Counter,
    #[strum(serialize = "hrg")]
    HpRegen,
    #[strum(serialize = "mrg")]
    MpRegen,
    #[strum(serialize = "trg")]
    TpRegen,
}

/// Multiplicative rates multiplied over traits (target rate, guard, recovery...).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum SpParamKind {
    #[strum(serialize = "tgr")]
    TargetRate,
    #[strum(serialize = "grd")]
    GuardEffect,
    #[strum(serialize = "rec")]
    RecoveryEffect,
    #[strum(serialize = "pha")]
    Pharmacology,
    #[strum(serialize = "mcr")]
    MpCostRate,
    #[strum(serialize = "tcr")]
    TpChargeRate,
    #[strum(serialize = "pdr")]
    PhysicalDamageRate,
    #[strum(serialize = "mdr")]
    MagicalDamageRate,
    #[strum(serialize = "fdr")]
    FloorDamageRate,
    #[strum(serialize = "exr")]
    ExperienceRate,
}

/// Unmodified base parameters of a combatant, indexed by [`ParamKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BaseParams(pub [i32; BattleConfig::PARAM_COUNT]);

impl BaseParams {
    pub const fn new(values: [i32; BattleConfig::PARAM_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, kind: ParamKind) -> i32 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: ParamKind, value: i32) {
        self.0[kind.index()] = value;
    }

    pub fn add(&mut self, kind: ParamKind, value: i32) {
        let slot = &mut self.0[kind.index()];
        *slot = slot.saturating_add(value);
    }
}
