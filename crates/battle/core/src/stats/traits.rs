//! Trait modifiers attached to actors, enemies, and states.
//!
//! A combatant's effective rates are folded from every trait it carries:
//! rates multiply, ex-parameters add, and set-style traits collect ids.

use crate::ids::{ElementId, SkillId, SkillTypeId, StateId};

use super::params::{ExParamKind, ParamKind, SpParamKind};

/// Boolean behaviors toggled by traits.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SpecialFlag {
    /// Actions are chosen automatically instead of by player input.
    AutoBattle,
    /// Halves (further scaled by guard effect) incoming positive damage.
    Guard,
    /// Covers dying allies from non-certain hits.
    Substitute,
    /// TP carries over between battles.
    PreserveTp,
}

/// Group-wide abilities; active if any battle member carries them.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PartyAbility {
    EncounterHalf,
    EncounterNone,
    CancelSurprise,
    RaisePreemptive,
    GoldDouble,
    DropItemDouble,
}

/// A single modifier record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trait {
    ElementRate { element: ElementId, rate: f64 },
    DebuffRate { param: ParamKind, rate: f64 },
    StateRate { state: StateId, rate: f64 },
    StateResist(StateId),
    ParamRate { param: ParamKind, rate: f64 },
    ExParam { param: ExParamKind, value: f64 },
    SpParam { param: SpParamKind, rate: f64 },
    AttackElement(ElementId),
    AttackState { state: StateId, rate: f64 },
    AttackSpeed(f64),
    AttackTimes(f64),
    SkillTypeAdd(SkillTypeId),
    SkillTypeSeal(SkillTypeId),
    SkillAdd(SkillId),
    SkillSeal(SkillId),
    /// Chance of one extra action per turn.
    ActionPlus(f64),
    Special(SpecialFlag),
    Party(PartyAbility),
}

// ============================================================================
// Aggregation
// ============================================================================

/// Product of every value `select` extracts; 1.0 when none match.
pub fn product<'a, I, F>(traits: I, select: F) -> f64
where
    I: IntoIterator<Item = &'a Trait>,
    F: Fn(&Trait) -> Option<f64>,
{
    traits.into_iter().filter_map(select).product()
}

/// Sum of every value `select` extracts; 0.0 when none match.
pub fn sum<'a, I, F>(traits: I, select: F) -> f64
where
    I: IntoIterator<Item = &'a Trait>,
    F: Fn(&Trait) -> Option<f64>,
{
    traits.into_iter().filter_map(select).sum()
}

/// Deduplicated ids collected in first-seen order.
pub fn collect_set<'a, I, T, F>(traits: I, select: F) -> Vec<T>
where
    I: IntoIterator<Item = &'a Trait>,
    T: PartialEq,
    F: Fn(&Trait) -> Option<T>,
{
    let mut out = Vec::new();
    for value in traits.into_iter().filter_map(select) {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Trait> {
        vec![
            Trait::ElementRate {
                element: ElementId(2),
                rate: 0.5,
            },
            Trait::ElementRate {
                element: ElementId(2),
                rate: 2.0,
            },
            Trait::ExParam {
                param: ExParamKind::Hit,
                value: 0.95,
            },
            Trait::ExParam {
                param: ExParamKind::Hit,
                value: 0.05,
            },
            Trait::AttackElement(ElementId(3)),
            Trait::AttackElement(ElementId(3)),
            Trait::AttackElement(ElementId(4)),
        ]
    }

    #[test]
    fn product_multiplies_matching_rates() {
        let traits = sample();
        let rate = product(&traits, |t| match t {
            Trait::ElementRate { element, rate } if *element == ElementId(2) => Some(*rate),
            _ => None,
        });
        assert_eq!(rate, 1.0);
        let none = product(&traits, |t| match t {
            Trait::ElementRate { element, rate } if *element == ElementId(9) => Some(*rate),
            _ => None,
        });
        assert_eq!(none, 1.0);
    }

    #[test]
    fn sum_adds_ex_params() {
        let traits = sample();
        let hit = sum(&traits, |t| match t {
            Trait::ExParam {
                param: ExParamKind::Hit,
                value,
            } => Some(*value),
            _ => None,
        });
        assert!((hit - 1.0).abs() < 1e-9);
    }

    #[test]
    fn set_deduplicates() {
        let traits = sample();
        let elements = collect_set(&traits, |t| match t {
            Trait::AttackElement(e) => Some(*e),
            _ => None,
        });
        assert_eq!(elements, vec![ElementId(3), ElementId(4)]);
    }

    #[test]
    fn flags_parse_from_snake_case() {
        assert_eq!("auto_battle".parse::<SpecialFlag>(), Ok(SpecialFlag::AutoBattle));
        assert_eq!(PartyAbility::GoldDouble.to_string(), "gold_double");
    }
}
