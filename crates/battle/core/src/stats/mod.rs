//! Parameter kinds and trait modifiers.
//!
//! Effective values are computed on demand from base parameters, the
//! combatant's intrinsic traits, active state traits, and buff stages:
//!
//! ```text
//! param = round(clamp((base + plus) * param_rate * (1 + 0.25 * buff), min, max))
//! ex    = sum(traits)
//! sp    = product(traits)
//! ```

pub mod params;
pub mod traits;

pub use params::{BaseParams, ExParamKind, ParamKind, SpParamKind};
pub use traits::{PartyAbility, SpecialFlag, Trait};
