//! Common error infrastructure for battle-core.
//!
//! Domain errors (`FormulaError`, `OracleError`, `SetupError`, `CommandError`)
//! live next to the code that raises them. They all implement [`BattleError`]
//! so callers can classify failures without matching on every variant.
//!
//! Resolution itself never fails: a malformed damage formula evaluates to zero
//! and an action without legal targets is dropped. Errors are reserved for
//! setup problems and commands issued in the wrong phase.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the command can be retried later (wrong phase, busy)
/// - **Validation**: the input itself is wrong and should not be retried
/// - **Internal**: inconsistent state that indicates a bug
/// - **Fatal**: the battle cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// Implementors derive `thiserror::Error` for `Display` and classify their
/// variants by recoverability, not by impact.
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for the variant, used in logs and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
