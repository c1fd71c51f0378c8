//! Errors returned by orchestrator setup and player commands.
//!
//! Combat resolution itself never fails; these cover the two places where a
//! caller can ask for something impossible.

use crate::env::OracleError;
use crate::error::{BattleError, ErrorSeverity};
use crate::ids::TroopId;

use super::BattlePhase;

/// Failure while preparing a battle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("troop {0} has no members")]
    EmptyTroop(TroopId),
}

impl BattleError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            SetupError::Oracle(inner) => inner.error_code(),
            SetupError::EmptyTroop(_) => "SETUP_EMPTY_TROOP",
        }
    }
}

/// A command issued when the battle cannot accept it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("escape is not allowed in this battle")]
    EscapeNotAllowed,

    #[error("commands are only accepted during input (current phase: {phase})")]
    NotInputting { phase: BattlePhase },

    #[error("actor index {index} out of range ({len} battle members)")]
    ActorOutOfRange { index: usize, len: usize },
}

impl BattleError for CommandError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            CommandError::NotInputting { .. } => ErrorSeverity::Recoverable,
            CommandError::EscapeNotAllowed | CommandError::ActorOutOfRange { .. } => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CommandError::EscapeNotAllowed => "COMMAND_ESCAPE_NOT_ALLOWED",
            CommandError::NotInputting { .. } => "COMMAND_NOT_INPUTTING",
            CommandError::ActorOutOfRange { .. } => "COMMAND_ACTOR_OUT_OF_RANGE",
        }
    }
}
