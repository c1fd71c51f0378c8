//! Oracle access errors.

use crate::error::{BattleError, ErrorSeverity};
use crate::ids::{ActorId, EnemyId, ItemId, SkillId, StateId, TroopId};

/// A record referenced by id is missing from the data provider.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("skill {0} not found")]
    SkillNotFound(SkillId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("state {0} not found")]
    StateNotFound(StateId),

    #[error("enemy {0} not found")]
    EnemyNotFound(EnemyId),

    #[error("troop {0} not found")]
    TroopNotFound(TroopId),

    #[error("actor {0} not found")]
    ActorNotFound(ActorId),
}

impl BattleError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            SkillNotFound(_) => "ORACLE_SKILL_NOT_FOUND",
            ItemNotFound(_) => "ORACLE_ITEM_NOT_FOUND",
            StateNotFound(_) => "ORACLE_STATE_NOT_FOUND",
            EnemyNotFound(_) => "ORACLE_ENEMY_NOT_FOUND",
            TroopNotFound(_) => "ORACLE_TROOP_NOT_FOUND",
            ActorNotFound(_) => "ORACLE_ACTOR_NOT_FOUND",
        }
    }
}
