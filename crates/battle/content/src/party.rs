//! Starting party description.

use battle_core::{ActorId, BattleContext, Combatant, DataOracle, ItemId, OracleError};

/// The party a battle starts from: who fights and what they carry.
///
/// Members are listed in formation order; the first
/// [`MAX_BATTLE_MEMBERS`](battle_core::BattleConfig::MAX_BATTLE_MEMBERS)
/// take part in battle and the rest wait in reserve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartySpec {
    pub members: Vec<ActorId>,
    pub gold: u64,
    pub items: Vec<(ItemId, u32)>,
    /// Switches turned on before the battle starts.
    pub switches: Vec<u32>,
}

impl PartySpec {
    /// Builds a fresh battle context with every member at full HP and MP.
    pub fn build(&self, data: &dyn DataOracle) -> Result<BattleContext, OracleError> {
        let members = self
            .members
            .iter()
            .map(|&id| data.require_actor(id).map(Combatant::from_actor))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ctx = BattleContext::with_party(members);
        ctx.gain_gold(self.gold);
        for &(item, amount) in &self.items {
            ctx.stock_item(item, amount);
        }
        for &switch in &self.switches {
            ctx.set_switch(switch, true);
        }
        Ok(ctx)
    }
}
