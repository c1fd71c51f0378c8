//! Buff and debuff stages, one slot per base parameter.

use crate::config::BattleConfig;
use crate::stats::ParamKind;

use super::Combatant;

/// Signed stage level plus remaining turns for every parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffTable {
    levels: [i8; BattleConfig::PARAM_COUNT],
    turns: [u32; BattleConfig::PARAM_COUNT],
}

impl BuffTable {
    pub fn level(&self, param: ParamKind) -> i8 {
        self.levels[param.index()]
    }

    pub fn turns(&self, param: ParamKind) -> u32 {
        self.turns[param.index()]
    }

    /// Parameter multiplier for the current stage.
    pub fn rate(&self, param: ParamKind) -> f64 {
        1.0 + BattleConfig::BUFF_RATE_PER_STAGE * f64::from(self.level(param))
    }

    pub fn is_buff(&self, param: ParamKind) -> bool {
        self.level(param) > 0
    }

    pub fn is_debuff(&self, param: ParamKind) -> bool {
        self.level(param) < 0
    }

    pub fn is_max_buff(&self, param: ParamKind) -> bool {
        self.level(param) >= BattleConfig::MAX_BUFF_LEVEL
    }

    pub fn is_max_debuff(&self, param: ParamKind) -> bool {
        self.level(param) <= -BattleConfig::MAX_BUFF_LEVEL
    }

    /// Nonzero stage whose counter ran out.
    pub fn is_expired(&self, param: ParamKind) -> bool {
        self.level(param) != 0 && self.turns(param) == 0
    }

    fn increase(&mut self, param: ParamKind) {
        if !self.is_max_buff(param) {
            self.levels[param.index()] += 1;
        }
    }

    fn decrease(&mut self, param: ParamKind) {
        if !self.is_max_debuff(param) {
            self.levels[param.index()] -= 1;
        }
    }

    /// Only lengthens the remaining duration, never shortens it.
    fn overwrite_turns(&mut self, param: ParamKind, turns: u32) {
        let slot = &mut self.turns[param.index()];
        if *slot < turns {
            *slot = turns;
        }
    }

    fn erase(&mut self, param: ParamKind) {
        self.levels[param.index()] = 0;
        self.turns[param.index()] = 0;
    }

    fn decrement_turns(&mut self) {
        for i in 0..BattleConfig::PARAM_COUNT {
            if self.levels[i] != 0 && self.turns[i] > 0 {
                self.turns[i] -= 1;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Combatant {
    pub fn buffs(&self) -> &BuffTable {
        &self.buffs
    }

    pub fn add_buff(&mut self, param: ParamKind, turns: u32) {
        if !self.is_alive() {
            return;
        }
        self.buffs.increase(param);
        if self.buffs.is_buff(param) {
            self.buffs.overwrite_turns(param, turns);
        }
        self.result.push_added_buff(param);
        self.refresh();
    }

    pub fn add_debuff(&mut self, param: ParamKind, turns: u32) {
        if !self.is_alive() {
            return;
        }
        self.buffs.decrease(param);
        if self.buffs.is_debuff(param) {
            self.buffs.overwrite_turns(param, turns);
        }
        self.result.push_added_debuff(param);
        self.refresh();
    }

    pub fn remove_buff(&mut self, param: ParamKind) {
        if self.is_alive() && self.buffs.level(param) != 0 {
            self.buffs.erase(param);
            self.result.push_removed_buff(param);
            self.refresh();
        }
    }

    pub fn remove_all_buffs(&mut self) {
        for param in ParamKind::ALL {
            self.remove_buff(param);
        }
    }

    pub fn update_buff_turns(&mut self) {
        self.buffs.decrement_turns();
    }

    pub fn remove_buffs_auto(&mut self) {
        for param in ParamKind::ALL {
            if self.buffs.is_expired(param) {
                self.remove_buff(param);
            }
        }
    }

    pub(crate) fn clear_buffs(&mut self) {
        self.buffs.clear();
    }
}
