//! HP/MP/TP mutation, death, and regeneration.
//!
//! Every setter ends in [`Combatant::refresh`], which clamps the gauges and
//! keeps the death state in sync with HP.

use crate::config::BattleConfig;
use crate::env::{RngOracle, StateDefinition};
use crate::ids::StateId;
use crate::outcome::OutcomeFlags;
use crate::stats::{ExParamKind, SpParamKind};

use super::Combatant;

impl Combatant {
    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn mp(&self) -> i32 {
        self.mp
    }

    pub fn tp(&self) -> i32 {
        self.tp
    }

    pub fn max_tp(&self) -> i32 {
        BattleConfig::MAX_TP
    }

    pub fn hp_rate(&self) -> f64 {
        f64::from(self.hp) / f64::from(self.mhp().max(1))
    }

    pub fn mp_rate(&self) -> f64 {
        let mmp = self.mmp();
        if mmp > 0 {
            f64::from(self.mp) / f64::from(mmp)
        } else {
            0.0
        }
    }

    pub fn tp_rate(&self) -> f64 {
        f64::from(self.tp) / f64::from(self.max_tp())
    }

    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp;
        self.refresh();
    }

    pub fn set_mp(&mut self, mp: i32) {
        self.mp = mp;
        self.refresh();
    }

    pub fn set_tp(&mut self, tp: i32) {
        self.tp = tp;
        self.refresh();
    }

    /// Changes HP and records the change as damage (negative for healing).
    pub fn gain_hp(&mut self, value: i32) {
        self.result.hp_damage = value.saturating_neg();
        self.result.set(OutcomeFlags::HP_AFFECTED, true);
        self.set_hp(self.hp.saturating_add(value));
    }

    pub fn gain_mp(&mut self, value: i32) {
        self.result.mp_damage = value.saturating_neg();
        self.set_mp(self.mp.saturating_add(value));
    }

    pub fn gain_tp(&mut self, value: i32) {
        self.result.tp_damage = value.saturating_neg();
        self.set_tp(self.tp.saturating_add(value));
    }

    /// TP change that leaves no trace on the outcome record.
    pub fn gain_silent_tp(&mut self, value: i32) {
        self.set_tp(self.tp.saturating_add(value));
    }

    pub fn clear_tp(&mut self) {
        self.set_tp(0);
    }

    pub(crate) fn init_tp(&mut self, config: &BattleConfig, rng: &mut dyn RngOracle) {
        let tp = rng.random_int(config.initial_tp_range) as i32;
        self.set_tp(tp);
    }

    /// Erases resisted states, clamps gauges, and syncs the death state.
    pub fn refresh(&mut self) {
        for id in self.state_resist_set() {
            self.erase_state(id);
        }
        self.clamp_resources();
        if self.hp == 0 {
            self.add_death_state();
        } else {
            self.remove_state(StateId::DEATH);
        }
    }

    fn clamp_resources(&mut self) {
        self.hp = self.hp.clamp(0, self.mhp());
        self.mp = self.mp.clamp(0, self.mmp());
        self.tp = self.tp.clamp(0, self.max_tp());
    }

    fn add_death_state(&mut self) {
        let death = StateDefinition::death();
        if !self.is_state_addable(&death) {
            return;
        }
        if !self.is_death_state_affected() {
            self.add_new_state(death);
            self.clamp_resources();
        }
        self.result.push_added_state(StateId::DEATH);
    }

    /// Zero HP, no states, no buffs.
    pub fn die(&mut self) {
        self.hp = 0;
        self.clear_states();
        self.clear_buffs();
    }

    pub fn revive(&mut self) {
        if self.hp == 0 {
            self.hp = 1;
        }
    }

    pub fn recover_all(&mut self) {
        self.clear_states();
        self.hp = self.mhp();
        self.mp = self.mmp();
        self.refresh();
    }

    // ========================================================================
    // Damage hooks and regeneration
    // ========================================================================

    /// Called after HP damage lands: may shake off states and charges TP.
    pub fn on_damage(&mut self, value: i32, config: &BattleConfig, rng: &mut dyn RngOracle) {
        self.remove_states_by_damage(rng);
        let rate = f64::from(value) / f64::from(self.mhp().max(1));
        self.charge_tp_by_damage(rate, config);
    }

    pub fn charge_tp_by_damage(&mut self, damage_rate: f64, config: &BattleConfig) {
        let value = (config.tp_charge_by_damage
            * damage_rate
            * self.sp_param(SpParamKind::TpChargeRate))
        .floor() as i32;
        self.gain_silent_tp(value);
    }

    fn max_slip_damage(&self, config: &BattleConfig) -> i32 {
        if config.slip_death {
            self.hp
        } else {
            (self.hp - 1).max(0)
        }
    }

    pub fn regenerate_hp(&mut self, config: &BattleConfig) {
        let value = (f64::from(self.mhp()) * self.ex_param(ExParamKind::HpRegen)).floor() as i32;
        let value = value.max(-self.max_slip_damage(config));
        if value != 0 {
            self.gain_hp(value);
        }
    }

    pub fn regenerate_mp(&mut self) {
        let value = (f64::from(self.mmp()) * self.ex_param(ExParamKind::MpRegen)).floor() as i32;
        if value != 0 {
            self.gain_mp(value);
        }
    }

    pub fn regenerate_tp(&mut self) {
        let value = (f64::from(self.max_tp()) * self.ex_param(ExParamKind::TpRegen)).floor() as i32;
        self.gain_silent_tp(value);
    }

    pub fn regenerate_all(&mut self, config: &BattleConfig) {
        if self.is_alive() {
            self.regenerate_hp(config);
            self.regenerate_mp();
            self.regenerate_tp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Side;
    use crate::env::SequenceRng;
    use crate::stats::{BaseParams, Trait};

    fn hero() -> Combatant {
        Combatant::new("Hero", Side::Ally, BaseParams::new([100, 30, 10, 10, 10, 10, 10, 10]))
    }

    #[test]
    fn hp_stays_clamped_over_arbitrary_gains() {
        let mut h = hero();
        for delta in [50, -30, -500, 10, 10_000, -1, i32::MAX, i32::MIN, 0] {
            h.gain_hp(delta);
            assert!((0..=h.mhp()).contains(&h.hp()), "hp {} after {}", h.hp(), delta);
        }
    }

    #[test]
    fn zero_hp_adds_death_and_clears_states() {
        let mut h = hero();
        h.add_buff(crate::stats::ParamKind::Attack, 3);
        h.gain_hp(-100);
        assert!(h.is_dead());
        assert!(h.is_death_state_affected());
        assert_eq!(h.buffs().level(crate::stats::ParamKind::Attack), 0);
        assert!(h.result().is_state_added(StateId::DEATH));
        assert_eq!(h.result().hp_damage, 100);
    }

    #[test]
    fn healing_a_dead_combatant_revives() {
        let mut h = hero();
        h.set_hp(0);
        assert!(h.is_dead());
        h.clear_result();
        h.gain_hp(20);
        assert!(h.is_alive());
        assert_eq!(h.hp(), 20);
        assert!(h.result().is_state_removed(StateId::DEATH));
    }

    #[test]
    fn remove_death_state_revives_at_one() {
        let mut h = hero();
        h.set_hp(0);
        h.remove_state(StateId::DEATH);
        assert!(h.is_alive());
        assert_eq!(h.hp(), 1);
    }

    #[test]
    fn slip_damage_cannot_kill_without_slip_death() {
        let config = BattleConfig::default();
        let mut h = hero()
            .with_traits(vec![Trait::ExParam {
                param: ExParamKind::HpRegen,
                value: -0.5,
            }])
            .with_hp(10);
        h.regenerate_all(&config);
        assert_eq!(h.hp(), 1);
        h.regenerate_all(&config);
        assert_eq!(h.hp(), 1);

        let lethal = config.with_slip_death(true);
        h.regenerate_all(&lethal);
        assert!(h.is_dead());
    }

    #[test]
    fn tp_charges_from_damage_share() {
        let config = BattleConfig::default();
        let mut h = hero();
        let mut rng = SequenceRng::constant(0.0);
        h.on_damage(50, &config, &mut rng);
        // floor(50 * 0.5)
        assert_eq!(h.tp(), 25);
        assert_eq!(h.result().tp_damage, 0);
    }

    #[test]
    fn mp_rate_handles_zero_max() {
        let h = Combatant::new("Rock", Side::Enemy, BaseParams::new([10, 0, 1, 1, 1, 1, 1, 1]));
        assert_eq!(h.mp_rate(), 0.0);
    }
}
