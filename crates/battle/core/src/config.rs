/// Battle rule constants and tunable parameters.
///
/// Compile-time constants size fixed tables; the runtime fields hold the
/// balance values the resolution formulas read. Defaults reproduce the
/// classic rules (critical ×3, escape +0.1 per failure, and so on).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Damage multiplier applied on a critical hit.
    pub critical_multiplier: f64,
    /// Factor in `factor * party_agility / troop_agility` for the initial escape ratio.
    pub escape_ratio_factor: f64,
    /// Amount added to the escape ratio after each failed attempt.
    pub escape_ratio_step: f64,
    /// Per-point luck difference applied to state and debuff chances.
    pub luck_effect_factor: f64,
    /// When false, slip damage from regeneration never takes the last HP.
    pub slip_death: bool,
    /// TP gained when taking damage equal to max HP.
    pub tp_charge_by_damage: f64,
    /// Battle-start TP is drawn from `[0, initial_tp_range)`.
    pub initial_tp_range: u32,
    /// Preemptive chance when the party is at least as fast as the troop.
    pub preemptive_rate_fast: f64,
    /// Preemptive chance when the troop is faster.
    pub preemptive_rate_slow: f64,
    /// Surprise chance when the party is at least as fast as the troop.
    pub surprise_rate_fast: f64,
    /// Surprise chance when the troop is faster.
    pub surprise_rate_slow: f64,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Party members that take part in battle.
    pub const MAX_BATTLE_MEMBERS: usize = 4;
    /// Number of alterable base parameters (and buff slots).
    pub const PARAM_COUNT: usize = 8;
    /// Highest absolute buff/debuff stage.
    pub const MAX_BUFF_LEVEL: i8 = 2;
    /// Upper bound of the TP gauge.
    pub const MAX_TP: i32 = 100;
    /// Maximum queued actions per combatant per turn.
    pub const MAX_ACTIONS: usize = 8;
    /// Maximum simultaneous states on one combatant.
    pub const MAX_STATES: usize = 16;
    /// Rated patterns within this distance of the best rating stay in the pool.
    pub const ENEMY_RATING_WINDOW: i32 = 3;
    /// Parameter multiplier gained per buff stage.
    pub const BUFF_RATE_PER_STAGE: f64 = 0.25;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CRITICAL_MULTIPLIER: f64 = 3.0;
    pub const DEFAULT_ESCAPE_RATIO_FACTOR: f64 = 0.5;
    pub const DEFAULT_ESCAPE_RATIO_STEP: f64 = 0.1;
    pub const DEFAULT_LUCK_EFFECT_FACTOR: f64 = 0.001;
    pub const DEFAULT_TP_CHARGE_BY_DAMAGE: f64 = 50.0;
    pub const DEFAULT_INITIAL_TP_RANGE: u32 = 25;

    pub fn new() -> Self {
        Self {
            critical_multiplier: Self::DEFAULT_CRITICAL_MULTIPLIER,
            escape_ratio_factor: Self::DEFAULT_ESCAPE_RATIO_FACTOR,
            escape_ratio_step: Self::DEFAULT_ESCAPE_RATIO_STEP,
            luck_effect_factor: Self::DEFAULT_LUCK_EFFECT_FACTOR,
            slip_death: false,
            tp_charge_by_damage: Self::DEFAULT_TP_CHARGE_BY_DAMAGE,
            initial_tp_range: Self::DEFAULT_INITIAL_TP_RANGE,
            preemptive_rate_fast: 0.05,
            preemptive_rate_slow: 0.03,
            surprise_rate_fast: 0.03,
            surprise_rate_slow: 0.05,
        }
    }

    pub fn with_critical_multiplier(mut self, multiplier: f64) -> Self {
        self.critical_multiplier = multiplier;
        self
    }

    pub fn with_slip_death(mut self, slip_death: bool) -> Self {
        self.slip_death = slip_death;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
