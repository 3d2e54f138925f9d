//! Balance configuration shared by the world and every system.
//!
//! [`Balance`] is a single immutable value. The world receives it at
//! construction and systems read it back through the world's query surface;
//! nothing in the engine keeps a global copy.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregated tuning knobs controlling generation, flow, combat and AI pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Balance {
    /// Units generated per second by every non-neutral tower.
    ///
    /// A non-positive rate disables passive generation.
    pub generation_rate: f32,
    /// Speed of a carrier in world units per second.
    pub move_speed: f32,
    /// Emission interval of a link whose source holds no units, before clamping.
    pub base_interval_ms: f32,
    /// Lower clamp of the emission interval.
    pub min_interval_ms: f32,
    /// Upper clamp of the emission interval, as a multiple of `base_interval_ms`.
    pub max_interval_factor: f32,
    /// Unit cap of every tower.
    pub max_units: u32,
    /// Radius of a tower; carriers arrive once within it.
    pub tower_radius: f32,
    /// Radius of a carrier, used for presentation.
    pub carrier_radius: f32,
    /// Along-edge distance at which opposing carriers annihilate.
    pub meeting_distance: f32,
    /// Unit thresholds that unlock additional simultaneous link targets.
    pub capacity: CapacityTiers,
    /// Playable bounds; carriers leaving them are destroyed.
    pub arena: Arena,
    /// Pacing of the AI controller.
    pub ai: AiBalance,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            generation_rate: 1.0 / 1.5,
            move_speed: 140.0,
            base_interval_ms: 1_000.0,
            min_interval_ms: 220.0,
            max_interval_factor: 2.2,
            max_units: 60,
            tower_radius: 26.0,
            carrier_radius: 6.0,
            meeting_distance: 12.0,
            capacity: CapacityTiers::default(),
            arena: Arena::default(),
            ai: AiBalance::default(),
        }
    }
}

impl Balance {
    /// Parses a balance from TOML, filling omitted fields with defaults, and
    /// validates the result.
    pub fn from_toml_str(source: &str) -> Result<Self, BalanceError> {
        let balance: Self = toml::from_str(source)?;
        balance.validate()?;
        Ok(balance)
    }

    /// Rejects combinations that would stall or destabilise the simulation.
    pub fn validate(&self) -> Result<(), BalanceError> {
        if !(self.move_speed > 0.0) {
            return Err(BalanceError::NonPositiveSpeed(self.move_speed));
        }
        if self.max_units == 0 {
            return Err(BalanceError::ZeroCapacity);
        }
        if !(self.tower_radius > 0.0) {
            return Err(BalanceError::NonPositiveRadius(self.tower_radius));
        }
        if !(self.min_interval_ms > 0.0) || self.min_interval_ms > self.max_interval_ms() {
            return Err(BalanceError::IntervalBounds {
                min: self.min_interval_ms,
                max: self.max_interval_ms(),
            });
        }
        if !(self.ai.period_ms > 0.0) {
            return Err(BalanceError::NonPositiveAiPeriod(self.ai.period_ms));
        }
        Ok(())
    }

    /// Milliseconds required to generate a single unit, if generation is enabled.
    #[must_use]
    pub fn generation_period_ms(&self) -> Option<f32> {
        if self.generation_rate > 0.0 {
            Some(1_000.0 / self.generation_rate)
        } else {
            None
        }
    }

    /// Upper clamp of the emission interval.
    #[must_use]
    pub fn max_interval_ms(&self) -> f32 {
        self.base_interval_ms * self.max_interval_factor
    }

    /// Emission interval of a link whose source currently holds `source_units`.
    ///
    /// More units shorten the interval; the result always lies within
    /// `min_interval_ms..=max_interval_ms()`.
    #[must_use]
    pub fn emission_interval_ms(&self, source_units: u32) -> f32 {
        let fill = if self.max_units == 0 {
            0.0
        } else {
            source_units as f32 / self.max_units as f32
        };
        let factor = 1.0 / (0.3 + fill);
        (self.base_interval_ms * factor)
            .min(self.max_interval_ms())
            .max(self.min_interval_ms)
    }

    /// Number of links a tower holding `units` may keep active at once.
    #[must_use]
    pub fn max_concurrent_targets(&self, units: u32) -> usize {
        self.capacity.targets_for(units)
    }
}

/// Step function mapping a tower's units to its simultaneous link targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityTiers {
    /// Units at which a second target unlocks.
    pub second_target_at: u32,
    /// Units at which a third target unlocks.
    pub third_target_at: u32,
}

impl Default for CapacityTiers {
    fn default() -> Self {
        Self {
            second_target_at: 10,
            third_target_at: 30,
        }
    }
}

impl CapacityTiers {
    /// Resolves the number of simultaneous targets for the provided units.
    #[must_use]
    pub fn targets_for(&self, units: u32) -> usize {
        if units >= self.third_target_at {
            3
        } else if units >= self.second_target_at {
            2
        } else {
            1
        }
    }
}

/// Playable bounds of the match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Arena {
    /// Horizontal extent in world units.
    pub width: f32,
    /// Vertical extent in world units.
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 1_024.0,
            height: 1_024.0,
        }
    }
}

impl Arena {
    /// Reports whether the point lies within the arena, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }
}

/// Cadence and targeting weights of the AI controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AiBalance {
    /// Milliseconds between decision rounds.
    pub period_ms: f32,
    /// Minimum units a tower needs before the AI sends from it.
    pub send_threshold: u32,
    /// Weight of distance against target units when scoring targets.
    pub distance_weight: f32,
}

impl Default for AiBalance {
    fn default() -> Self {
        Self {
            period_ms: 1_700.0,
            send_threshold: 7,
            distance_weight: 0.05,
        }
    }
}

/// Reasons a balance configuration may be rejected.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// The TOML source could not be parsed into a balance.
    #[error("failed to parse balance: {0}")]
    Parse(#[from] toml::de::Error),
    /// Carriers would never reach their targets.
    #[error("move_speed must be positive (received {0})")]
    NonPositiveSpeed(f32),
    /// Towers would be unable to hold any units.
    #[error("max_units must be positive")]
    ZeroCapacity,
    /// Carriers could never arrive.
    #[error("tower_radius must be positive (received {0})")]
    NonPositiveRadius(f32),
    /// The emission interval clamp is empty or non-positive.
    #[error("min_interval_ms ({min}) must be positive and at most the maximum interval ({max})")]
    IntervalBounds {
        /// Configured lower clamp.
        min: f32,
        /// Derived upper clamp.
        max: f32,
    },
    /// The AI would fire continuously.
    #[error("ai.period_ms must be positive (received {0})")]
    NonPositiveAiPeriod(f32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn capacity_steps_at_ten_and_thirty_units() {
        let balance = Balance::default();
        assert_eq!(balance.max_concurrent_targets(0), 1);
        assert_eq!(balance.max_concurrent_targets(5), 1);
        assert_eq!(balance.max_concurrent_targets(10), 2);
        assert_eq!(balance.max_concurrent_targets(15), 2);
        assert_eq!(balance.max_concurrent_targets(30), 3);
        assert_eq!(balance.max_concurrent_targets(35), 3);
    }

    #[test]
    fn empty_source_uses_the_upper_clamp() {
        let balance = Balance::default();
        assert!((balance.emission_interval_ms(0) - 2_200.0).abs() < 1e-3);
    }

    #[test]
    fn full_source_uses_the_fastest_cadence() {
        let balance = Balance::default();
        let expected = 1_000.0 / 1.3;
        assert!((balance.emission_interval_ms(60) - expected).abs() < 1e-2);
    }

    #[test]
    fn default_generation_matches_one_unit_every_one_and_a_half_seconds() {
        let period = Balance::default()
            .generation_period_ms()
            .expect("generation enabled by default");
        assert!((period - 1_500.0).abs() < 1e-2);
    }

    #[test]
    fn zero_rate_disables_generation() {
        let balance = Balance {
            generation_rate: 0.0,
            ..Balance::default()
        };
        assert!(balance.generation_period_ms().is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let balance = Balance::from_toml_str(
            r#"
            move_speed = 200.0

            [ai]
            send_threshold = 12
            "#,
        )
        .expect("valid balance");

        assert_eq!(balance.move_speed, 200.0);
        assert_eq!(balance.ai.send_threshold, 12);
        assert_eq!(balance.ai.period_ms, 1_700.0);
        assert_eq!(balance.max_units, 60);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Balance::from_toml_str("speed = 3.0").expect_err("unknown field");
        assert!(matches!(error, BalanceError::Parse(_)));
    }

    #[test]
    fn inverted_interval_bounds_are_rejected() {
        let error = Balance::from_toml_str("min_interval_ms = 5000.0").expect_err("min > max");
        assert!(matches!(error, BalanceError::IntervalBounds { .. }));
    }

    #[test]
    fn zero_speed_is_rejected() {
        let error = Balance::from_toml_str("move_speed = 0.0").expect_err("zero speed");
        assert!(matches!(error, BalanceError::NonPositiveSpeed(_)));
    }

    proptest! {
        #[test]
        fn interval_stays_within_bounds(units in 0u32..=60) {
            let balance = Balance::default();
            let interval = balance.emission_interval_ms(units);
            prop_assert!(interval >= balance.min_interval_ms);
            prop_assert!(interval <= balance.max_interval_ms());
        }

        #[test]
        fn interval_never_grows_with_more_units(units in 0u32..60) {
            let balance = Balance::default();
            prop_assert!(
                balance.emission_interval_ms(units + 1) <= balance.emission_interval_ms(units)
            );
        }
    }
}
