//! Coordinator configuration.
//!
//! Typically built with [`FleetConfig::default`] and tweaked, or loaded from a
//! JSON file by the application crate (with the `serde` feature enabled) and
//! passed to the fleet builder.

use crate::{FleetError, FleetResult};

/// Top-level coordinator configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FleetConfig {
    /// Nominal lane progress per time unit (a full lane is progress 1.0).
    pub robot_speed: f64,

    /// Reservations older than this many time units are purged.
    pub reservation_ttl: f64,

    /// Penalty multipliers tried in order by traffic-aware re-planning.
    pub penalty_multipliers: Vec<f64>,

    /// Number of candidate paths for the exhaustive k-shortest fallback.
    pub k_alternatives: usize,

    /// Battery percent drained per time unit while moving.
    pub moving_drain_rate: f64,

    /// Battery percent drained per time unit while idle, waiting or charging.
    pub idle_drain_rate: f64,

    /// Battery percent gained per time unit while charging.
    pub charge_rate: f64,

    /// Idle robots below this battery percent are sent to a charger.
    pub low_battery_threshold: f64,

    /// Start charging automatically when a task ends on a charger vertex.
    pub auto_charge_on_arrival: bool,

    /// Route idle low-battery robots to the nearest free charger.
    pub auto_route_low_battery: bool,

    /// Seed for robot display colours.
    pub seed: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            robot_speed:            0.3,
            reservation_ttl:        60.0,
            penalty_multipliers:    vec![5.0, 10.0, 20.0, 50.0],
            k_alternatives:         5,
            moving_drain_rate:      0.5,
            idle_drain_rate:        0.1,
            charge_rate:            5.0,
            low_battery_threshold:  20.0,
            auto_charge_on_arrival: true,
            auto_route_low_battery: true,
            seed:                   42,
        }
    }
}

impl FleetConfig {
    /// Reject values that would stall or corrupt the tick loop.
    pub fn validate(&self) -> FleetResult<()> {
        let positive = [
            ("robot_speed", self.robot_speed),
            ("reservation_ttl", self.reservation_ttl),
            ("charge_rate", self.charge_rate),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FleetError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("moving_drain_rate", self.moving_drain_rate),
            ("idle_drain_rate", self.idle_drain_rate),
            ("low_battery_threshold", self.low_battery_threshold),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(FleetError::Config(format!("{name} must be >= 0, got {value}")));
            }
        }

        if self.penalty_multipliers.is_empty() {
            return Err(FleetError::Config("penalty_multipliers must not be empty".into()));
        }
        if let Some(p) = self.penalty_multipliers.iter().find(|p| !(p.is_finite() && **p >= 1.0)) {
            return Err(FleetError::Config(format!("penalty multiplier {p} must be >= 1")));
        }
        if self.k_alternatives == 0 {
            return Err(FleetError::Config("k_alternatives must be at least 1".into()));
        }
        Ok(())
    }
}
