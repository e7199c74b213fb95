//! Battery drain and charge model.

use fleet_core::FleetConfig;

/// A full battery, in percent.
pub const FULL_CHARGE: f64 = 100.0;

/// Per-time-unit battery rates, in percent.
///
/// Every robot drains continuously: faster while `Moving`, slower in every
/// other state (including `Charging`, where the charge rate is applied on top).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryModel {
    pub moving_drain_rate: f64,
    pub idle_drain_rate:   f64,
    pub charge_rate:       f64,
}

impl Default for BatteryModel {
    fn default() -> Self {
        Self::from_config(&FleetConfig::default())
    }
}

impl BatteryModel {
    pub fn from_config(config: &FleetConfig) -> Self {
        Self {
            moving_drain_rate: config.moving_drain_rate,
            idle_drain_rate:   config.idle_drain_rate,
            charge_rate:       config.charge_rate,
        }
    }

    /// Level after draining for `dt`, floored at zero.
    #[inline]
    pub fn drain(&self, level: f64, moving: bool, dt: f64) -> f64 {
        let rate = if moving { self.moving_drain_rate } else { self.idle_drain_rate };
        (level - rate * dt).max(0.0)
    }

    /// Level after charging for `dt`, capped at [`FULL_CHARGE`].
    #[inline]
    pub fn charge(&self, level: f64, dt: f64) -> f64 {
        (level + self.charge_rate * dt).min(FULL_CHARGE)
    }
}
