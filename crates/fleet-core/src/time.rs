//! Simulation time model.
//!
//! # Design
//!
//! The coordinator is driven by an external frame loop that reports the
//! elapsed time of each frame (`delta`).  `SimClock` accumulates those deltas
//! into a monotonically increasing `now` measured in simulated time units,
//! and counts frames as ticks.
//!
//! Reservation timestamps and the reservation TTL are expressed in the same
//! units, so a run is reproducible for a given sequence of deltas regardless
//! of wall-clock jitter.

use std::fmt;

/// Accumulated simulated time plus a tick counter.
///
/// `SimClock` is cheap to copy and holds no heap data.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Simulated time units elapsed since the clock was created.
    pub now: f64,
    /// Number of completed ticks.
    pub tick: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one tick of `delta` time units.
    ///
    /// Negative or non-finite deltas are treated as zero so a misbehaving
    /// frame timer can never move time backwards.
    #[inline]
    pub fn advance(&mut self, delta: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.now += delta;
        }
        self.tick += 1;
    }

    /// Time units elapsed since `earlier` (zero if `earlier` is in the future).
    #[inline]
    pub fn since(&self, earlier: f64) -> f64 {
        (self.now - earlier).max(0.0)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{} ({:.2}s)", self.tick, self.now)
    }
}
