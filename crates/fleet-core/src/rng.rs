//! Deterministic simulation RNG and robot display colours.
//!
//! The coordinator draws one colour per spawned robot.  Seeding the RNG from
//! `FleetConfig::seed` keeps colours stable across runs, which makes
//! screenshots and recorded event streams comparable.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// An 8-bit RGB colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Simulation-level RNG.
///
/// Used only from the coordinator's single-writer tick path.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// A bright colour: every channel in `100..=255` so robots stay visible
    /// against a light map background.
    pub fn vivid_color(&mut self) -> Rgb {
        Rgb(
            self.gen_range(100..=255),
            self.gen_range(100..=255),
            self.gen_range(100..=255),
        )
    }
}
