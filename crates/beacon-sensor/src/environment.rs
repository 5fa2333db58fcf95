//! Percept sources.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use beacon_types::Percept;

/// Where percepts come from. Pluggable so the loop can run against a
/// simulated environment, a replay, or a real sampling source.
pub trait PerceptSource: Send {
    fn sample(&mut self) -> Percept;
}

/// Simulated environment: a running baseline perturbed by bounded random
/// drift each tick, clamped to the valid reading ranges.
pub struct DriftEnvironment {
    water_level_cm: f64,
    temperature_c: f64,
    smoke_ppm: f64,
    tremor_index: f64,
    rng: StdRng,
}

impl DriftEnvironment {
    /// Baseline conditions for a quiet site.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible environment for demos and tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            water_level_cm: 15.0,
            temperature_c: 29.0,
            smoke_ppm: 3.0,
            tremor_index: 0.5,
            rng,
        }
    }
}

impl Default for DriftEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl PerceptSource for DriftEnvironment {
    fn sample(&mut self) -> Percept {
        self.water_level_cm += self.rng.gen_range(-2.0..6.0);
        self.temperature_c += self.rng.gen_range(-0.5..1.0);
        self.smoke_ppm += self.rng.gen_range(-1.0..8.0);
        self.tremor_index += self.rng.gen_range(-0.2..1.2);

        // Keep the internal baseline inside the valid ranges so drift
        // cannot walk it off the scale.
        self.water_level_cm = self.water_level_cm.clamp(0.0, 200.0);
        self.temperature_c = self.temperature_c.clamp(10.0, 60.0);
        self.smoke_ppm = self.smoke_ppm.clamp(0.0, 500.0);
        self.tremor_index = self.tremor_index.clamp(0.0, 10.0);

        Percept::new(
            round_to(self.water_level_cm, 1),
            round_to(self.temperature_c, 1),
            round_to(self.smoke_ppm, 1),
            round_to(self.tremor_index, 2),
        )
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
