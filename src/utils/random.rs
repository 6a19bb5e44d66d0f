use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::utils::constants::{WIND_PHI_OFFSET, WIND_THETA_OFFSET};

/// Source of reproducible uniform numbers keyed by an integer.
///
/// The same key always yields the same value, independent of which thread or
/// task asks for it. Wind decisions are keyed by particle ids so the outcome
/// does not depend on scheduling.
pub trait RandomSource: Sync {
    /// Returns a value in `[0, 1)` for `key`.
    fn uniform(&self, key: u64) -> f64;
}

/// Default keyed generator: a `StdRng` seeded by `seed ^ key`, one draw per key.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedRng {
    pub seed: u64,
}

impl KeyedRng {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl RandomSource for KeyedRng {
    fn uniform(&self, key: u64) -> f64 {
        let mut rng = StdRng::seed_from_u64(self.seed ^ key);
        rng.random::<f64>()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &R {
    fn uniform(&self, key: u64) -> f64 {
        (**self).uniform(key)
    }
}

/// Isotropic unit vector for particle `id`.
///
/// The polar angle is inverse-transform sampled so directions are uniform on
/// the sphere.
pub fn isotropic_direction<R: RandomSource + ?Sized>(rng: &R, id: u64) -> [f64; 3] {
    let theta = (2.0 * rng.uniform(id.wrapping_add(WIND_THETA_OFFSET)) - 1.0).acos();
    let phi = 2.0 * PI * rng.uniform(id.wrapping_add(WIND_PHI_OFFSET));

    [
        theta.sin() * phi.cos(),
        theta.sin() * phi.sin(),
        theta.cos(),
    ]
}
