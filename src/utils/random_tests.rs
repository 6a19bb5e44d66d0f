use approx::assert_relative_eq;

use crate::utils::{isotropic_direction, KeyedRng, RandomSource};

#[test]
fn test_keyed_rng_is_reproducible() {
    let rng = KeyedRng::new(42);
    for key in [0_u64, 1, 17, 1 << 40, u64::MAX] {
        assert_eq!(rng.uniform(key), rng.uniform(key));
    }
}

#[test]
fn test_keyed_rng_range() {
    let rng = KeyedRng::default();
    for key in 0..2000_u64 {
        let x = rng.uniform(key);
        assert!((0.0..1.0).contains(&x), "draw {} out of range for key {}", x, key);
    }
}

#[test]
fn test_keyed_rng_different_keys_differ() {
    let rng = KeyedRng::default();
    let a = rng.uniform(10);
    let b = rng.uniform(11);
    assert_ne!(a, b);
}

#[test]
fn test_isotropic_direction_is_unit() {
    let rng = KeyedRng::new(7);
    for id in 0..500_u64 {
        let dir = isotropic_direction(&rng, id);
        let norm = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_isotropic_direction_is_roughly_unbiased() {
    let rng = KeyedRng::new(3);
    let n = 20_000;
    let mut mean = [0.0; 3];
    for id in 0..n as u64 {
        let dir = isotropic_direction(&rng, id * 16);
        for d in 0..3 {
            mean[d] += dir[d] / n as f64;
        }
    }
    for m in mean {
        assert!(m.abs() < 0.05, "mean direction component {} too large", m);
    }
}

struct Fixed(f64);

impl RandomSource for Fixed {
    fn uniform(&self, _key: u64) -> f64 {
        self.0
    }
}

#[test]
fn test_isotropic_direction_poles() {
    // u = 1 gives theta = 0, pointing along +z.
    let dir = isotropic_direction(&Fixed(1.0), 0);
    assert_relative_eq!(dir[2], 1.0, epsilon = 1e-12);
    // u = 0 gives theta = pi, pointing along -z.
    let dir = isotropic_direction(&Fixed(0.0), 0);
    assert_relative_eq!(dir[2], -1.0, epsilon = 1e-12);
}
