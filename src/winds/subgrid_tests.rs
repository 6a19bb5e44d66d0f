use approx::assert_relative_eq;

use crate::cosmology::Cosmology;
use crate::particles::ParticleStore;
use crate::utils::{isotropic_direction, KeyedRng, RandomSource, WindError};
use crate::winds::{WindConfig, WindModel, Winds};

struct Fixed(f64);

impl RandomSource for Fixed {
    fn uniform(&self, _key: u64) -> f64 {
        self.0
    }
}

fn subgrid_winds(subgrid: bool) -> Winds {
    Winds::new(WindConfig {
        model: WindModel::FixedEfficiency,
        subgrid,
        decouple_hydro: true,
        efficiency: 2.0,
        energy_fraction: 1.0,
        speed: 100.0,
        sigma0: 353.0,
        speed_factor: 2.95,
        free_travel_length: 20.0,
        free_travel_dens_fac: 0.1,
        free_travel_dens_thresh: 0.01,
    })
}

fn parent_store() -> (ParticleStore, usize) {
    let mut store = ParticleStore::new();
    let gas = store.add_gas(7, 1.0, [0.0; 3], [1.0, 0.0, 0.0], 0.5, 1.0);
    (store, gas)
}

#[test]
fn test_likely_draw_launches_parent() {
    // 1 - exp(-2 * 0.5 / 1) = 0.632
    let (mut store, gas) = parent_store();
    let cosmo = Cosmology::new(0.5, 1.0);
    let launched = subgrid_winds(true)
        .make_after_sf_at(&mut store, gas, 0.5, &cosmo, &Fixed(0.5))
        .expect("gas parent");
    assert!(launched);

    let dir = isotropic_direction(&Fixed(0.5), 7);
    let v = store.particles[gas].velocity();
    assert_relative_eq!(v[0], 1.0 + 50.0 * dir[0], epsilon = 1e-9);
    assert_relative_eq!(v[1], 50.0 * dir[1], epsilon = 1e-9);
    assert_relative_eq!(v[2], 50.0 * dir[2], epsilon = 1e-9);
    // 20 / (50 / 0.5)
    assert_relative_eq!(store.sph[0].delay_time(), 0.2);
}

#[test]
fn test_unlikely_draw_leaves_parent() {
    let (mut store, gas) = parent_store();
    let launched = subgrid_winds(true)
        .make_after_sf_at(&mut store, gas, 0.5, &Cosmology::default(), &Fixed(0.7))
        .expect("gas parent");
    assert!(!launched);
    assert_eq!(store.particles[gas].velocity(), [1.0, 0.0, 0.0]);
    assert_eq!(store.sph[0].delay_time(), 0.0);
}

#[test]
fn test_inactive_without_subgrid_model() {
    let (mut store, gas) = parent_store();
    let launched = subgrid_winds(false)
        .make_after_sf_at(&mut store, gas, 0.5, &Cosmology::default(), &Fixed(0.0))
        .expect("gas parent");
    assert!(!launched);
    assert_eq!(store.sph[0].delay_time(), 0.0);
}

#[test]
fn test_launch_rate_matches_probability() {
    let winds = subgrid_winds(true);
    let rng = KeyedRng::new(2024);
    let trials = 4000_u64;
    let mut launched = 0;
    for id in 0..trials {
        let mut store = ParticleStore::new();
        let gas = store.add_gas(id * 10, 1.0, [0.0; 3], [0.0; 3], 0.5, 1.0);
        if winds
            .make_after_sf_at(&mut store, gas, 0.1, &Cosmology::default(), &rng)
            .expect("gas parent")
        {
            launched += 1;
        }
    }
    let expected = 1.0 - (-0.2_f64).exp();
    let rate = launched as f64 / trials as f64;
    assert!((rate - expected).abs() < 0.03, "launch rate {} vs {}", rate, expected);
}

#[test]
fn test_non_gas_parent_is_rejected() {
    let mut store = ParticleStore::new();
    let star = store.add_star(1, 1.0, [0.0; 3], [0.0; 3], 0.5);
    let err = subgrid_winds(true)
        .make_after_sf_at(&mut store, star, 0.5, &Cosmology::default(), &Fixed(0.0))
        .unwrap_err();
    assert_eq!(err, WindError::MissingSphData { index: star });
}

#[test]
fn test_subgrid_model_skips_tree_feedback() {
    use crate::treewalk::{Octree, SingleProcess};

    let mut store = ParticleStore::new();
    store.add_gas(1, 1.0, [0.1, 0.0, 0.0], [0.0; 3], 0.5, 1.0);
    let star = store.add_star(2, 1.0, [0.0; 3], [0.0; 3], 1.0);
    let tree = Octree::build(&store.particles);

    let report = subgrid_winds(true)
        .winds_and_feedback(&[star], &store, &tree, &Cosmology::default(), &SingleProcess, &Fixed(0.0))
        .expect("no-op");
    assert_eq!(report.stars, 0);
    assert_eq!(report.launched, 0);
    assert_eq!(store.particles[0].velocity(), [0.0; 3]);
}
