use approx::assert_relative_eq;

use crate::treewalk::{Communicator, SingleProcess};
use crate::utils::WindError;
use crate::winds::{set_winds_params, WindConfig, WindModel, WindModelSelector, WindParams};

#[test]
fn test_selector_parses_combinations() {
    let sel: WindModelSelector = "halo|decouple-hydro".parse().expect("valid selector");
    assert_eq!(sel.model, WindModel::HaloDispersion);
    assert!(sel.decouple_hydro);
    assert!(!sel.subgrid);

    let sel: WindModelSelector = "subgrid, fixed-efficiency".parse().expect("valid selector");
    assert_eq!(sel.model, WindModel::FixedEfficiency);
    assert!(sel.subgrid);
    assert!(!sel.decouple_hydro);

    let sel: WindModelSelector = "OFJT10 decouple".parse().expect("valid selector");
    assert_eq!(sel.model, WindModel::HaloDispersion);
    assert!(sel.decouple_hydro);
}

#[test]
fn test_selector_rejects_bad_input() {
    for bad in ["", "decouple-hydro", "subgrid", "halo|fixed-efficiency", "halo|turbo"] {
        match bad.parse::<WindModelSelector>() {
            Err(WindError::InvalidModel(s)) => assert_eq!(s, bad),
            other => panic!("Expected InvalidModel for {:?}, got {:?}", bad, other),
        }
    }
}

#[test]
fn test_selector_display_parses_back() {
    let sel = WindModelSelector { model: WindModel::HaloDispersion, subgrid: true, decouple_hydro: true };
    assert_eq!(sel.to_string(), "halo|subgrid|decouple-hydro");
    assert_eq!(sel.to_string().parse::<WindModelSelector>(), Ok(sel));
}

#[test]
fn test_params_new_uses_defaults() {
    let params = WindParams::new(None, None, None, None, None, None, None).expect("defaults are valid");
    assert_eq!(params, WindParams::default());

    let params = WindParams::new(Some("halo"), None, None, Some(200.0), None, Some(10.0), None)
        .expect("valid parameters");
    assert_eq!(params.model.model, WindModel::HaloDispersion);
    assert_eq!(params.sigma0, 200.0);
    assert_eq!(params.free_travel_length, 10.0);
    assert_eq!(params.efficiency, WindParams::default().efficiency);
}

#[test]
fn test_params_validation() {
    assert!(matches!(
        WindParams::new(None, Some(-1.0), None, None, None, None, None),
        Err(WindError::InvalidParameter(_))
    ));
    assert!(matches!(
        WindParams::new(Some("fixed-efficiency"), Some(0.0), None, None, None, None, None),
        Err(WindError::InvalidParameter(_))
    ));
    assert!(matches!(
        WindParams::new(None, None, None, None, None, Some(f64::NAN), None),
        Err(WindError::InvalidParameter(_))
    ));
    // a zero efficiency is fine for the halo model, which does not use it
    assert!(WindParams::new(Some("halo"), Some(0.0), None, None, None, None, None).is_ok());
}

#[test]
fn test_fixed_efficiency_speed() {
    let params = WindParams::new(Some("fixed-efficiency"), Some(2.0), Some(0.5), None, None, None, Some(0.1))
        .expect("valid parameters");
    let config = WindConfig::init(&params, 0.1, 4.0e4, 3.0).expect("valid config");
    let expected = (2.0 * 0.5 * 0.1 * 4.0e4 / 0.9_f64).sqrt() / 2.0_f64.sqrt();
    assert_relative_eq!(config.speed, expected, max_relative = 1e-12);
    assert_relative_eq!(config.free_travel_dens_thresh, 0.3, max_relative = 1e-12);
    assert_eq!(config.model, WindModel::FixedEfficiency);
    assert!(!config.subgrid);
}

#[test]
fn test_halo_speed_is_not_rescaled() {
    let params = WindParams::new(Some("halo"), Some(4.0), Some(1.0), None, None, None, None)
        .expect("valid parameters");
    let config = WindConfig::init(&params, 0.1, 9.0e4, 1.0).expect("valid config");
    let expected = (2.0 * 0.1 * 9.0e4 / 0.9_f64).sqrt();
    assert_relative_eq!(config.speed, expected, max_relative = 1e-12);
}

#[test]
fn test_init_rejects_bad_supernova_fraction() {
    let params = WindParams::default();
    assert!(matches!(WindConfig::init(&params, 1.0, 1.0, 1.0), Err(WindError::InvalidParameter(_))));
    assert!(matches!(WindConfig::init(&params, -0.1, 1.0, 1.0), Err(WindError::InvalidParameter(_))));
}

#[test]
fn test_init_rejects_zero_wind_speed() {
    let no_energy = WindParams::new(Some("fixed-efficiency"), None, Some(0.0), None, None, None, None)
        .expect("valid parameters");
    assert!(matches!(WindConfig::init(&no_energy, 0.1, 1.0e5, 1.0), Err(WindError::InvalidParameter(_))));

    let params = WindParams::default();
    assert!(matches!(WindConfig::init(&params, 0.0, 1.0e5, 1.0), Err(WindError::InvalidParameter(_))));

    let subgrid = WindParams::new(Some("halo|subgrid"), None, Some(0.0), None, None, None, None)
        .expect("valid parameters");
    assert!(matches!(WindConfig::init(&subgrid, 0.1, 1.0e5, 1.0), Err(WindError::InvalidParameter(_))));

    let halo = WindParams::new(Some("halo"), None, None, None, Some(0.0), None, None).expect("valid parameters");
    assert!(matches!(WindConfig::init(&halo, 0.1, 1.0e5, 1.0), Err(WindError::InvalidParameter(_))));
}

#[test]
fn test_halo_tree_path_ignores_reference_speed() {
    // The halo model kicks at speed_factor * vdisp, so no supernova energy is fine.
    let params = WindParams::new(Some("halo"), None, Some(0.0), None, None, None, None).expect("valid parameters");
    let config = WindConfig::init(&params, 0.1, 1.0e5, 1.0).expect("valid config");
    assert_eq!(config.speed, 0.0);
}

#[test]
fn test_set_winds_params_single_task() {
    let params = WindParams::default();
    assert_eq!(set_winds_params(Some(params), &SingleProcess), Ok(params));
    assert!(set_winds_params(None, &SingleProcess).is_err());
}

/// Pretends to be task 1 of 2, receiving a fixed broadcast from task 0.
struct Follower(WindParams);

impl Communicator for Follower {
    fn this_task(&self) -> usize {
        1
    }

    fn n_tasks(&self) -> usize {
        2
    }

    fn any(&self, local: bool) -> bool {
        local
    }

    fn sum_i64(&self, local: i64) -> i64 {
        local
    }

    fn broadcast<T: Clone + Send + 'static>(&self, value: Option<T>) -> Option<T> {
        assert!(value.is_none(), "only task 0 contributes to a broadcast");
        // Only ever used with WindParams in these tests.
        let boxed: Box<dyn std::any::Any> = Box::new(self.0);
        boxed.downcast::<T>().ok().map(|b| *b)
    }
}

#[test]
fn test_set_winds_params_follower_receives_broadcast() {
    let sent = WindParams { efficiency: 3.5, ..WindParams::default() };
    // The follower's own block is ignored.
    let received = set_winds_params(Some(WindParams::default()), &Follower(sent)).expect("broadcast");
    assert_eq!(received, sent);
}
