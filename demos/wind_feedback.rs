// demos/wind_feedback.rs

use log::info;
use rs_winds::cosmology::Cosmology;
use rs_winds::particles::{ParticleStore, ParticleType};
use rs_winds::treewalk::{Octree, SingleProcess};
use rs_winds::utils::{KeyedRng, WindError};
use rs_winds::winds::{set_winds_params, WindConfig, WindParams, Winds};

fn main() -> Result<(), WindError> {
    env_logger::init();

    // Wind parameters as they would come from the parameter file
    let params = WindParams::new(Some("halo|decouple-hydro"), None, Some(1.0), Some(150.0), Some(2.95), Some(5.0), None)?;
    let params = set_winds_params(Some(params), &SingleProcess)?;
    let winds = Winds::new(WindConfig::init(&params, 0.1, 1.0e5, 0.5)?);
    println!("Wind model: {}", params.model);

    // A small halo: dark matter and gas on jittered lattices
    let mut store = ParticleStore::new();
    let side = 12;
    let mut id = 0_u64;
    for i in 0..side {
        for j in 0..side {
            for k in 0..side {
                let t = id as f64;
                let pos = [i as f64 + 0.1 * t.sin(), j as f64 + 0.1 * t.cos(), k as f64];
                store.add_dark_matter(id, 5.0, pos, [20.0 * t.sin(), 20.0 * (1.3 * t).cos(), 20.0 * (0.7 * t).sin()]);
                store.add_gas(id + 100_000, 1.0, [pos[0] + 0.5, pos[1] + 0.5, pos[2] + 0.5], [0.0; 3], 1.2, 2.0);
                id += 1;
            }
        }
    }
    let new_stars: Vec<usize> = (0..8)
        .map(|s| store.add_star(200_000 + s, 0.5, [4.0 + s as f64 * 0.5, 5.5, 6.0], [0.0; 3], 1.5))
        .collect();

    let cosmo = Cosmology::new(0.5, 1.2);
    let rng = KeyedRng::new(2024);
    let tree = Octree::build(&store.particles);

    let report = winds.winds_and_feedback(&new_stars, &store, &tree, &cosmo, &SingleProcess, &rng)?;
    println!("Converged after {} rounds, {} kicks from {} stars", report.rounds, report.launched, report.stars);

    // Run the recoupling timers down over a few steps
    for step in 0..5 {
        let in_wind = winds.evolve_all(&mut store.sph, &cosmo, |_| 0.05);
        info!("Step {}: {} particles still in the wind", step, in_wind);
    }

    let gas = store.indices_of(ParticleType::Gas);
    let decoupled = gas
        .iter()
        .filter(|&&i| store.sph(i).map(|sph| winds.is_particle_decoupled(&store.particles[i], sph)).unwrap_or(false))
        .count();
    println!("{} of {} gas particles decoupled from hydrodynamics", decoupled, gas.len());

    Ok(())
}
