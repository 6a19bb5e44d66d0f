use rayon::prelude::*;

use crate::cosmology::Cosmology;
use crate::particles::{Particle, ParticleType, SphData};
use crate::utils::GAMMA;
use crate::winds::Winds;

impl Winds {
    /// Advances the recoupling timer of one gas particle by a step of
    /// `dloga`.
    ///
    /// A wind particle whose physical density has dropped below the
    /// free-travel threshold recouples at once; otherwise its timer decays by
    /// the proper duration of the step, never below zero. Coupled particles
    /// are left untouched.
    pub fn evolve(&self, sph: &mut SphData, cosmo: &Cosmology, dloga: f64) {
        let delay = sph.delay_time.get_mut();
        if *delay > 0.0 && sph.density * cosmo.a3inv() < self.config.free_travel_dens_thresh {
            *delay = 0.0;
        }
        if *delay > 0.0 {
            let dtime = cosmo.proper_time(dloga);
            *delay = (*delay - dtime).max(0.0);
        }
    }

    /// Evolves every gas particle in parallel. `dloga_of(slot)` gives the step
    /// of the particle owning SPH slot `slot`.
    ///
    /// Returns the number of particles still in the wind afterwards.
    pub fn evolve_all<F>(&self, sph: &mut [SphData], cosmo: &Cosmology, dloga_of: F) -> usize
    where
        F: Fn(usize) -> f64 + Sync,
    {
        sph.par_iter_mut()
            .enumerate()
            .map(|(slot, data)| {
                self.evolve(data, cosmo, dloga_of(slot));
                usize::from(data.delay_time() > 0.0)
            })
            .sum()
    }

    /// True if `p` is a wind particle that currently ignores hydrodynamic
    /// forces.
    pub fn is_particle_decoupled(&self, p: &Particle, sph: &SphData) -> bool {
        self.config.decouple_hydro && p.ptype == ParticleType::Gas && sph.delay_time() > 0.0
    }

    /// Overrides the hydro results of a decoupled particle: no hydrodynamic
    /// acceleration, no entropy change, and a signal velocity raised to the
    /// wind speed so the particle's timestep is not limited by its
    /// neighbours.
    pub fn decoupled_hydro(&self, sph: &mut SphData, atime: f64) {
        sph.hydro_accel = [0.0; 3];
        sph.dt_entropy = 0.0;

        let fac_mu = atime.powf(3.0 * (GAMMA - 1.0) / 2.0) / atime;
        let windspeed = self.config.speed * atime * fac_mu;
        let hsml_c = (self.config.free_travel_dens_thresh / sph.density).cbrt() * atime;
        sph.max_signal_vel = hsml_c * (2.0 * windspeed).max(sph.max_signal_vel);
    }
}
