//! Galactic wind feedback from newly formed stars.
//!
//! Two launch paths are available. The tree walk path (`winds_and_feedback`)
//! first iterates a per-star dark matter search radius until about 40
//! neighbours are enclosed, measuring the gas mass around each star and the
//! dark matter velocity dispersion, and then stochastically kicks the gas
//! around every star. The subgrid path (`make_after_sf`) instead kicks the gas
//! particle that spawned the star, with no neighbour search at all.
//!
//! Kicked gas particles become wind particles: they carry a recoupling timer
//! which `evolve` runs down every step, and while it runs they may be
//! decoupled from the hydrodynamics.
//!
//! # Example
//!
//! ```
//! use rs_winds::cosmology::Cosmology;
//! use rs_winds::particles::ParticleStore;
//! use rs_winds::treewalk::{Octree, SingleProcess};
//! use rs_winds::utils::KeyedRng;
//! use rs_winds::winds::{WindConfig, WindParams, Winds};
//!
//! let params = WindParams::new(Some("fixed-efficiency"), Some(2.0), None, None, None, None, None)
//!     .expect("valid wind parameters");
//! let config = WindConfig::init(&params, 0.1, 1.0e6, 0.1).expect("valid derived parameters");
//! let winds = Winds::new(config);
//!
//! let mut store = ParticleStore::new();
//! for id in 0..50 {
//!     let x = id as f64 * 0.1;
//!     store.add_dark_matter(1000 + id, 1.0, [x, 0.0, 0.0], [0.0; 3]);
//!     store.add_gas(id, 1.0, [x, 0.05, 0.0], [0.0; 3], 0.5, 1.0);
//! }
//! let star = store.add_star(5000, 0.5, [2.5, 0.0, 0.0], [0.0; 3], 1.0);
//! let tree = Octree::build(&store.particles);
//!
//! let report = winds
//!     .winds_and_feedback(&[star], &store, &tree, &Cosmology::default(), &SingleProcess, &KeyedRng::new(1))
//!     .expect("feedback failed");
//! assert_eq!(report.stars, 1);
//! assert!(store.particles[star].density_iteration_done());
//! ```
mod config;
mod wind_data;
mod weight;
mod feedback;
mod evolve;
mod subgrid;

pub use config::*;
pub use wind_data::*;
pub use weight::*;
pub use feedback::*;

use log::{debug, info};

use crate::cosmology::Cosmology;
use crate::particles::ParticleStore;
use crate::treewalk::{self, Communicator, Octree};
use crate::utils::{RandomSource, WindError};

/// Outcome of one `winds_and_feedback` call on this task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackReport {
    /// Rounds of the neighbour radius iteration.
    pub rounds: usize,
    /// Local stars processed.
    pub stars: usize,
    /// Gas particles kicked, counting repeat kicks.
    pub launched: usize,
}

/// Converged per-star statistics from `Winds::density_iterate`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityIteration {
    /// Indexed by star slot.
    pub wind_data: Vec<WindData>,
    pub rounds: usize,
}

/// The wind feedback subsystem with its configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Winds {
    config: WindConfig,
}

impl Winds {
    pub fn new(config: WindConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WindConfig {
        &self.config
    }

    /// Runs wind feedback for the batch of newly formed stars `new_stars`
    /// (indices into `store.particles`).
    ///
    /// This is a collective call: every task must enter it, even with an
    /// empty batch. Nothing happens if the subgrid model is active or no task
    /// has new stars.
    ///
    /// # Errors
    ///
    /// `NotAStar` if the batch contains anything but stars, and
    /// `InvalidParameter` if a star's smoothing length is not positive and
    /// finite.
    pub fn winds_and_feedback<C: Communicator, R: RandomSource>(
        &self,
        new_stars: &[usize],
        store: &ParticleStore,
        tree: &Octree,
        cosmo: &Cosmology,
        comm: &C,
        rng: &R,
    ) -> Result<FeedbackReport, WindError> {
        // The subgrid model does nothing here
        if self.config.subgrid {
            return Ok(FeedbackReport::default());
        }
        if !comm.any(!new_stars.is_empty()) {
            return Ok(FeedbackReport::default());
        }

        let mut iteration = self.density_iterate(new_stars, store, tree, cosmo, comm)?;
        let launched = self.feedback_pass(new_stars, store, tree, cosmo, rng, &mut iteration.wind_data)?;

        Ok(FeedbackReport { rounds: iteration.rounds, stars: new_stars.len(), launched })
    }

    /// Iterates the dark matter search radius of every star in `new_stars`
    /// until all stars on all tasks have converged.
    pub fn density_iterate<C: Communicator>(
        &self,
        new_stars: &[usize],
        store: &ParticleStore,
        tree: &Octree,
        cosmo: &Cosmology,
        comm: &C,
    ) -> Result<DensityIteration, WindError> {
        let mut wind_data = vec![WindData::default(); store.star_slots()];
        for &n in new_stars {
            let slot = weight::star_slot(store, n)?;
            let star = &store.particles[n];
            // A zero or non-finite starting radius never grows
            if !(star.hsml > 0.0 && star.hsml.is_finite()) {
                return Err(WindError::InvalidParameter(format!(
                    "star {} has smoothing length {}",
                    star.id, star.hsml
                )));
            }
            wind_data[slot] = WindData::new(star.hsml);
            star.set_density_iteration_done(false);
        }

        let root = tree.root().cube();
        let walk = WindWeightWalk {
            cosmo: *cosmo,
            max_radius: 2.0 * 3.0_f64.sqrt() * root.half_size,
        };

        let mut totalleft = comm.sum_i64(new_stars.len() as i64);
        let mut rounds = 0;
        while totalleft > 0 {
            let summary = treewalk::run(&walk, tree, store, new_stars, &mut wind_data)?;
            rounds += 1;
            totalleft = comm.sum_i64(summary.pending as i64);
            if comm.this_task() == 0 {
                info!("Star DM iteration Total left = {}", totalleft);
            }
        }

        Ok(DensityIteration { wind_data, rounds })
    }

    /// Kicks gas around each star of `new_stars`, using the converged
    /// statistics in `wind_data`. Returns the number of kicks.
    pub fn feedback_pass<R: RandomSource>(
        &self,
        new_stars: &[usize],
        store: &ParticleStore,
        tree: &Octree,
        cosmo: &Cosmology,
        rng: &R,
        wind_data: &mut [WindData],
    ) -> Result<usize, WindError> {
        let walk = WindFeedbackWalk::new(&self.config, *cosmo, rng);
        treewalk::run(&walk, tree, store, new_stars, wind_data)?;
        debug!("Wind feedback: {} stars launched {} wind particles", new_stars.len(), walk.launched());
        Ok(walk.launched())
    }
}

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod subgrid_tests;
