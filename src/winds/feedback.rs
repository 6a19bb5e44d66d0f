//! Second phase of the feedback: each new star stochastically kicks the gas
//! within its smoothing length into a wind.
use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;

use crate::cosmology::Cosmology;
use crate::particles::{ParticleStore, TypeMask};
use crate::treewalk::{Neighbour, NgbIter, TreeWalk};
use crate::utils::{isotropic_direction, RandomSource, WindError};
use crate::winds::weight::{star_slot, WindQuery};
use crate::winds::{WindConfig, WindData, WindModel};

/// Launch efficiency and kick speed (internal velocity units) for a star
/// with velocity dispersion `vdisp`.
///
/// Returns `None` when the halo model has no dispersion to work with.
pub fn launch_parameters(config: &WindConfig, cosmo: &Cosmology, vdisp: f64) -> Option<(f64, f64)> {
    match config.model {
        WindModel::FixedEfficiency => Some((config.efficiency, config.speed * cosmo.a)),
        WindModel::HaloDispersion => {
            if vdisp <= 0.0 {
                return None;
            }
            let efficiency = (config.sigma0 / (vdisp / cosmo.a)).powi(2);
            Some((efficiency, config.speed_factor * vdisp))
        }
    }
}

/// Probability of kicking one gas neighbour: the expected launched mass
/// `efficiency * star_mass` spread over the surrounding gas mass.
pub fn launch_probability(efficiency: f64, star_mass: f64, total_weight: f64) -> f64 {
    if total_weight <= 0.0 {
        return 0.0;
    }
    efficiency * star_mass / total_weight
}

/// Proper time a particle kicked with internal speed `v` stays decoupled.
pub fn free_travel_time(config: &WindConfig, cosmo: &Cosmology, v: f64) -> f64 {
    config.free_travel_length / (v / cosmo.a)
}

pub struct WindFeedbackWalk<'a, R: RandomSource> {
    pub config: &'a WindConfig,
    pub cosmo: Cosmology,
    pub rng: &'a R,
    launched: AtomicUsize,
}

impl<'a, R: RandomSource> WindFeedbackWalk<'a, R> {
    pub fn new(config: &'a WindConfig, cosmo: Cosmology, rng: &'a R) -> Self {
        Self { config, cosmo, rng, launched: AtomicUsize::new(0) }
    }

    /// Number of kicks handed out so far.
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::Relaxed)
    }
}

impl<'a, R: RandomSource> TreeWalk for WindFeedbackWalk<'a, R> {
    type Query = WindQuery;
    type Result = ();
    type Record = WindData;

    fn label(&self) -> &'static str {
        "SFR_WIND_FEEDBACK"
    }

    fn record_slot(&self, store: &ParticleStore, target: usize) -> Result<usize, WindError> {
        star_slot(store, target)
    }

    fn fill(&self, store: &ParticleStore, target: usize, record: &WindData) -> WindQuery {
        WindQuery::new(store, target, record)
    }

    fn ngbiter_init(&self, query: &WindQuery) -> NgbIter {
        NgbIter { center: query.pos, hsml: query.hsml, mask: TypeMask::GAS }
    }

    fn ngbiter(&self, query: &WindQuery, _result: &mut (), ngb: &Neighbour<'_>, store: &ParticleStore) {
        if ngb.r > query.hsml {
            return;
        }
        let Some((efficiency, v)) = launch_parameters(self.config, &self.cosmo, query.vdisp) else {
            return;
        };

        let other = ngb.particle;
        let p = launch_probability(efficiency, query.mass, query.total_weight);
        let random = self.rng.uniform(query.id.wrapping_add(other.id));
        if random >= p {
            return;
        }

        let sph = match store.sph(ngb.index) {
            Ok(sph) => sph,
            Err(e) => {
                warn!("{}: not launching gas particle {}: {}", self.label(), other.id, e);
                return;
            }
        };

        let dir = isotropic_direction(self.rng, other.id);
        other.kick([v * dir[0], v * dir[1], v * dir[2]]);

        // A particle already in the wind keeps the longest delay proposed for it.
        sph.delay_time.fetch_max(free_travel_time(self.config, &self.cosmo, v));
        self.launched.fetch_add(1, Ordering::Relaxed);
    }
}
