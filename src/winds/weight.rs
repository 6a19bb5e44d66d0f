//! First phase of the feedback: for every new star, sum the gas mass within
//! its smoothing length and measure the velocity dispersion of its nearest
//! dark matter particles. The dark matter search radius is bisected over
//! repeated rounds until roughly `TARGET_DM_NGB` neighbours are enclosed.
use log::warn;

use crate::cosmology::Cosmology;
use crate::particles::{ParticleStore, ParticleType, TypeMask};
use crate::treewalk::{Neighbour, NgbIter, ReduceMode, TreeWalk};
use crate::utils::WindError;
use crate::winds::WindData;

/// Query record shared by both wind tree walks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindQuery {
    pub id: u64,
    pub pos: [f64; 3],
    pub mass: f64,
    pub hsml: f64,
    pub total_weight: f64,
    pub dm_radius: f64,
    pub vdisp: f64,
}

impl WindQuery {
    pub fn new(store: &ParticleStore, target: usize, record: &WindData) -> Self {
        let p = &store.particles[target];
        Self {
            id: p.id,
            pos: p.pos,
            mass: p.mass,
            hsml: p.hsml,
            total_weight: record.total_weight,
            dm_radius: record.dm_radius,
            vdisp: record.vdisp,
        }
    }
}

/// Partial sums produced by one weight search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindWeightResult {
    pub total_weight: f64,
    pub v1sum: [f64; 3],
    pub v2sum: f64,
    pub ngb: i64,
}

/// Slot of star `target` in the wind scratch array.
pub(crate) fn star_slot(store: &ParticleStore, target: usize) -> Result<usize, WindError> {
    let p = &store.particles[target];
    if p.ptype != ParticleType::Star {
        return Err(WindError::NotAStar { index: target, ptype: p.ptype, id: p.id });
    }
    Ok(p.slot)
}

pub struct WindWeightWalk {
    pub cosmo: Cosmology,
    /// Radius beyond which growing the search cannot enclose new particles.
    pub max_radius: f64,
}

impl TreeWalk for WindWeightWalk {
    type Query = WindQuery;
    type Result = WindWeightResult;
    type Record = WindData;

    fn label(&self) -> &'static str {
        "SFR_WIND"
    }

    fn haswork(&self, store: &ParticleStore, target: usize) -> bool {
        !store.particles[target].density_iteration_done()
    }

    fn record_slot(&self, store: &ParticleStore, target: usize) -> Result<usize, WindError> {
        star_slot(store, target)
    }

    fn fill(&self, store: &ParticleStore, target: usize, record: &WindData) -> WindQuery {
        WindQuery::new(store, target, record)
    }

    fn ngbiter_init(&self, query: &WindQuery) -> NgbIter {
        NgbIter {
            center: query.pos,
            hsml: query.hsml.max(query.dm_radius),
            mask: TypeMask::GAS_AND_DM,
        }
    }

    fn ngbiter(&self, query: &WindQuery, result: &mut WindWeightResult, ngb: &Neighbour<'_>, _store: &ParticleStore) {
        let other = ngb.particle;
        match other.ptype {
            ParticleType::Gas => {
                if ngb.r > query.hsml {
                    return;
                }
                // Unweighted: every gas particle counts with its full mass.
                result.total_weight += other.mass;
            }
            ParticleType::DarkMatter => {
                if ngb.r > query.dm_radius {
                    return;
                }
                result.ngb += 1;
                let vel = other.velocity();
                for d in 0..3 {
                    let v = vel[d] + self.cosmo.hubble_flow(ngb.dist[d]);
                    result.v1sum[d] += v;
                    result.v2sum += v * v;
                }
            }
            _ => {}
        }
    }

    fn reduce(&self, record: &mut WindData, result: WindWeightResult, mode: ReduceMode) {
        mode.reduce_f64(&mut record.total_weight, result.total_weight);
        for k in 0..3 {
            mode.reduce_f64(&mut record.v1sum[k], result.v1sum[k]);
        }
        mode.reduce_f64(&mut record.v2sum, result.v2sum);
        mode.reduce_i64(&mut record.ngb, result.ngb);
    }

    fn postprocess(&self, store: &ParticleStore, target: usize, record: &mut WindData) -> Result<bool, WindError> {
        star_slot(store, target)?;
        let star = &store.particles[target];

        if !record.bisect(self.max_radius) {
            return Ok(true);
        }

        star.set_density_iteration_done(true);
        record.vdisp = record.velocity_dispersion();
        if record.ngb == 0 {
            warn!(
                "Star {} converged with no dark matter neighbours (radius {}), velocity dispersion set to zero",
                star.id, record.dm_radius
            );
        }
        Ok(false)
    }
}
