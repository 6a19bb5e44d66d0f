//! Generic neighbour tree walk.
//!
//! A `TreeWalk` describes one kind of neighbour computation through a set of
//! callbacks; `run` drives it over a batch of target particles. For each
//! target that `haswork`, a query is filled from the target's record, the
//! octree is searched with the parameters returned by `ngbiter_init`, and every
//! neighbour is handed to `ngbiter`. The partial results are then reduced into
//! the target's record and `postprocess` decides whether the target needs
//! another round.
//!
//! Searches run in parallel with rayon. Records are addressed by slot, and
//! each record is only touched by the worker handling its own target.
use log::debug;
use rayon::prelude::*;

use crate::particles::{Particle, ParticleStore, TypeMask};
use crate::treewalk::Octree;
use crate::utils::WindError;

/// How a partial result is combined into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceMode {
    /// The result was computed for a local target: it replaces the record's
    /// accumulators.
    Primary,
    /// The result is a partial contribution from elsewhere: it is added.
    Ghosts,
}

impl ReduceMode {
    #[inline]
    pub fn reduce_f64(self, target: &mut f64, value: f64) {
        match self {
            ReduceMode::Primary => *target = value,
            ReduceMode::Ghosts => *target += value,
        }
    }

    #[inline]
    pub fn reduce_i64(self, target: &mut i64, value: i64) {
        match self {
            ReduceMode::Primary => *target = value,
            ReduceMode::Ghosts => *target += value,
        }
    }
}

/// Search parameters returned by the initialisation call of a walk.
///
/// Searches are asymmetric: only the target's radius counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NgbIter {
    pub center: [f64; 3],
    pub hsml: f64,
    pub mask: TypeMask,
}

/// A candidate neighbour handed to `TreeWalk::ngbiter`.
#[derive(Debug, Clone, Copy)]
pub struct Neighbour<'a> {
    pub index: usize,
    pub particle: &'a Particle,
    /// Distance to the target.
    pub r: f64,
    /// Comoving separation `target - neighbour` per axis.
    pub dist: [f64; 3],
}

pub trait TreeWalk: Sync {
    type Query: Send + Sync;
    type Result: Default + Send;
    type Record: Send + Sync;

    /// Name used in log output.
    fn label(&self) -> &'static str;

    /// Restricts which targets are visited this round.
    fn haswork(&self, _store: &ParticleStore, _target: usize) -> bool {
        true
    }

    /// Slot of `target`'s record.
    fn record_slot(&self, store: &ParticleStore, target: usize) -> Result<usize, WindError> {
        Ok(store.particles[target].slot)
    }

    fn fill(&self, store: &ParticleStore, target: usize, record: &Self::Record) -> Self::Query;

    /// Initial call before any neighbour is visited; returns the search parameters.
    fn ngbiter_init(&self, query: &Self::Query) -> NgbIter;

    fn ngbiter(&self, query: &Self::Query, result: &mut Self::Result, ngb: &Neighbour<'_>, store: &ParticleStore);

    fn reduce(&self, _record: &mut Self::Record, _result: Self::Result, _mode: ReduceMode) {}

    /// Runs once per visited target after its result is reduced. Returns
    /// `true` when the target is not finished and needs another round.
    fn postprocess(&self, _store: &ParticleStore, _target: usize, _record: &mut Self::Record) -> Result<bool, WindError> {
        Ok(false)
    }
}

/// Summary of one call to `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeWalkRun {
    /// Targets that passed `haswork`.
    pub visited: usize,
    /// Targets whose postprocess asked for another round.
    pub pending: usize,
}

/// Searches the neighbourhood of one query and accumulates its result.
pub fn visit_ngbiter<W: TreeWalk>(tw: &W, tree: &Octree, store: &ParticleStore, query: &W::Query) -> W::Result {
    let iter = tw.ngbiter_init(query);
    let mut result = W::Result::default();
    tree.for_each_neighbour(&store.particles, &iter.center, iter.hsml, iter.mask, |index, dist, r| {
        let ngb = Neighbour { index, particle: &store.particles[index], r, dist };
        tw.ngbiter(query, &mut result, &ngb, store);
    });
    result
}

/// Runs one round of `tw` over `targets`.
///
/// `records` holds one record per slot; `tree` must have been built from
/// `store.particles`.
pub fn run<W: TreeWalk>(
    tw: &W,
    tree: &Octree,
    store: &ParticleStore,
    targets: &[usize],
    records: &mut [W::Record],
) -> Result<TreeWalkRun, WindError> {
    let work: Vec<usize> = targets
        .par_iter()
        .copied()
        .filter(|&target| tw.haswork(store, target))
        .collect();

    let results: Vec<(usize, usize, W::Result)> = {
        let records: &[W::Record] = records;
        work.par_iter()
            .map(|&target| -> Result<_, WindError> {
                let slot = tw.record_slot(store, target)?;
                let record = records.get(slot).ok_or(WindError::MissingRecord { index: target, slot })?;
                let query = tw.fill(store, target, record);
                Ok((target, slot, visit_ngbiter(tw, tree, store, &query)))
            })
            .collect::<Result<_, WindError>>()?
    };

    // Route each result to its record so records can be updated in parallel
    let mut by_slot: Vec<Option<(usize, W::Result)>> = (0..records.len()).map(|_| None).collect();
    for (target, slot, result) in results {
        by_slot[slot] = Some((target, result));
    }

    let pending = records
        .par_iter_mut()
        .zip(by_slot.into_par_iter())
        .map(|(record, visited)| match visited {
            Some((target, result)) => {
                tw.reduce(record, result, ReduceMode::Primary);
                tw.postprocess(store, target, record).map(usize::from)
            }
            None => Ok(0),
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))?;

    debug!("{}: visited {} targets, {} pending", tw.label(), work.len(), pending);

    Ok(TreeWalkRun { visited: work.len(), pending })
}
