use crate::particles::{ParticleStore, TypeMask};
use crate::treewalk::{run, Neighbour, NgbIter, Octree, ReduceMode, TreeWalk};
use crate::utils::WindError;

/// Counts gas neighbours of stars, growing the radius until at least
/// `wanted` are found.
struct GrowUntil {
    wanted: i64,
}

#[derive(Debug, Clone, Default)]
struct Count {
    radius: f64,
    ngb: i64,
    rounds: usize,
}

struct CountQuery {
    pos: [f64; 3],
    radius: f64,
}

impl TreeWalk for GrowUntil {
    type Query = CountQuery;
    type Result = i64;
    type Record = Count;

    fn label(&self) -> &'static str {
        "GROW_UNTIL"
    }

    fn fill(&self, store: &ParticleStore, target: usize, record: &Count) -> CountQuery {
        CountQuery { pos: store.particles[target].pos, radius: record.radius }
    }

    fn ngbiter_init(&self, query: &CountQuery) -> NgbIter {
        NgbIter { center: query.pos, hsml: query.radius, mask: TypeMask::GAS }
    }

    fn ngbiter(&self, _query: &CountQuery, result: &mut i64, _ngb: &Neighbour<'_>, _store: &ParticleStore) {
        *result += 1;
    }

    fn reduce(&self, record: &mut Count, result: i64, mode: ReduceMode) {
        mode.reduce_i64(&mut record.ngb, result);
    }

    fn postprocess(&self, _store: &ParticleStore, _target: usize, record: &mut Count) -> Result<bool, WindError> {
        record.rounds += 1;
        if record.ngb < self.wanted {
            record.radius *= 2.0;
            return Ok(true);
        }
        Ok(false)
    }
}

fn line_of_gas(n: u64) -> ParticleStore {
    let mut store = ParticleStore::new();
    for id in 0..n {
        store.add_gas(id, 1.0, [id as f64, 0.0, 0.0], [0.0; 3], 1.0, 1.0);
    }
    store
}

#[test]
fn test_reduce_mode() {
    let mut x = 3.0;
    ReduceMode::Primary.reduce_f64(&mut x, 2.0);
    assert_eq!(x, 2.0);
    ReduceMode::Ghosts.reduce_f64(&mut x, 2.0);
    assert_eq!(x, 4.0);

    let mut n = 5;
    ReduceMode::Primary.reduce_i64(&mut n, 1);
    ReduceMode::Ghosts.reduce_i64(&mut n, 1);
    assert_eq!(n, 2);
}

#[test]
fn test_run_iterates_until_done() {
    let mut store = line_of_gas(20);
    let star = store.add_star(100, 1.0, [0.0, 0.0, 0.0], [0.0; 3], 1.0);
    let tree = Octree::build(&store.particles);
    let mut records = vec![Count { radius: 0.5, ..Default::default() }; store.star_slots()];

    let tw = GrowUntil { wanted: 5 };
    let mut rounds = 0;
    loop {
        let summary = run(&tw, &tree, &store, &[star], &mut records).expect("walk failed");
        assert_eq!(summary.visited, 1);
        rounds += 1;
        if summary.pending == 0 {
            break;
        }
    }
    // radii 0.5, 1, 2, 4: gas at x = 0..=4 is within 4.0
    assert_eq!(rounds, 4);
    assert_eq!(records[0].rounds, 4);
    assert_eq!(records[0].ngb, 5);
    assert_eq!(records[0].radius, 4.0);
}

#[test]
fn test_primary_reduce_replaces_previous_round() {
    let mut store = line_of_gas(10);
    let star = store.add_star(100, 1.0, [0.0; 3], [0.0; 3], 1.0);
    let tree = Octree::build(&store.particles);
    let mut records = vec![Count { radius: 2.0, ..Default::default() }];
    let tw = GrowUntil { wanted: 0 };

    run(&tw, &tree, &store, &[star], &mut records).expect("walk failed");
    run(&tw, &tree, &store, &[star], &mut records).expect("walk failed");
    assert_eq!(records[0].ngb, 3);
}

#[test]
fn test_pending_is_summed_over_targets() {
    let mut store = line_of_gas(3);
    let stars: Vec<usize> = (0..50)
        .map(|k| store.add_star(1000 + k, 1.0, [100.0 + k as f64, 0.0, 0.0], [0.0; 3], 1.0))
        .collect();
    let tree = Octree::build(&store.particles);
    let mut records = vec![Count { radius: 0.1, ..Default::default() }; store.star_slots()];

    let summary = run(&GrowUntil { wanted: 1 }, &tree, &store, &stars, &mut records).expect("walk failed");
    assert_eq!(summary, crate::treewalk::TreeWalkRun { visited: 50, pending: 50 });
}

#[test]
fn test_missing_record_is_reported() {
    let mut store = line_of_gas(3);
    let star = store.add_star(100, 1.0, [0.0; 3], [0.0; 3], 1.0);
    let tree = Octree::build(&store.particles);
    let mut records: Vec<Count> = Vec::new();

    let err = run(&GrowUntil { wanted: 1 }, &tree, &store, &[star], &mut records).unwrap_err();
    assert_eq!(err, WindError::MissingRecord { index: star, slot: 0 });
}
