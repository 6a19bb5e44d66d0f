use std::sync::atomic::{AtomicBool, Ordering};

use crate::utils::{load_vec3, AtomicF64};

/// Particle species. The discriminant doubles as the bit position in a
/// `TypeMask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleType {
    Gas = 0,
    DarkMatter = 1,
    Star = 4,
    BlackHole = 5,
}

impl ParticleType {
    #[inline]
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Set of particle species a neighbour search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeMask(pub u32);

impl TypeMask {
    pub const GAS: TypeMask = TypeMask(1 << 0);
    pub const DARK_MATTER: TypeMask = TypeMask(1 << 1);
    pub const GAS_AND_DM: TypeMask = TypeMask((1 << 0) | (1 << 1));

    pub fn of(ptype: ParticleType) -> Self {
        TypeMask(ptype.bit())
    }

    #[inline]
    pub fn contains(self, ptype: ParticleType) -> bool {
        self.0 & ptype.bit() != 0
    }

    #[inline]
    pub fn intersects(self, other: TypeMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: TypeMask) -> Self {
        TypeMask(self.0 | other.0)
    }
}

/// A simulation particle.
///
/// Velocity components are atomic because wind kicks from several stars may
/// land on the same gas particle concurrently. The density iteration flag is
/// only meaningful for stars and is written by the thread working on that
/// star.
#[derive(Debug)]
pub struct Particle {
    pub id: u64,
    pub ptype: ParticleType,
    pub mass: f64,
    pub pos: [f64; 3],       // comoving position
    pub vel: [AtomicF64; 3], // peculiar velocity, internal units
    pub hsml: f64,           // smoothing length
    /// Index into the species specific storage (SPH data for gas, wind
    /// scratch for stars).
    pub slot: usize,
    density_iteration_done: AtomicBool,
}

impl Particle {
    pub fn new(id: u64, ptype: ParticleType, mass: f64, pos: [f64; 3], vel: [f64; 3], hsml: f64) -> Self {
        Self {
            id,
            ptype,
            mass,
            pos,
            vel: [AtomicF64::new(vel[0]), AtomicF64::new(vel[1]), AtomicF64::new(vel[2])],
            hsml,
            slot: 0,
            density_iteration_done: AtomicBool::new(false),
        }
    }

    pub fn velocity(&self) -> [f64; 3] {
        load_vec3(&self.vel)
    }

    /// Adds `dv` to the velocity, safe against concurrent kicks.
    pub fn kick(&self, dv: [f64; 3]) {
        for (v, d) in self.vel.iter().zip(dv) {
            v.fetch_add(d);
        }
    }

    pub fn density_iteration_done(&self) -> bool {
        self.density_iteration_done.load(Ordering::Relaxed)
    }

    pub fn set_density_iteration_done(&self, done: bool) {
        self.density_iteration_done.store(done, Ordering::Relaxed);
    }

    /// Comoving separation `self - other`, per axis, and its length.
    pub fn separation(&self, other: &Particle) -> ([f64; 3], f64) {
        separation(&self.pos, &other.pos)
    }
}

impl Clone for Particle {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            ptype: self.ptype,
            mass: self.mass,
            pos: self.pos,
            vel: self.vel.clone(),
            hsml: self.hsml,
            slot: self.slot,
            density_iteration_done: AtomicBool::new(self.density_iteration_done()),
        }
    }
}

/// Per axis difference `a - b` and the Euclidean distance.
#[inline]
pub fn separation(a: &[f64; 3], b: &[f64; 3]) -> ([f64; 3], f64) {
    let dist = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    let r = (dist[0] * dist[0] + dist[1] * dist[1] + dist[2] * dist[2]).sqrt();
    (dist, r)
}

/// Hydrodynamic state carried by gas particles only.
#[derive(Debug, Clone, Default)]
pub struct SphData {
    /// Remaining free-travel time of a wind particle. Zero means the particle
    /// is coupled to the hydrodynamics.
    pub delay_time: AtomicF64,
    /// Comoving density.
    pub density: f64,
    pub hydro_accel: [f64; 3],
    /// Rate of change of the entropy.
    pub dt_entropy: f64,
    pub max_signal_vel: f64,
}

impl SphData {
    pub fn new(density: f64) -> Self {
        Self { density, ..Default::default() }
    }

    pub fn delay_time(&self) -> f64 {
        self.delay_time.load()
    }
}
