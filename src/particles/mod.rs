mod particle;
mod particle_store;

pub use particle::*;
pub use particle_store::*;
