mod octree;
mod communicator;
mod engine;

pub use octree::*;
pub use communicator::*;
pub use engine::*;

#[cfg(test)]
mod engine_tests;
