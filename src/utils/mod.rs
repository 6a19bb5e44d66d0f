pub mod errors;
pub mod constants;
pub mod atomic_float;
pub mod random;

pub use errors::*;
pub use constants::*;
pub use atomic_float::*;
pub use random::*;

#[cfg(test)]
mod random_tests;
