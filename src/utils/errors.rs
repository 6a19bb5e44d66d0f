use std::fmt;
use std::error::Error;

use crate::particles::ParticleType;

/// Represents errors that can occur while applying wind feedback.
///
/// Every variant is fatal for the run: the caller is expected to propagate it
/// up and stop the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum WindError {
    /// The wind model selector is unknown or names no usable kinetic model.
    InvalidModel(String),
    /// A star-only code path was handed some other particle.
    NotAStar {
        index: usize,
        ptype: ParticleType,
        id: u64,
    },
    /// A configuration value, or one derived from it, is out of range.
    InvalidParameter(String),
    /// A gas particle has no SPH slot attached.
    MissingSphData { index: usize },
    /// A tree walk target maps to a record slot that was never allocated.
    MissingRecord { index: usize, slot: usize },
}

impl fmt::Display for WindError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WindError::InvalidModel(model) => write!(f, "Unsupported wind model selection: {}", model),
            WindError::NotAStar { index, ptype, id } => write!(
                f,
                "Wind called on something not a star particle: (i={}, t={:?}, id = {})",
                index, ptype, id
            ),
            WindError::InvalidParameter(msg) => write!(f, "Invalid wind parameter: {}", msg),
            WindError::MissingSphData { index } => write!(f, "Gas particle {} has no SPH data", index),
            WindError::MissingRecord { index, slot } => write!(f, "Particle {} maps to unallocated record slot {}", index, slot),
        }
    }
}

impl Error for WindError {}
