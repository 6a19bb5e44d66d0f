pub mod utils;
pub mod cosmology;
pub mod particles;
#[cfg(feature = "treewalk")]
pub mod treewalk;
#[cfg(feature = "winds")]
pub mod winds;
