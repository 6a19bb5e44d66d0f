/// Number of dark matter neighbours used for the velocity dispersion estimate.
pub const TARGET_DM_NGB: i64 = 40;
/// Accepted deviation from `TARGET_DM_NGB`.
pub const DM_NGB_TOLERANCE: i64 = 2;
/// Once the bisection bracket is narrower than this the radius is accepted.
pub const DM_RADIUS_CONVERGENCE: f64 = 1e-2;
/// Growth factor for the search radius while no upper bound is known.
pub const DM_RADIUS_GROWTH: f64 = 1.3;
/// Initial dark matter search radius in units of the star's smoothing length.
pub const DM_RADIUS_INIT_FACTOR: f64 = 2.0;

/// Adiabatic index of the gas.
pub const GAMMA: f64 = 5.0 / 3.0;

// Offsets added to particle ids before drawing, so that different draws for
// the same particle are independent.
pub const SUBGRID_DRAW_OFFSET: u64 = 2;
pub const WIND_THETA_OFFSET: u64 = 3;
pub const WIND_PHI_OFFSET: u64 = 4;
