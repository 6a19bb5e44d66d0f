use crate::utils::{
    DM_NGB_TOLERANCE, DM_RADIUS_CONVERGENCE, DM_RADIUS_GROWTH, DM_RADIUS_INIT_FACTOR, TARGET_DM_NGB,
};

/// Per-star scratch record for one feedback invocation.
///
/// While the neighbour search is iterating, `ngb`, `v1sum` and `v2sum` hold
/// the raw dark matter statistics of the last round. Once the star's
/// iteration flag is set, `vdisp` holds the final velocity dispersion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindData {
    /// Current dark matter search radius.
    pub dm_radius: f64,
    /// Bisection lower bound.
    pub left: f64,
    /// Bisection upper bound, negative while none is known.
    pub right: f64,
    /// Total gas mass within the star's smoothing length.
    pub total_weight: f64,
    /// Dark matter neighbours within `dm_radius`.
    pub ngb: i64,
    pub v1sum: [f64; 3],
    pub v2sum: f64,
    pub vdisp: f64,
}

impl Default for WindData {
    fn default() -> Self {
        Self {
            dm_radius: 0.0,
            left: 0.0,
            right: -1.0,
            total_weight: 0.0,
            ngb: 0,
            v1sum: [0.0; 3],
            v2sum: 0.0,
            vdisp: 0.0,
        }
    }
}

impl WindData {
    /// Fresh record for a star with smoothing length `hsml`.
    pub fn new(hsml: f64) -> Self {
        Self { dm_radius: DM_RADIUS_INIT_FACTOR * hsml, ..Default::default() }
    }

    pub fn has_upper_bound(&self) -> bool {
        self.right >= 0.0
    }

    /// Updates the search radius from the neighbour count of the last round.
    ///
    /// Returns true once the search has converged, either because the count
    /// is within tolerance of the target or because the bracket
    /// `[left, right]` has become narrower than `DM_RADIUS_CONVERGENCE`.
    /// While no upper bound is known the radius grows geometrically, until it
    /// passes `max_radius`, beyond which no further neighbours can appear.
    pub fn bisect(&mut self, max_radius: f64) -> bool {
        let diff = self.ngb - TARGET_DM_NGB;
        let mut done = false;
        if diff < -DM_NGB_TOLERANCE {
            // too few
            self.left = self.dm_radius;
        } else if diff > DM_NGB_TOLERANCE {
            // too many
            self.right = self.dm_radius;
        } else {
            done = true;
        }

        if self.has_upper_bound() {
            if self.right - self.left < DM_RADIUS_CONVERGENCE {
                done = true;
            } else {
                self.dm_radius = 0.5 * (self.left + self.right);
            }
        } else if self.dm_radius > max_radius {
            done = true;
        } else {
            self.dm_radius *= DM_RADIUS_GROWTH;
        }
        done
    }

    /// Velocity dispersion from the accumulated sums, zero without neighbours.
    pub fn velocity_dispersion(&self) -> f64 {
        if self.ngb <= 0 {
            return 0.0;
        }
        let n = self.ngb as f64;
        let mut vdisp = self.v2sum / n;
        for v1 in self.v1sum {
            vdisp -= (v1 / n).powi(2);
        }
        (vdisp / 3.0).max(0.0).sqrt()
    }
}
