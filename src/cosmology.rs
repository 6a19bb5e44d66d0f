/// Cosmological factors at the current time.
///
/// Positions in the particle store are comoving; `a` converts them to physical
/// units and `hubble` is the Hubble rate H(a) in internal units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cosmology {
    /// Scale factor.
    pub a: f64,
    /// Hubble rate at `a`.
    pub hubble: f64,
}

impl Default for Cosmology {
    /// A static universe: a = 1, no Hubble flow.
    fn default() -> Self {
        Self { a: 1.0, hubble: 0.0 }
    }
}

impl Cosmology {
    pub fn new(a: f64, hubble: f64) -> Self {
        Self { a, hubble }
    }

    /// 1 / a^3, converts comoving densities to physical ones.
    pub fn a3inv(&self) -> f64 {
        1.0 / (self.a * self.a * self.a)
    }

    /// Proper time elapsed over a step of `dloga` in log scale factor.
    ///
    /// With no Hubble flow the step is already a proper time.
    pub fn proper_time(&self, dloga: f64) -> f64 {
        if self.hubble > 0.0 {
            dloga / self.hubble
        } else {
            dloga
        }
    }

    /// Peculiar velocity correction for a comoving separation `dx`.
    #[inline]
    pub fn hubble_flow(&self, dx: f64) -> f64 {
        self.hubble * self.a * self.a * dx
    }
}
