use crate::cosmology::Cosmology;
use crate::particles::{Particle, ParticleStore, SphData};
use crate::utils::{isotropic_direction, RandomSource, WindError, SUBGRID_DRAW_OFFSET};
use crate::winds::Winds;

impl Winds {
    /// Subgrid wind launch, called once each time gas particle `parent`
    /// spawns a star of mass `star_mass`.
    ///
    /// `parent.mass` is the mass left on the gas particle after the spawn.
    /// With probability `1 - exp(-efficiency * star_mass / parent.mass)` the
    /// parent itself is kicked at the wind speed in a random direction and
    /// decoupled for the free-travel time. Does nothing unless the subgrid
    /// model is selected. Returns whether a wind was launched.
    pub fn make_after_sf<R: RandomSource + ?Sized>(
        &self,
        parent: &mut Particle,
        sph: &mut SphData,
        star_mass: f64,
        cosmo: &Cosmology,
        rng: &R,
    ) -> bool {
        if !self.config.subgrid {
            return false;
        }
        let pw = self.config.efficiency * star_mass / parent.mass;
        let prob = 1.0 - (-pw).exp();
        if rng.uniform(parent.id.wrapping_add(SUBGRID_DRAW_OFFSET)) >= prob {
            return false;
        }

        let v = self.config.speed * cosmo.a;
        let dir = isotropic_direction(rng, parent.id);
        for (vel, d) in parent.vel.iter_mut().zip(dir) {
            *vel.get_mut() += v * d;
        }
        *sph.delay_time.get_mut() = self.config.free_travel_length / (v / cosmo.a);
        true
    }

    /// `make_after_sf` for gas particle `i` of `store`.
    pub fn make_after_sf_at<R: RandomSource + ?Sized>(
        &self,
        store: &mut ParticleStore,
        i: usize,
        star_mass: f64,
        cosmo: &Cosmology,
        rng: &R,
    ) -> Result<bool, WindError> {
        let (parent, sph) = store.gas_mut(i)?;
        Ok(self.make_after_sf(parent, sph, star_mass, cosmo, rng))
    }
}
