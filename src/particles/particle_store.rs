use crate::particles::{Particle, ParticleType, SphData};
use crate::utils::WindError;

/// Owner of the particle arrays.
///
/// `particles` holds every species. Gas particles additionally own an entry
/// in `sph`, addressed by `Particle::slot`. Stars get a slot number too, used
/// to address per-star scratch storage such as the wind data.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    pub particles: Vec<Particle>,
    pub sph: Vec<SphData>,
    star_slots: usize,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of star slots handed out so far.
    pub fn star_slots(&self) -> usize {
        self.star_slots
    }

    /// Appends a particle, assigning it a slot in its species storage.
    /// Returns the particle index.
    pub fn push(&mut self, mut particle: Particle) -> usize {
        match particle.ptype {
            ParticleType::Gas => {
                particle.slot = self.sph.len();
                self.sph.push(SphData::default());
            }
            ParticleType::Star => {
                particle.slot = self.star_slots;
                self.star_slots += 1;
            }
            _ => {}
        }
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn add_gas(&mut self, id: u64, mass: f64, pos: [f64; 3], vel: [f64; 3], hsml: f64, density: f64) -> usize {
        let i = self.push(Particle::new(id, ParticleType::Gas, mass, pos, vel, hsml));
        let slot = self.particles[i].slot;
        self.sph[slot].density = density;
        i
    }

    pub fn add_dark_matter(&mut self, id: u64, mass: f64, pos: [f64; 3], vel: [f64; 3]) -> usize {
        self.push(Particle::new(id, ParticleType::DarkMatter, mass, pos, vel, 0.0))
    }

    pub fn add_star(&mut self, id: u64, mass: f64, pos: [f64; 3], vel: [f64; 3], hsml: f64) -> usize {
        self.push(Particle::new(id, ParticleType::Star, mass, pos, vel, hsml))
    }

    /// SPH data of gas particle `i`.
    pub fn sph(&self, i: usize) -> Result<&SphData, WindError> {
        let p = &self.particles[i];
        if p.ptype != ParticleType::Gas {
            return Err(WindError::MissingSphData { index: i });
        }
        self.sph.get(p.slot).ok_or(WindError::MissingSphData { index: i })
    }

    /// Mutable particle and SPH data of gas particle `i`.
    pub fn gas_mut(&mut self, i: usize) -> Result<(&mut Particle, &mut SphData), WindError> {
        let p = &mut self.particles[i];
        if p.ptype != ParticleType::Gas {
            return Err(WindError::MissingSphData { index: i });
        }
        let sph = self.sph.get_mut(p.slot).ok_or(WindError::MissingSphData { index: i })?;
        Ok((p, sph))
    }

    /// Indices of all particles of species `ptype`.
    pub fn indices_of(&self, ptype: ParticleType) -> Vec<usize> {
        self.particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.ptype == ptype)
            .map(|(i, _)| i)
            .collect()
    }
}
