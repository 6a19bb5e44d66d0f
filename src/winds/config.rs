// src/winds/config.rs
use std::fmt;
use std::str::FromStr;

use log::info;

use crate::treewalk::Communicator;
use crate::utils::WindError;

/// Kinetic feedback model deciding launch efficiency and kick speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindModel {
    /// Constant efficiency and speed (Dalla Vecchia & Schaye 2008 style).
    FixedEfficiency,
    /// Efficiency and speed scale with the local dark matter velocity
    /// dispersion (Okamoto et al. 2010 style).
    HaloDispersion,
}

/// Parsed wind model selection: one kinetic model plus two orthogonal
/// switches.
///
/// The textual form is a list separated by `|`, `,` or whitespace, e.g.
/// `"halo|decouple-hydro"`. Exactly one kinetic model must be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindModelSelector {
    pub model: WindModel,
    /// Launch winds directly from the spawning gas particle, no tree walk.
    pub subgrid: bool,
    /// Wind particles ignore hydrodynamic forces while their timer runs.
    pub decouple_hydro: bool,
}

impl FromStr for WindModelSelector {
    type Err = WindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut model = None;
        let mut subgrid = false;
        let mut decouple_hydro = false;

        for token in s.split(|c: char| c == '|' || c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
            let kinetic = match token.to_ascii_lowercase().as_str() {
                "fixed-efficiency" | "fixedefficiency" | "vs08" | "sh03" => Some(WindModel::FixedEfficiency),
                "halo" | "use-halo" | "halo-dispersion" | "ofjt10" => Some(WindModel::HaloDispersion),
                "subgrid" => {
                    subgrid = true;
                    None
                }
                "decouple-hydro" | "decouple" => {
                    decouple_hydro = true;
                    None
                }
                _ => return Err(WindError::InvalidModel(s.to_string())),
            };
            if let Some(kinetic) = kinetic {
                if model.is_some_and(|m| m != kinetic) {
                    return Err(WindError::InvalidModel(s.to_string()));
                }
                model = Some(kinetic);
            }
        }

        match model {
            Some(model) => Ok(WindModelSelector { model, subgrid, decouple_hydro }),
            None => Err(WindError::InvalidModel(s.to_string())),
        }
    }
}

impl fmt::Display for WindModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = match self.model {
            WindModel::FixedEfficiency => "fixed-efficiency",
            WindModel::HaloDispersion => "halo",
        };
        write!(f, "{}", model)?;
        if self.subgrid {
            write!(f, "|subgrid")?;
        }
        if self.decouple_hydro {
            write!(f, "|decouple-hydro")?;
        }
        Ok(())
    }
}

/// Raw wind parameters as read from the parameter file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindParams {
    pub model: WindModelSelector,
    pub efficiency: f64,
    pub energy_fraction: f64,
    /// Reference velocity dispersion of the halo model.
    pub sigma0: f64,
    /// Kick speed in units of the velocity dispersion (halo model).
    pub speed_factor: f64,
    /// Comoving distance a wind particle travels decoupled.
    pub free_travel_length: f64,
    /// Recoupling density in units of the star formation threshold.
    pub free_travel_dens_fac: f64,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            model: WindModelSelector {
                model: WindModel::FixedEfficiency,
                subgrid: false,
                decouple_hydro: true,
            },
            efficiency: 2.0,
            energy_fraction: 1.0,
            sigma0: 353.0,
            speed_factor: 2.95,
            free_travel_length: 20.0,
            free_travel_dens_fac: 0.1,
        }
    }
}

impl WindParams {
    /// Builds a parameter block, taking defaults for anything not given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidModel` if `model` does not parse, and
    /// `InvalidParameter` if a value is out of range.
    pub fn new(
        model: Option<&str>,
        efficiency: Option<f64>,
        energy_fraction: Option<f64>,
        sigma0: Option<f64>,
        speed_factor: Option<f64>,
        free_travel_length: Option<f64>,
        free_travel_dens_fac: Option<f64>,
    ) -> Result<Self, WindError> {
        let default = WindParams::default();
        let params = Self {
            model: model.map(str::parse::<WindModelSelector>).transpose()?.unwrap_or(default.model),
            efficiency: efficiency.unwrap_or(default.efficiency),
            energy_fraction: energy_fraction.unwrap_or(default.energy_fraction),
            sigma0: sigma0.unwrap_or(default.sigma0),
            speed_factor: speed_factor.unwrap_or(default.speed_factor),
            free_travel_length: free_travel_length.unwrap_or(default.free_travel_length),
            free_travel_dens_fac: free_travel_dens_fac.unwrap_or(default.free_travel_dens_fac),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), WindError> {
        let non_negative = [
            ("WindEfficiency", self.efficiency),
            ("WindEnergyFraction", self.energy_fraction),
            ("WindSigma0", self.sigma0),
            ("WindSpeedFactor", self.speed_factor),
            ("WindFreeTravelLength", self.free_travel_length),
            ("WindFreeTravelDensFac", self.free_travel_dens_fac),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(WindError::InvalidParameter(format!("{} = {}", name, value)));
            }
        }
        if self.model.model == WindModel::FixedEfficiency && self.efficiency == 0.0 {
            return Err(WindError::InvalidParameter(
                "WindEfficiency must be positive for the fixed-efficiency model".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads the wind parameters on task 0 and broadcasts them to every task.
///
/// Only task 0 needs to supply `params`; other tasks may pass `None`. Every
/// task returns the same, validated parameter block.
pub fn set_winds_params<C: Communicator>(params: Option<WindParams>, comm: &C) -> Result<WindParams, WindError> {
    let local = if comm.this_task() == 0 {
        let params = params.ok_or_else(|| WindError::InvalidParameter("task 0 has no wind parameters".to_string()))?;
        params.validate()?;
        Some(params)
    } else {
        None
    };
    comm.broadcast(local)
        .ok_or_else(|| WindError::InvalidParameter("wind parameters were not broadcast".to_string()))
}

/// Wind configuration with derived quantities, identical on every task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindConfig {
    pub model: WindModel,
    pub subgrid: bool,
    pub decouple_hydro: bool,
    pub efficiency: f64,
    pub energy_fraction: f64,
    /// Physical wind speed.
    pub speed: f64,
    pub sigma0: f64,
    pub speed_factor: f64,
    pub free_travel_length: f64,
    pub free_travel_dens_fac: f64,
    /// Physical density below which wind particles recouple.
    pub free_travel_dens_thresh: f64,
}

impl WindConfig {
    /// Derives the wind speed and recoupling threshold once the star
    /// formation parameters are known.
    ///
    /// `factor_sn` is the mass fraction returned by supernovae, `egy_spec_sn`
    /// the supernova energy per unit mass, `phys_dens_thresh` the physical star
    /// formation density threshold.
    pub fn init(params: &WindParams, factor_sn: f64, egy_spec_sn: f64, phys_dens_thresh: f64) -> Result<Self, WindError> {
        params.validate()?;
        if !(0.0..1.0).contains(&factor_sn) {
            return Err(WindError::InvalidParameter(format!("FactorSN = {} must lie in [0, 1)", factor_sn)));
        }

        let mut speed = (2.0 * params.energy_fraction * factor_sn * egy_spec_sn / (1.0 - factor_sn)).sqrt();
        if params.model.model == WindModel::FixedEfficiency {
            speed /= params.efficiency.sqrt();
            info!("Windspeed: {}", speed);
        } else {
            info!("Reference Windspeed: {}", params.sigma0 * params.speed_factor);
        }
        if !speed.is_finite() {
            return Err(WindError::InvalidParameter(format!("derived wind speed {} is not finite", speed)));
        }
        // Kicks at zero speed would never recouple
        let kicks_at_speed = params.model.subgrid || params.model.model == WindModel::FixedEfficiency;
        if kicks_at_speed && speed <= 0.0 {
            return Err(WindError::InvalidParameter(format!(
                "derived wind speed {} must be positive (WindEnergyFraction = {}, FactorSN = {})",
                speed, params.energy_fraction, factor_sn
            )));
        }
        if !params.model.subgrid && params.model.model == WindModel::HaloDispersion && params.speed_factor <= 0.0 {
            return Err(WindError::InvalidParameter(
                "WindSpeedFactor must be positive for the halo model".to_string(),
            ));
        }

        Ok(Self {
            model: params.model.model,
            subgrid: params.model.subgrid,
            decouple_hydro: params.model.decouple_hydro,
            efficiency: params.efficiency,
            energy_fraction: params.energy_fraction,
            speed,
            sigma0: params.sigma0,
            speed_factor: params.speed_factor,
            free_travel_length: params.free_travel_length,
            free_travel_dens_fac: params.free_travel_dens_fac,
            free_travel_dens_thresh: params.free_travel_dens_fac * phys_dens_thresh,
        })
    }
}
