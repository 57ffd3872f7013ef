//! Simulation runs configured from TOML
//!
//! A run bundles the initial temperature, the output time grid, the model
//! parameters and the solver options. Every section is optional:
//!
//! ```toml
//! initial_temperature = 287.0
//! expected_equilibrium = 288.0
//!
//! [time_grid]
//! start = 0.0
//! end = 50.0
//! points = 51
//!
//! [parameters]
//! emissivity = 0.61
//!
//! [solver]
//! method = "dop853"
//! ```

use ebm_components::constants::PRESENT_DAY_TEMPERATURE;
use ebm_components::{EnergyBalanceModel, EnergyBalanceParameters};
use ebm_core::errors::{EBMError, EBMResult};
use ebm_core::ivp::SolverOptions;
use ebm_core::timeseries::{FloatValue, Time, TimeGrid, Trajectory};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output times of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeGridConfig {
    /// Explicit, non-decreasing list of times
    Explicit { times: Vec<Time> },
    /// `points` evenly spaced times from `start` to `end` inclusive
    Evenly { start: Time, end: Time, points: usize },
}

impl Default for TimeGridConfig {
    fn default() -> Self {
        TimeGridConfig::Evenly {
            start: 0.0,
            end: 10.0,
            points: 50,
        }
    }
}

impl TimeGridConfig {
    pub fn to_grid(&self) -> EBMResult<TimeGrid> {
        match self {
            TimeGridConfig::Explicit { times } => TimeGrid::from_values(times.clone()),
            TimeGridConfig::Evenly { start, end, points } => {
                TimeGrid::linspace(*start, *end, *points)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// unit: K
    pub initial_temperature: FloatValue,
    /// Temperature the parameters are expected to hold steady, checked before running
    /// unit: K
    pub expected_equilibrium: Option<FloatValue>,
    /// Largest acceptable heating rate at `expected_equilibrium`
    /// unit: K / yr
    pub equilibrium_tolerance: FloatValue,
    pub time_grid: TimeGridConfig,
    pub parameters: EnergyBalanceParameters,
    pub solver: SolverOptions,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_temperature: PRESENT_DAY_TEMPERATURE,
            expected_equilibrium: None,
            equilibrium_tolerance: 1e-3,
            time_grid: TimeGridConfig::default(),
            parameters: EnergyBalanceParameters::default(),
            solver: SolverOptions::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(contents: &str) -> EBMResult<Self> {
        toml::from_str(contents).map_err(|e| EBMError::InvalidConfiguration(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> EBMResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EBMError::InvalidConfiguration(format!("could not read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> EBMResult<String> {
        toml::to_string(self).map_err(|e| EBMError::InvalidConfiguration(e.to_string()))
    }

    /// Validate the configuration and integrate the model
    ///
    /// A failed equilibrium check is logged, not returned.
    pub fn run(&self) -> EBMResult<Trajectory> {
        let model = EnergyBalanceModel::from_parameters(self.parameters.clone())?;
        let grid = self.time_grid.to_grid()?;

        if let Some(expected) = self.expected_equilibrium {
            match model.check_equilibrium(expected, self.equilibrium_tolerance) {
                Ok(residual) => debug!("Equilibrium check at {expected} K passed: dT/dt = {residual}"),
                Err(e) => warn!("{e}"),
            }
        }

        info!(
            "Running energy-balance model from T0={} K over {} time points",
            self.initial_temperature,
            grid.len()
        );
        model.integrate(self.initial_temperature, &grid, &self.solver)
    }
}
