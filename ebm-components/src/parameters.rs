//! Energy-balance model parameters

use crate::albedo::{AlbedoCurve, SigmoidAlbedo};
use crate::constants::{
    DEFAULT_EMISSIVITY, DEFAULT_HEAT_CAPACITY, DEFAULT_INSOLATION, STEFAN_BOLTZMANN,
};
use ebm_core::errors::{EBMError, EBMResult};
use ebm_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters for the zero-dimensional energy-balance model.
///
/// Parameters are read-only once a model is built and can be shared between
/// independent simulations.
///
/// # Default Values
///
/// Defaults describe the present-day climate, with a warm equilibrium close to 288 K.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyBalanceParameters {
    /// Average heat capacity of the Earth/atmosphere system ($\text{W yr / m}^2\text{ K}$).
    /// Default: 2.912
    pub heat_capacity: FloatValue,

    /// Annual global mean incoming solar radiation ($\text{W/m}^2$).
    /// Default: 342.0
    pub insolation: FloatValue,

    /// Greenhouse coefficient (dimensionless, $0 < \epsilon < 1$).
    /// Lower values mean a stronger greenhouse effect.
    /// Default: 0.6137212149814136
    pub emissivity: FloatValue,

    /// Stefan-Boltzmann constant ($\text{W/m}^2\text{/K}^4$).
    /// Fixed by physics, only overridden in tests.
    /// Default: 5.67e-8
    pub stefan_boltzmann: FloatValue,

    /// Albedo as a function of temperature.
    /// Default: [`SigmoidAlbedo::default`]
    pub albedo: Arc<dyn AlbedoCurve>,
}

impl Default for EnergyBalanceParameters {
    fn default() -> Self {
        Self {
            heat_capacity: DEFAULT_HEAT_CAPACITY,
            insolation: DEFAULT_INSOLATION,
            emissivity: DEFAULT_EMISSIVITY,
            stefan_boltzmann: STEFAN_BOLTZMANN,
            albedo: Arc::new(SigmoidAlbedo::default()),
        }
    }
}

impl EnergyBalanceParameters {
    pub fn with_emissivity(self, emissivity: FloatValue) -> Self {
        Self { emissivity, ..self }
    }

    pub fn with_albedo(self, albedo: impl AlbedoCurve + 'static) -> Self {
        Self {
            albedo: Arc::new(albedo),
            ..self
        }
    }

    pub fn validate(&self) -> EBMResult<()> {
        for (name, value) in [
            ("heat_capacity", self.heat_capacity),
            ("insolation", self.insolation),
            ("stefan_boltzmann", self.stefan_boltzmann),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(EBMError::invalid_input(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(self.emissivity > 0.0 && self.emissivity < 1.0) {
            return Err(EBMError::invalid_input(format!(
                "emissivity must be within (0, 1), got {}",
                self.emissivity
            )));
        }
        self.albedo.validate()
    }
}
