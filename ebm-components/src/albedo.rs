//! Ice-albedo feedback
//!
//! Albedo is the fraction of incoming solar radiation reflected back to space.
//! A colder planet has more ice and snow cover and reflects more, which is the
//! positive feedback responsible for the multiple equilibria of the model.

use ebm_core::errors::{EBMError, EBMResult};
use ebm_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Planetary albedo as a function of global-mean temperature
#[typetag::serde(tag = "type")]
pub trait AlbedoCurve: Debug + Send + Sync {
    /// Albedo (dimensionless) at `temperature` (K)
    fn albedo(&self, temperature: FloatValue) -> FloatValue;

    fn validate(&self) -> EBMResult<()> {
        Ok(())
    }
}

/// Logistic function evaluated without overflow for large `|x|`
pub fn sigmoid(x: FloatValue) -> FloatValue {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Smooth transition between an ice-covered and an ice-free planet
///
/// $$ \alpha(T) = \alpha_0 - \Delta\alpha \cdot \sigma\left(\frac{T - T_c}{w}\right) $$
///
/// Where:
/// - $\alpha_0$ is the albedo of a fully frozen planet
/// - $\Delta\alpha$ is the drop in albedo once the ice has gone
/// - $T_c$ is the temperature at the midpoint of the transition
/// - $w$ sets the width of the transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigmoidAlbedo {
    /// Albedo in the cold limit
    pub base_albedo: FloatValue,
    /// Difference between the cold and warm limits
    pub albedo_swing: FloatValue,
    /// unit: K
    pub transition_temperature: FloatValue,
    /// unit: K
    pub transition_width: FloatValue,
}

impl Default for SigmoidAlbedo {
    fn default() -> Self {
        Self {
            base_albedo: 0.7,
            albedo_swing: 0.4,
            transition_temperature: 265.0,
            transition_width: 5.0,
        }
    }
}

impl SigmoidAlbedo {
    /// Albedo in the warm limit
    pub fn minimum_albedo(&self) -> FloatValue {
        self.base_albedo - self.albedo_swing
    }
}

#[typetag::serde(name = "sigmoid")]
impl AlbedoCurve for SigmoidAlbedo {
    fn albedo(&self, temperature: FloatValue) -> FloatValue {
        let x = (temperature - self.transition_temperature) / self.transition_width;
        // Offset from the nearer limit so saturation lands exactly on it
        if x >= 0.0 {
            self.minimum_albedo() + self.albedo_swing * sigmoid(-x)
        } else {
            self.base_albedo - self.albedo_swing * sigmoid(x)
        }
    }

    fn validate(&self) -> EBMResult<()> {
        let values = [
            self.base_albedo,
            self.albedo_swing,
            self.transition_temperature,
            self.transition_width,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EBMError::invalid_input(format!(
                "sigmoid albedo parameters must be finite, got {self:?}"
            )));
        }
        if self.albedo_swing < 0.0 {
            return Err(EBMError::invalid_input(format!(
                "albedo_swing must be non-negative, got {}",
                self.albedo_swing
            )));
        }
        if self.minimum_albedo() < 0.0 || self.base_albedo > 1.0 {
            return Err(EBMError::invalid_input(format!(
                "albedo must stay within [0, 1], got [{}, {}]",
                self.minimum_albedo(),
                self.base_albedo
            )));
        }
        if self.transition_width <= 0.0 {
            return Err(EBMError::invalid_input(format!(
                "transition_width must be positive, got {}",
                self.transition_width
            )));
        }
        Ok(())
    }
}

/// Temperature-independent albedo, i.e. no ice-albedo feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantAlbedo {
    pub albedo: FloatValue,
}

impl Default for ConstantAlbedo {
    fn default() -> Self {
        Self { albedo: 0.3 }
    }
}

#[typetag::serde(name = "constant")]
impl AlbedoCurve for ConstantAlbedo {
    fn albedo(&self, _temperature: FloatValue) -> FloatValue {
        self.albedo
    }

    fn validate(&self) -> EBMResult<()> {
        if !(0.0..=1.0).contains(&self.albedo) {
            return Err(EBMError::invalid_input(format!(
                "albedo must be within [0, 1], got {}",
                self.albedo
            )));
        }
        Ok(())
    }
}
