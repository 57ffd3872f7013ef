//! Zero-dimensional energy-balance model
//!
//! Tracks global-mean surface temperature as the balance between absorbed
//! solar radiation and emitted longwave radiation:
//!
//! $$ r \frac{dT}{dt} = q (1 - \alpha(T)) - \sigma \epsilon T^4 $$
//!
//! Where:
//! - $r$ is the heat capacity of the Earth/atmosphere system (W yr / m^2 K)
//! - $q$ is the annual global mean incoming solar radiation (W / m^2)
//! - $\alpha(T)$ is the temperature-dependent albedo
//! - $\sigma$ is the Stefan-Boltzmann constant
//! - $\epsilon$ is the greenhouse coefficient
//!
//! With the default sigmoid albedo there are three equilibria: a cold stable
//! state near 233 K, an unstable state near 265 K and a warm stable state near 288 K.

use crate::parameters::EnergyBalanceParameters;
use ebm_core::errors::{EBMError, EBMResult};
use ebm_core::ivp::{integrate_trajectory, ModelState, SolverOptions, IVP};
use ebm_core::timeseries::{FloatValue, Time, TimeGrid, Trajectory};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    /// Small perturbations decay back to the equilibrium
    Stable,
    /// Small perturbations grow away from the equilibrium
    Unstable,
}

/// A temperature at which the net energy flux vanishes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equilibrium {
    /// unit: K
    pub temperature: FloatValue,
    pub stability: Stability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyBalanceModel {
    parameters: EnergyBalanceParameters,
}

impl EnergyBalanceModel {
    /// Create a new model, rejecting out-of-range parameters
    pub fn from_parameters(parameters: EnergyBalanceParameters) -> EBMResult<Self> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &EnergyBalanceParameters {
        &self.parameters
    }

    pub fn albedo(&self, temperature: FloatValue) -> FloatValue {
        self.parameters.albedo.albedo(temperature)
    }

    /// Solar radiation absorbed by the planet (W / m^2)
    pub fn absorbed_radiation(&self, temperature: FloatValue) -> FloatValue {
        self.parameters.insolation * (1.0 - self.albedo(temperature))
    }

    /// Longwave radiation leaving the top of the atmosphere (W / m^2)
    pub fn emitted_radiation(&self, temperature: FloatValue) -> FloatValue {
        self.parameters.stefan_boltzmann * self.parameters.emissivity * temperature.powi(4)
    }

    /// Rate of change of temperature (K / yr)
    ///
    /// This is the core physics calculation, extracted for testability.
    pub fn calculate_dtemperature_dt(&self, temperature: FloatValue) -> FloatValue {
        (self.absorbed_radiation(temperature) - self.emitted_radiation(temperature))
            / self.parameters.heat_capacity
    }

    /// Integrate from `initial_temperature` at `times[0]` and sample at every time
    pub fn integrate(
        &self,
        initial_temperature: FloatValue,
        times: &TimeGrid,
        options: &SolverOptions,
    ) -> EBMResult<Trajectory> {
        integrate_trajectory(self, initial_temperature, times, options)
    }

    /// Net heating rate at `temperature`, zero at an equilibrium
    pub fn equilibrium_residual(&self, temperature: FloatValue) -> FloatValue {
        self.calculate_dtemperature_dt(temperature)
    }

    /// Check that `temperature` is an equilibrium to within `tolerance` (K / yr)
    ///
    /// Returns the residual heating rate.
    pub fn check_equilibrium(
        &self,
        temperature: FloatValue,
        tolerance: FloatValue,
    ) -> EBMResult<FloatValue> {
        let residual = self.equilibrium_residual(temperature);
        if residual.abs() <= tolerance {
            Ok(residual)
        } else {
            Err(EBMError::invalid_input(format!(
                "{temperature} K is not an equilibrium: dT/dt = {residual} K/yr exceeds {tolerance} K/yr"
            )))
        }
    }

    /// Locate the equilibria in `[lower, upper]`
    ///
    /// The interval is split into `samples` sub-intervals and every sign change
    /// of dT/dt is refined by bisection. Equilibria are returned coldest first.
    pub fn equilibria(
        &self,
        lower: FloatValue,
        upper: FloatValue,
        samples: usize,
    ) -> EBMResult<Vec<Equilibrium>> {
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(EBMError::invalid_input(format!(
                "equilibrium search needs a finite interval, got [{lower}, {upper}]"
            )));
        }
        if samples == 0 {
            return Err(EBMError::invalid_input(
                "equilibrium search needs at least one sample interval",
            ));
        }

        let width = (upper - lower) / samples as FloatValue;
        let mut found = Vec::new();
        let mut a = lower;
        let mut f_a = self.calculate_dtemperature_dt(a);

        for i in 1..=samples {
            let b = if i == samples {
                upper
            } else {
                lower + width * i as FloatValue
            };
            let f_b = self.calculate_dtemperature_dt(b);

            if f_a == 0.0 {
                // Classify an exact root from its neighbouring samples
                if let Some(stability) = found_stability(found.last(), a, f_b) {
                    found.push(Equilibrium {
                        temperature: a,
                        stability,
                    });
                }
            } else if f_a.signum() != f_b.signum() && f_b != 0.0 {
                let stability = if f_a > 0.0 {
                    Stability::Stable
                } else {
                    Stability::Unstable
                };
                found.push(Equilibrium {
                    temperature: self.bisect(a, b),
                    stability,
                });
            }

            a = b;
            f_a = f_b;
        }

        debug!("Found {} equilibria in [{lower}, {upper}]", found.len());
        Ok(found)
    }

    fn bisect(&self, mut a: FloatValue, mut b: FloatValue) -> FloatValue {
        let mut f_a = self.calculate_dtemperature_dt(a);
        for _ in 0..200 {
            let mid = 0.5 * (a + b);
            if mid <= a || mid >= b {
                break;
            }
            let f_mid = self.calculate_dtemperature_dt(mid);
            if f_mid == 0.0 {
                return mid;
            }
            if f_mid.signum() == f_a.signum() {
                a = mid;
                f_a = f_mid;
            } else {
                b = mid;
            }
        }
        0.5 * (a + b)
    }
}

/// Stability of an exact root at `temperature` given the heating rate just above it
fn found_stability(
    previous: Option<&Equilibrium>,
    temperature: FloatValue,
    f_above: FloatValue,
) -> Option<Stability> {
    if previous.is_some_and(|e| e.temperature == temperature) {
        return None;
    }
    if f_above < 0.0 {
        Some(Stability::Stable)
    } else if f_above > 0.0 {
        Some(Stability::Unstable)
    } else {
        None
    }
}

impl IVP<Time, ModelState> for EnergyBalanceModel {
    fn calculate_dy_dt(&self, _t: Time, y: &ModelState, dy_dt: &mut ModelState) {
        dy_dt[0] = self.calculate_dtemperature_dt(y[0]);
    }
}
