//! Zero-dimensional energy-balance climate model
//!
//! Simulates global-mean surface temperature under an ice-albedo feedback.
//! The model has two stable equilibria (a snowball state near 233 K and the
//! present-day state near 288 K) separated by an unstable one near 265 K.
//!
//! ```no_run
//! use ebm::{integrate, EnergyBalanceParameters};
//!
//! let temperatures = integrate(287.0, &[0.0, 10.0, 50.0], &EnergyBalanceParameters::default())?;
//! # Ok::<(), ebm::EBMError>(())
//! ```

pub mod simulation;

#[cfg(feature = "python")]
pub mod python;

pub use ebm_components::{
    AlbedoCurve, ConstantAlbedo, EnergyBalanceModel, EnergyBalanceParameters, Equilibrium,
    SigmoidAlbedo, Stability,
};
pub use ebm_core::errors::{EBMError, EBMResult, StatePoint};
pub use ebm_core::ivp::{SolverMethod, SolverOptions};
pub use ebm_core::timeseries::{FloatValue, Time, TimeGrid, Trajectory};
pub use simulation::{SimulationConfig, TimeGridConfig};

/// Integrate the model from `initial_temperature` at `times[0]`
///
/// Returns one temperature per entry of `times` using the default solver options.
pub fn integrate(
    initial_temperature: FloatValue,
    times: &[Time],
    parameters: &EnergyBalanceParameters,
) -> EBMResult<Vec<FloatValue>> {
    let model = EnergyBalanceModel::from_parameters(parameters.clone())?;
    let grid = TimeGrid::from_values(times.to_vec())?;
    let trajectory = model.integrate(initial_temperature, &grid, &SolverOptions::default())?;
    Ok(trajectory.into_values().to_vec())
}
