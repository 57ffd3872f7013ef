//! Energy-balance physics
//!
//! # Module Organisation
//!
//! - `albedo`: temperature-dependent albedo curves (ice-albedo feedback)
//! - `parameters`: physical parameters with present-day defaults
//! - `energy_balance`: the rate-of-change law and equilibrium analysis
//! - `constants`: physical constants and defaults

pub mod albedo;
pub mod constants;
pub mod energy_balance;
pub mod parameters;

pub use albedo::{AlbedoCurve, ConstantAlbedo, SigmoidAlbedo};
pub use energy_balance::{EnergyBalanceModel, Equilibrium, Stability};
pub use parameters::EnergyBalanceParameters;
