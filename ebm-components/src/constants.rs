//! Physical constants and model defaults

use ebm_core::timeseries::FloatValue;

/// Stefan-Boltzmann constant
/// unit: W / m^2 / K^4
pub const STEFAN_BOLTZMANN: FloatValue = 5.67e-8;

/// Average heat capacity of the Earth/atmosphere system
/// unit: W yr / m^2 / K
pub const DEFAULT_HEAT_CAPACITY: FloatValue = 2.912;

/// Annual global mean incoming solar radiation
/// unit: W / m^2
pub const DEFAULT_INSOLATION: FloatValue = 342.0;

/// Greenhouse coefficient giving zero net flux at 288 K with an albedo of 0.3
pub const DEFAULT_EMISSIVITY: FloatValue = 0.6137212149814136;

/// Present-day global mean surface temperature
/// unit: K
pub const PRESENT_DAY_TEMPERATURE: FloatValue = 288.0;
