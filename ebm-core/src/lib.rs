//! Core types for zero-dimensional energy-balance models
//!
//! Provides the time grid and trajectory types, the error taxonomy and the
//! driver that integrates an [`ivp::IVP`] with the `ode_solvers` methods.

pub mod errors;
pub mod ivp;
pub mod timeseries;
