use ebm_components::constants::{DEFAULT_EMISSIVITY, DEFAULT_HEAT_CAPACITY, DEFAULT_INSOLATION};
use ebm_components::{AlbedoCurve, EnergyBalanceModel, EnergyBalanceParameters, SigmoidAlbedo};
use ebm_core::errors::EBMError;
use ebm_core::ivp::{SolverMethod, SolverOptions};
use ebm_core::timeseries::{FloatValue, TimeGrid};
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: EBMError) -> PyErr {
    match err {
        EBMError::NumericalFailure { .. } => PyRuntimeError::new_err(err.to_string()),
        EBMError::InvalidInput(_) | EBMError::InvalidConfiguration(_) => {
            PyValueError::new_err(err.to_string())
        }
    }
}

fn parse_method(method: &str) -> PyResult<SolverMethod> {
    match method {
        "rk4" => Ok(SolverMethod::Rk4),
        "dopri5" => Ok(SolverMethod::Dopri5),
        "dop853" => Ok(SolverMethod::Dop853),
        other => Err(PyValueError::new_err(format!(
            "unknown solver method {other:?}, expected one of rk4, dopri5, dop853"
        ))),
    }
}

/// Integrate the energy-balance model and return the temperature at each time
#[pyfunction]
#[pyo3(signature = (
    initial_temperature,
    times,
    heat_capacity = DEFAULT_HEAT_CAPACITY,
    insolation = DEFAULT_INSOLATION,
    emissivity = DEFAULT_EMISSIVITY,
    method = "dopri5"
))]
fn integrate<'py>(
    py: Python<'py>,
    initial_temperature: FloatValue,
    times: PyReadonlyArray1<'py, FloatValue>,
    heat_capacity: FloatValue,
    insolation: FloatValue,
    emissivity: FloatValue,
    method: &str,
) -> PyResult<Bound<'py, PyArray1<FloatValue>>> {
    let options = SolverOptions::default().with_method(parse_method(method)?);
    let parameters = EnergyBalanceParameters {
        heat_capacity,
        insolation,
        emissivity,
        ..EnergyBalanceParameters::default()
    };
    let model = EnergyBalanceModel::from_parameters(parameters).map_err(to_py_err)?;
    let grid = TimeGrid::new(times.as_array().to_owned()).map_err(to_py_err)?;

    let trajectory = model
        .integrate(initial_temperature, &grid, &options)
        .map_err(to_py_err)?;
    Ok(trajectory.into_values().into_pyarray_bound(py))
}

/// Albedo of the default sigmoid curve at `temperature` (K)
#[pyfunction]
fn albedo(temperature: FloatValue) -> FloatValue {
    SigmoidAlbedo::default().albedo(temperature)
}

#[pymodule]
#[pyo3(name = "_lib")]
fn ebm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_function(wrap_pyfunction!(integrate, m)?)?;
    m.add_function(wrap_pyfunction!(albedo, m)?)?;
    Ok(())
}
