//! End-to-end tests of the public entry points.

use approx::assert_relative_eq;
use ebm::{integrate, EBMError, EnergyBalanceParameters, SimulationConfig, SolverMethod};

#[test]
fn test_integrate_returns_one_value_per_time() {
    let times: Vec<f64> = (0..=50).map(f64::from).collect();
    let temperatures = integrate(287.0, &times, &EnergyBalanceParameters::default()).unwrap();

    assert_eq!(temperatures.len(), times.len());
    assert_eq!(temperatures[0], 287.0);
    assert!((temperatures[50] - 288.0).abs() < 0.5);
}

#[test]
fn test_integrate_rejects_bad_inputs() {
    let params = EnergyBalanceParameters::default();

    let err = integrate(288.0, &[0.0, 5.0, 3.0], &params).unwrap_err();
    assert!(matches!(err, EBMError::InvalidInput(_)));

    let err = integrate(288.0, &[], &params).unwrap_err();
    assert!(matches!(err, EBMError::InvalidInput(_)));

    let err = integrate(f64::INFINITY, &[0.0, 1.0], &params).unwrap_err();
    assert!(matches!(err, EBMError::InvalidInput(_)));

    let err = integrate(288.0, &[0.0, 1.0], &params.clone().with_emissivity(1.2)).unwrap_err();
    assert!(matches!(err, EBMError::InvalidInput(_)));
}

#[test]
fn test_stronger_greenhouse_effect_warms() {
    let times = [0.0, 100.0];
    let reference = integrate(288.0, &times, &EnergyBalanceParameters::default()).unwrap();
    let enhanced = integrate(
        288.0,
        &times,
        &EnergyBalanceParameters::default().with_emissivity(0.6),
    )
    .unwrap();

    assert!(enhanced[1] > reference[1]);
}

#[test]
fn test_config_file_run() {
    let path = std::env::temp_dir().join(format!("ebm-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        initial_temperature = 240.0

        [time_grid]
        start = 0.0
        end = 100.0
        points = 101

        [solver]
        method = "dop853"
        "#,
    )
    .unwrap();

    let config = SimulationConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.solver.method, SolverMethod::Dop853);

    let trajectory = config.run().unwrap();
    assert_eq!(trajectory.len(), 101);
    assert_relative_eq!(trajectory.last().1, 233.1555, epsilon = 1e-3);
}

#[test]
fn test_missing_config_file() {
    let err = SimulationConfig::from_file("/nonexistent/ebm.toml").unwrap_err();
    assert!(matches!(err, EBMError::InvalidConfiguration(_)));
}
