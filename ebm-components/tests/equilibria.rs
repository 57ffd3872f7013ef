//! Stability tests for the energy-balance model.
//!
//! These tests integrate the full model and check the long-term behaviour:
//! - Convergence to the two stable equilibria
//! - Divergence away from the unstable equilibrium
//! - Steady trajectories when started on an equilibrium

use approx::assert_relative_eq;
use ebm_components::{EnergyBalanceModel, EnergyBalanceParameters, Equilibrium, Stability};
use ebm_core::errors::EBMError;
use ebm_core::ivp::{SolverMethod, SolverOptions};
use ebm_core::timeseries::{FloatValue, TimeGrid};

fn default_model() -> EnergyBalanceModel {
    EnergyBalanceModel::from_parameters(EnergyBalanceParameters::default()).unwrap()
}

fn equilibria(model: &EnergyBalanceModel) -> [Equilibrium; 3] {
    let found = model.equilibria(150.0, 350.0, 400).unwrap();
    [found[0], found[1], found[2]]
}

fn final_temperature(model: &EnergyBalanceModel, initial: FloatValue, years: FloatValue) -> FloatValue {
    let grid = TimeGrid::linspace(0.0, years, 11).unwrap();
    let trajectory = model
        .integrate(initial, &grid, &SolverOptions::default())
        .unwrap();
    trajectory.last().1
}

mod convergence {
    use super::*;

    #[test]
    fn test_warm_start_converges_near_288() {
        let model = default_model();
        let grid = TimeGrid::from_values(vec![0.0, 50.0]).unwrap();
        let trajectory = model
            .integrate(287.0, &grid, &SolverOptions::default())
            .unwrap();

        let values = trajectory.values();
        assert_eq!(values[0], 287.0);
        assert!((values[1] - 288.0).abs() < 0.5, "final {}", values[1]);

        let [_, _, warm] = equilibria(&model);
        assert_relative_eq!(values[1], warm.temperature, epsilon = 1e-6);
    }

    #[test]
    fn test_stable_states_attract_from_both_sides() {
        let model = default_model();
        let [cold, _, warm] = equilibria(&model);

        for initial in [150.0, 200.0, 250.0, 264.0] {
            let temperature = final_temperature(&model, initial, 100.0);
            assert_relative_eq!(temperature, cold.temperature, epsilon = 1e-4);
        }
        for initial in [266.0, 280.0, 300.0, 400.0] {
            let temperature = final_temperature(&model, initial, 100.0);
            assert_relative_eq!(temperature, warm.temperature, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_cooling_is_monotonic() {
        let model = default_model();
        let grid = TimeGrid::linspace(0.0, 5.0, 51).unwrap();
        let trajectory = model
            .integrate(300.0, &grid, &SolverOptions::default())
            .unwrap();

        let values = trajectory.values();
        for pair in values.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_methods_agree() {
        let model = default_model();
        let grid = TimeGrid::linspace(0.0, 10.0, 50).unwrap();

        let reference = model
            .integrate(288.0, &grid, &SolverOptions::default())
            .unwrap();
        for method in [SolverMethod::Rk4, SolverMethod::Dop853] {
            let options = SolverOptions::default().with_method(method);
            let trajectory = model.integrate(288.0, &grid, &options).unwrap();
            for (a, b) in reference.values().iter().zip(trajectory.values().iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-6);
            }
        }
    }
}

mod instability {
    use super::*;

    #[test]
    fn test_perturbations_of_unstable_state_diverge() {
        let model = default_model();
        let [cold, unstable, warm] = equilibria(&model);
        assert_eq!(unstable.stability, Stability::Unstable);

        let above = final_temperature(&model, unstable.temperature + 0.01, 200.0);
        let below = final_temperature(&model, unstable.temperature - 0.01, 200.0);

        assert!((above - 288.0).abs() < 1.0, "above {above}");
        assert!((below - 233.0).abs() < 1.0, "below {below}");
        assert_relative_eq!(above, warm.temperature, epsilon = 1e-4);
        assert_relative_eq!(below, cold.temperature, epsilon = 1e-4);
    }

    #[test]
    fn test_nominal_265_splits_the_basins() {
        let model = default_model();

        // The unstable root sits just above 265 K with the default constants
        assert!(final_temperature(&model, 265.2, 200.0) > 285.0);
        assert!(final_temperature(&model, 265.01, 200.0) < 235.0);
        assert!(final_temperature(&model, 264.99, 200.0) < 235.0);
    }
}

mod steady_state {
    use super::*;

    #[test]
    fn test_stable_equilibria_stay_flat() {
        let model = default_model();
        let [cold, _, warm] = equilibria(&model);
        let grid = TimeGrid::linspace(0.0, 200.0, 101).unwrap();

        for equilibrium in [cold, warm] {
            let trajectory = model
                .integrate(equilibrium.temperature, &grid, &SolverOptions::default())
                .unwrap();
            for (t, temperature) in trajectory.iter() {
                assert!(
                    (temperature - equilibrium.temperature).abs() < 0.01,
                    "drifted to {temperature} at t={t}"
                );
            }
        }
    }

    #[test]
    fn test_unstable_equilibrium_stays_flat_over_short_horizon() {
        let model = default_model();
        let [_, unstable, _] = equilibria(&model);
        let grid = TimeGrid::linspace(0.0, 5.0, 21).unwrap();

        let trajectory = model
            .integrate(unstable.temperature, &grid, &SolverOptions::default())
            .unwrap();
        for (_, temperature) in trajectory.iter() {
            assert!((temperature - unstable.temperature).abs() < 0.01);
        }
    }

    #[test]
    fn test_nominal_equilibria_stay_close() {
        let model = default_model();
        let grid = TimeGrid::linspace(0.0, 50.0, 51).unwrap();

        // Nominal values are within half a kelvin of the exact roots
        for nominal in [233.0, 288.0] {
            let trajectory = model
                .integrate(nominal, &grid, &SolverOptions::default())
                .unwrap();
            for (_, temperature) in trajectory.iter() {
                assert!((temperature - nominal).abs() < 0.5);
            }
        }
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_decreasing_grid_is_invalid_input() {
        let err = TimeGrid::from_values(vec![0.0, 5.0, 3.0]).unwrap_err();
        assert!(matches!(err, EBMError::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_initial_temperature() {
        let model = default_model();
        let grid = TimeGrid::from_values(vec![0.0, 1.0]).unwrap();
        let err = model
            .integrate(FloatValue::NAN, &grid, &SolverOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_overflowing_emission_is_numerical_failure() {
        let model = default_model();
        let grid = TimeGrid::from_values(vec![0.0, 1.0]).unwrap();

        for initial in [1e100, -1e100] {
            let err = model
                .integrate(initial, &grid, &SolverOptions::default())
                .unwrap_err();
            match err {
                EBMError::NumericalFailure { last_valid, .. } => {
                    let last_valid = last_valid.unwrap();
                    assert_eq!(last_valid.time, 0.0);
                    assert_eq!(last_valid.value, initial);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }
}

#[test]
fn test_determinism() {
    let model = default_model();
    let grid = TimeGrid::linspace(0.0, 30.0, 31).unwrap();

    let first = model
        .integrate(270.0, &grid, &SolverOptions::default())
        .unwrap();
    let second = model
        .integrate(270.0, &grid, &SolverOptions::default())
        .unwrap();
    assert_eq!(first, second);
}
