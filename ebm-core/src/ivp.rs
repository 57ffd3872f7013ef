//! Initial value problems and the solver driver used to integrate them
//!
//! Components describe their right-hand side through the [`IVP`] trait.
//! [`integrate_trajectory`] then drives one of the `ode_solvers` methods across a
//! [`TimeGrid`], one segment at a time, and samples the state at each grid time.
//! The solver may take many more internal steps than there are grid points.

use crate::errors::{EBMError, EBMResult, StatePoint};
use crate::timeseries::{FloatValue, Time, TimeGrid, Trajectory};
use log::{debug, trace};
use ndarray::Array1;
use ode_solvers::dop_shared::OutputType;
use ode_solvers::{Dop853, Dopri5, Rk4, System, Vector1};
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// State vector of a scalar model
pub type ModelState = Vector1<FloatValue>;

/// Accepted step limit of the adaptive solvers per segment
const MAX_SOLVER_STEPS: u32 = 100_000;

/// Right-hand side of an ordinary differential equation `dy/dt = f(t, y)`
///
/// Implementations must be pure: the solver evaluates them at intermediate,
/// repeated and rejected points.
pub trait IVP<T, S> {
    fn calculate_dy_dt(&self, t: T, y: &S, dy_dt: &mut S);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Classic fixed-step Runge-Kutta
    Rk4,
    /// Adaptive Dormand-Prince 5(4)
    #[default]
    Dopri5,
    /// Adaptive Dormand-Prince 8(5,3)
    Dop853,
}

/// Solver options for the ODE integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub method: SolverMethod,
    /// Step size used by [`SolverMethod::Rk4`]
    /// unit: yr
    pub step_size: FloatValue,
    /// Relative tolerance of the adaptive methods
    pub rtol: FloatValue,
    /// Absolute tolerance of the adaptive methods
    pub atol: FloatValue,
    /// Upper bound on right-hand side evaluations for a whole trajectory
    pub max_evaluations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: SolverMethod::Dopri5,
            step_size: 0.01,
            rtol: 1e-10,
            atol: 1e-10,
            max_evaluations: 1_000_000,
        }
    }
}

impl SolverOptions {
    pub fn with_method(self, method: SolverMethod) -> Self {
        Self { method, ..self }
    }

    pub fn validate(&self) -> EBMResult<()> {
        for (name, value) in [
            ("step_size", self.step_size),
            ("rtol", self.rtol),
            ("atol", self.atol),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(EBMError::invalid_input(format!(
                    "solver option {name} must be positive and finite, got {value}"
                )));
            }
        }
        if self.max_evaluations == 0 {
            return Err(EBMError::invalid_input(
                "solver option max_evaluations must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EvaluationFailure {
    NonFinite {
        time: Time,
        state: FloatValue,
        derivative: FloatValue,
    },
    BudgetExhausted {
        limit: usize,
    },
}

impl EvaluationFailure {
    fn describe(&self) -> String {
        match self {
            EvaluationFailure::NonFinite {
                time,
                state,
                derivative,
            } => format!("derivative is not finite at t={time}, y={state} (dy/dt={derivative})"),
            EvaluationFailure::BudgetExhausted { limit } => {
                format!("solver exceeded the budget of {limit} derivative evaluations")
            }
        }
    }
}

/// Watches every right-hand side evaluation made by the solver
///
/// Solvers cannot report errors from inside the system function, so the first
/// failure is recorded here and checked once the solver returns.
#[derive(Debug)]
struct EvaluationGuard {
    evaluations: Cell<usize>,
    limit: usize,
    failure: Cell<Option<EvaluationFailure>>,
}

impl EvaluationGuard {
    fn new(limit: usize) -> Self {
        Self {
            evaluations: Cell::new(0),
            limit,
            failure: Cell::new(None),
        }
    }

    fn record(&self, time: Time, y: &ModelState, dy_dt: &ModelState) {
        let evaluations = self.evaluations.get() + 1;
        self.evaluations.set(evaluations);
        if self.failure.get().is_some() {
            return;
        }

        if !(y[0].is_finite() && dy_dt[0].is_finite()) {
            self.failure.set(Some(EvaluationFailure::NonFinite {
                time,
                state: y[0],
                derivative: dy_dt[0],
            }));
        } else if evaluations > self.limit {
            self.failure
                .set(Some(EvaluationFailure::BudgetExhausted { limit: self.limit }));
        }
    }

    fn failure(&self) -> Option<EvaluationFailure> {
        self.failure.get()
    }

    /// Claim `evaluations` up front, failing if they would exceed the budget
    fn reserve(&self, evaluations: FloatValue) -> bool {
        let remaining = self.limit.saturating_sub(self.evaluations.get());
        if evaluations > remaining as FloatValue {
            if self.failure.get().is_none() {
                self.failure
                    .set(Some(EvaluationFailure::BudgetExhausted { limit: self.limit }));
            }
            return false;
        }
        true
    }
}

/// Adapts an [`IVP`] to the `ode_solvers` system interface
struct IVPBuilder<'a, C> {
    component: &'a C,
    guard: &'a EvaluationGuard,
}

impl<'a, C> IVPBuilder<'a, C>
where
    C: IVP<Time, ModelState>,
{
    fn new(component: &'a C, guard: &'a EvaluationGuard) -> Self {
        Self { component, guard }
    }

    /// Integrate from `t_current` to `t_next` and return the state at `t_next`
    fn solve(
        self,
        options: &SolverOptions,
        t_current: Time,
        t_next: Time,
        y0: ModelState,
    ) -> Result<ModelState, SegmentFailure> {
        let span = t_next - t_current;
        match options.method {
            SolverMethod::Rk4 => {
                // Use a whole number of equal steps so one of them lands on t_next
                let n_steps = (span / options.step_size).ceil().max(1.0);
                // The solver allocates its output for every step before running
                if !self.guard.reserve(4.0 * n_steps) {
                    return Err(SegmentFailure {
                        reason: format!("{n_steps} RK4 steps exceed the evaluation budget"),
                        last_valid: None,
                    });
                }
                let mut solver = Rk4::new(self, t_current, y0, t_next, span / n_steps);
                let outcome = solver.integrate().map(|_| ());
                let (times, states) = solver.results().get();
                finish_segment(outcome, times, states, t_next)
            }
            SolverMethod::Dopri5 => {
                // Sparse output records every accepted step, the last one on t_next
                let mut solver = Dopri5::from_param(
                    self,
                    t_current,
                    t_next,
                    0.0,
                    y0,
                    options.rtol,
                    options.atol,
                    0.9,
                    0.04,
                    0.2,
                    10.0,
                    span,
                    0.0,
                    MAX_SOLVER_STEPS,
                    1000,
                    OutputType::Sparse,
                );
                let outcome = solver.integrate().map(|_| ());
                let (times, states) = solver.results().get();
                finish_segment(outcome, times, states, t_next)
            }
            SolverMethod::Dop853 => {
                let mut solver = Dop853::from_param(
                    self,
                    t_current,
                    t_next,
                    0.0,
                    y0,
                    options.rtol,
                    options.atol,
                    0.9,
                    0.0,
                    0.333,
                    6.0,
                    span,
                    0.0,
                    MAX_SOLVER_STEPS,
                    1000,
                    OutputType::Sparse,
                );
                let outcome = solver.integrate().map(|_| ());
                // Sparse Dop853 output is stamped with the start time, only the states are usable
                let (_, states) = solver.results().get();
                finish_untimed_segment(outcome, states, t_next)
            }
        }
    }
}

impl<C> System<Time, ModelState> for IVPBuilder<'_, C>
where
    C: IVP<Time, ModelState>,
{
    fn system(&self, t: Time, y: &ModelState, dy: &mut ModelState) {
        self.component.calculate_dy_dt(t, y, dy);
        self.guard.record(t, y, dy);
    }

    fn solout(&mut self, _t: Time, _y: &ModelState, _dy: &ModelState) -> bool {
        // Stop stepping as soon as an evaluation has gone bad
        self.guard.failure().is_some()
    }
}

#[derive(Debug)]
struct SegmentFailure {
    reason: String,
    last_valid: Option<StatePoint>,
}

fn last_finite_point(times: &[Time], states: &[ModelState]) -> Option<StatePoint> {
    times
        .iter()
        .zip(states.iter())
        .rev()
        .find(|(t, y)| t.is_finite() && y[0].is_finite())
        .map(|(t, y)| StatePoint {
            time: *t,
            value: y[0],
        })
}

fn finish_segment<E: std::fmt::Debug>(
    outcome: Result<(), E>,
    times: &[Time],
    states: &[ModelState],
    t_next: Time,
) -> Result<ModelState, SegmentFailure> {
    if let Err(e) = outcome {
        return Err(SegmentFailure {
            reason: format!("solver stopped: {e:?}"),
            last_valid: last_finite_point(times, states),
        });
    }
    get_last_step(times, states, t_next).ok_or_else(|| SegmentFailure {
        reason: format!("solver did not reach t={t_next}"),
        last_valid: last_finite_point(times, states),
    })
}

fn finish_untimed_segment<E: std::fmt::Debug>(
    outcome: Result<(), E>,
    states: &[ModelState],
    t_next: Time,
) -> Result<ModelState, SegmentFailure> {
    match outcome {
        Ok(()) => states.last().copied().ok_or_else(|| SegmentFailure {
            reason: format!("solver did not reach t={t_next}"),
            last_valid: None,
        }),
        Err(e) => Err(SegmentFailure {
            reason: format!("solver stopped: {e:?}"),
            last_valid: None,
        }),
    }
}

/// Find the solver output at `t_expected`
///
/// Solvers finish on the end time up to rounding, and a fixed-step method may
/// emit one extra step, so the closest output time is used.
pub fn get_last_step(times: &[Time], states: &[ModelState], t_expected: Time) -> Option<ModelState> {
    let (index, t) = times
        .iter()
        .enumerate()
        .rev()
        .min_by(|(_, a), (_, b)| {
            (*a - t_expected)
                .abs()
                .total_cmp(&(*b - t_expected).abs())
        })?;

    let tolerance = 1e-9 * t_expected.abs().max(1.0);
    if approx::abs_diff_eq!(*t, t_expected, epsilon = tolerance) {
        states.get(index).copied()
    } else {
        None
    }
}

/// Integrate `component` from `initial` at `grid[0]` and sample it at every grid time
///
/// Returns a trajectory with `values[0] == initial`. Fails with
/// [`EBMError::InvalidInput`] before integrating if `initial` is not finite or
/// the options are invalid, and with [`EBMError::NumericalFailure`] if any
/// derivative evaluation is not finite, the solver gives up, or the evaluation
/// budget is exhausted.
pub fn integrate_trajectory<C>(
    component: &C,
    initial: FloatValue,
    grid: &TimeGrid,
    options: &SolverOptions,
) -> EBMResult<Trajectory>
where
    C: IVP<Time, ModelState>,
{
    if !initial.is_finite() {
        return Err(EBMError::invalid_input(format!(
            "initial value must be finite, got {initial}"
        )));
    }
    options.validate()?;

    debug!(
        "Integrating {} grid points from t={} to t={} using {:?}",
        grid.len(),
        grid.initial_time(),
        grid.final_time(),
        options.method
    );

    let guard = EvaluationGuard::new(options.max_evaluations);
    let mut values = Vec::with_capacity(grid.len());
    let mut state = ModelState::new(initial);
    values.push(initial);

    if grid.len() > 1 {
        // Fail fast rather than let the solver search for a step size
        let mut dy_dt = ModelState::zeros();
        component.calculate_dy_dt(grid.initial_time(), &state, &mut dy_dt);
        if !dy_dt[0].is_finite() {
            return Err(EBMError::NumericalFailure {
                reason: EvaluationFailure::NonFinite {
                    time: grid.initial_time(),
                    state: initial,
                    derivative: dy_dt[0],
                }
                .describe(),
                last_valid: Some(StatePoint {
                    time: grid.initial_time(),
                    value: initial,
                }),
            });
        }
    }

    for (t_current, t_next) in grid.segments() {
        if t_next == t_current {
            values.push(state[0]);
            continue;
        }

        trace!("Solving segment {t_current} -> {t_next} from y={}", state[0]);
        let result = IVPBuilder::new(component, &guard).solve(options, t_current, t_next, state);

        // An evaluation failure takes precedence over whatever the solver made of it
        let failure = match (guard.failure(), result) {
            (Some(failure), result) => Some(SegmentFailure {
                reason: failure.describe(),
                last_valid: result.err().and_then(|f| f.last_valid),
            }),
            (None, Err(failure)) => Some(failure),
            (None, Ok(next)) => {
                state = next;
                None
            }
        };

        if let Some(failure) = failure {
            let last_valid = failure.last_valid.or(Some(StatePoint {
                time: t_current,
                value: state[0],
            }));
            debug!(
                "Integration failed after {} evaluations: {}",
                guard.evaluations.get(),
                failure.reason
            );
            return Err(EBMError::NumericalFailure {
                reason: failure.reason,
                last_valid,
            });
        }
        values.push(state[0]);
    }

    debug!(
        "Integration finished after {} derivative evaluations",
        guard.evaluations.get()
    );

    Trajectory::new(grid.clone(), Array1::from(values))
}
