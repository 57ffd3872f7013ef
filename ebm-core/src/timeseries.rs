use crate::errors::{EBMError, EBMResult};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
/// Time in years
pub type Time = f64;

/// An ordered set of sample times
///
/// The first entry is the initial time of the integration.
/// Entries must be finite and non-decreasing; repeated times are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Time>", into = "Vec<Time>")]
pub struct TimeGrid {
    values: Array1<Time>,
}

impl TimeGrid {
    pub fn new(values: Array1<Time>) -> EBMResult<Self> {
        if values.is_empty() {
            return Err(EBMError::invalid_input("time grid must not be empty"));
        }
        if let Some((index, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(EBMError::invalid_input(format!(
                "time grid value at index {index} is not finite ({value})"
            )));
        }
        if let Some(index) = values
            .windows(2)
            .into_iter()
            .position(|pair| pair[1] < pair[0])
        {
            return Err(EBMError::invalid_input(format!(
                "time grid must be non-decreasing, but t[{}]={} < t[{}]={}",
                index + 1,
                values[index + 1],
                index,
                values[index]
            )));
        }

        Ok(Self { values })
    }

    pub fn from_values(values: Vec<Time>) -> EBMResult<Self> {
        Self::new(Array1::from(values))
    }

    /// `points` evenly spaced times from `start` to `end` inclusive
    pub fn linspace(start: Time, end: Time, points: usize) -> EBMResult<Self> {
        if points == 0 {
            return Err(EBMError::invalid_input(
                "linspace requires at least one point",
            ));
        }
        if !(start.is_finite() && end.is_finite()) {
            return Err(EBMError::invalid_input(format!(
                "linspace bounds must be finite, got [{start}, {end}]"
            )));
        }
        if end < start {
            return Err(EBMError::invalid_input(format!(
                "linspace end ({end}) is before start ({start})"
            )));
        }
        Self::new(Array1::linspace(start, end, points))
    }

    pub fn initial_time(&self) -> Time {
        self.values[0]
    }

    pub fn final_time(&self) -> Time {
        self.values[self.values.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false, a grid holds at least one time
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> ArrayView1<'_, Time> {
        self.values.view()
    }

    /// Consecutive `(t_current, t_next)` pairs
    pub fn segments(&self) -> impl Iterator<Item = (Time, Time)> + '_ {
        self.values
            .iter()
            .zip(self.values.iter().skip(1))
            .map(|(a, b)| (*a, *b))
    }
}

impl TryFrom<Vec<Time>> for TimeGrid {
    type Error = EBMError;

    fn try_from(values: Vec<Time>) -> EBMResult<Self> {
        Self::from_values(values)
    }
}

impl From<TimeGrid> for Vec<Time> {
    fn from(grid: TimeGrid) -> Self {
        grid.values.to_vec()
    }
}

/// Temperatures sampled on a [`TimeGrid`]
///
/// `values[i]` is the state at `times[i]`; `values[0]` is the initial condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    times: TimeGrid,
    values: Array1<FloatValue>,
}

impl Trajectory {
    pub fn new(times: TimeGrid, values: Array1<FloatValue>) -> EBMResult<Self> {
        if times.len() != values.len() {
            return Err(EBMError::invalid_input(format!(
                "trajectory has {} values for {} times",
                values.len(),
                times.len()
            )));
        }
        Ok(Self { times, values })
    }

    pub fn times(&self) -> &TimeGrid {
        &self.times
    }

    pub fn values(&self) -> ArrayView1<'_, FloatValue> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<(Time, FloatValue)> {
        Some((*self.times.values.get(index)?, *self.values.get(index)?))
    }

    pub fn last(&self) -> (Time, FloatValue) {
        let index = self.len() - 1;
        (self.times.values[index], self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, FloatValue)> + '_ {
        self.times
            .values
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn into_values(self) -> Array1<FloatValue> {
        self.values
    }
}
