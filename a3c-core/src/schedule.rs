//! Learning rate schedules.
//!
//! A schedule maps a global timestep to a value. The A3C core only reads the
//! current value; how it changes over time is described here.
use crate::error::A3cError;
use serde::{Deserialize, Serialize};

/// Piecewise linear schedule.
///
/// Between two consecutive endpoints `(t_i, v_i)` and `(t_j, v_j)` the value
/// is linearly interpolated for `t_i <= t < t_j`. Any timestep outside of
/// those intervals takes the value of the last endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseSchedule {
    endpoints: Vec<(usize, f64)>,
    outside_value: f64,
}

impl PiecewiseSchedule {
    /// Creates a schedule from endpoints sorted by timestep.
    pub fn new(endpoints: Vec<(usize, f64)>) -> Result<Self, A3cError> {
        let outside_value = endpoints.last().ok_or(A3cError::EmptySchedule)?.1;
        debug_assert!(endpoints.windows(2).all(|w| w[0].0 <= w[1].0));

        Ok(Self {
            endpoints,
            outside_value,
        })
    }

    /// Returns the value at timestep `t`.
    pub fn value(&self, t: usize) -> f64 {
        for w in self.endpoints.windows(2) {
            let ((l_t, l), (r_t, r)) = (w[0], w[1]);
            if l_t <= t && t < r_t {
                let alpha = (t - l_t) as f64 / (r_t - l_t) as f64;
                return l + alpha * (r - l);
            }
        }
        self.outside_value
    }
}

/// Learning rate schedule built from `lr` and an optional `lr_schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Schedule {
    /// The same value at every timestep.
    Constant(f64),

    /// Piecewise linear interpolation between endpoints.
    Piecewise(PiecewiseSchedule),
}

impl Schedule {
    /// Constant `lr` if `lr_schedule` is `None`, otherwise the piecewise
    /// schedule through its endpoints.
    pub fn new(lr: f64, lr_schedule: Option<&[(usize, f64)]>) -> Result<Self, A3cError> {
        match lr_schedule {
            None => Ok(Self::Constant(lr)),
            Some(endpoints) => Ok(Self::Piecewise(PiecewiseSchedule::new(
                endpoints.to_vec(),
            )?)),
        }
    }

    /// Returns the value at timestep `t`.
    pub fn value(&self, t: usize) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Piecewise(s) => s.value(t),
        }
    }
}
