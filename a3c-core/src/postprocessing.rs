//! Advantage and value-target computation.
//!
//! A raw trajectory collected by a worker is augmented with advantage
//! estimates and value-function targets before the loss sees it. The loss
//! core treats both fields as given; this module provides the interface of
//! the step that fills them and a generalized advantage estimation (GAE)
//! implementation of it.
use crate::{error::A3cError, SampleBatch};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Fills `advantages` and `value_targets` of a trajectory.
pub trait Postprocessor {
    /// Postprocesses a single trajectory.
    ///
    /// `last_r` is the value of the state following the last transition, or
    /// `0.0` if the trajectory ended with a terminal state.
    fn postprocess(&self, batch: SampleBatch, last_r: f32) -> Result<SampleBatch>;
}

/// Discounted cumulative sum, `y[t] = x[t] + gamma * y[t + 1]`.
pub fn discount_cumsum(x: &[f32], gamma: f32) -> Vec<f32> {
    let mut y = vec![0f32; x.len()];
    let mut acc = 0f32;
    for t in (0..x.len()).rev() {
        acc = x[t] + gamma * acc;
        y[t] = acc;
    }
    y
}

/// Computes advantages and value targets of a trajectory.
///
/// * With `use_gae`, advantages are GAE(`gamma`, `lambda`) over the
///   temporal-difference residuals of `vf_preds`, and value targets are
///   `advantages + vf_preds`.
/// * Otherwise discounted returns bootstrapped with `last_r` are computed.
///   With `use_critic` the advantages are `returns - vf_preds` and the value
///   targets are the returns; without it the advantages are the returns and
///   the value targets are zero.
///
/// GAE requires a value function, so `use_gae` without `use_critic` is an
/// error.
pub fn compute_advantages(
    batch: SampleBatch,
    last_r: f32,
    gamma: f32,
    lambda: f32,
    use_gae: bool,
    use_critic: bool,
) -> Result<SampleBatch, A3cError> {
    let (advantages, value_targets) = if use_gae {
        if !use_critic {
            return Err(A3cError::GaeWithoutCritic);
        }
        let vf_preds = &batch.vf_preds;
        let deltas = (0..batch.len())
            .map(|t| {
                let next_v = vf_preds.get(t + 1).copied().unwrap_or(last_r);
                batch.rewards[t] + gamma * next_v - vf_preds[t]
            })
            .collect::<Vec<_>>();
        let advantages = discount_cumsum(&deltas, gamma * lambda);
        let value_targets = advantages
            .iter()
            .zip(vf_preds.iter())
            .map(|(a, v)| a + v)
            .collect();
        (advantages, value_targets)
    } else {
        let rewards_plus_v = batch
            .rewards
            .iter()
            .copied()
            .chain(std::iter::once(last_r))
            .collect::<Vec<_>>();
        let mut returns = discount_cumsum(&rewards_plus_v, gamma);
        returns.pop();

        if use_critic {
            let advantages = returns
                .iter()
                .zip(batch.vf_preds.iter())
                .map(|(r, v)| r - v)
                .collect();
            (advantages, returns)
        } else {
            let value_targets = vec![0f32; returns.len()];
            (returns, value_targets)
        }
    };

    Ok(batch.with_advantages(advantages, value_targets))
}

/// [`Postprocessor`] based on [`compute_advantages`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gae {
    /// Discount factor.
    pub gamma: f32,

    /// GAE parameter.
    pub lambda: f32,

    /// If `false`, plain discounted returns are used.
    pub use_gae: bool,

    /// If `false`, no value function baseline is subtracted.
    pub use_critic: bool,
}

impl Default for Gae {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            lambda: 1.0,
            use_gae: true,
            use_critic: true,
        }
    }
}

impl Postprocessor for Gae {
    fn postprocess(&self, batch: SampleBatch, last_r: f32) -> Result<SampleBatch> {
        log::trace!(
            "Compute advantages of {} transitions, last_r = {}",
            batch.len(),
            last_r
        );
        Ok(compute_advantages(
            batch,
            last_r,
            self.gamma,
            self.lambda,
            self.use_gae,
            self.use_critic,
        )?)
    }
}
