//! Asynchronous advantage actor-critic (A3C) policy.
mod base;
mod batch;
mod config;
mod grad;
mod loss;
mod mixins;
pub mod stats;
use crate::{dist::ActionDistribution, model::ActorCriticModel};
use a3c_core::SampleBatch;
use anyhow::Result;
pub use base::A3c;
pub use batch::A3cBatch;
pub use config::A3cConfig;
pub use grad::{clip_gradients, ClippedGradients};
pub use loss::A3cLoss;
pub use mixins::{LearningRateSchedule, Mixins, ValueNetwork};
use serde::{de::DeserializeOwned, Serialize};

/// Fills advantages and value targets of a trajectory.
#[deprecated(note = "use `A3c::postprocess_trajectory` instead")]
pub fn postprocess_advantages<M, D>(
    policy: &A3c<M, D>,
    batch: SampleBatch,
    next_obs: &[f32],
) -> Result<SampleBatch>
where
    M: ActorCriticModel,
    M::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
    D: ActionDistribution,
{
    log::warn!("`postprocess_advantages` is deprecated, use `A3c::postprocess_trajectory`");
    policy.postprocess_trajectory(batch, next_obs)
}
