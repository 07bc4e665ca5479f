//! Trajectory batch.
use serde::{Deserialize, Serialize};

/// A batch of transitions collected by a rollout worker.
///
/// Per-timestep fields are stored flat; `obs` and `actions` have `obs_dim`
/// and `act_dim` columns respectively. A discrete action is stored as its
/// index in a single column.
///
/// `advantages` and `value_targets` are filled by a
/// [`Postprocessor`](crate::postprocessing::Postprocessor) before the batch
/// reaches the loss. When the batch consists of padded sequences of a
/// recurrent policy, `seq_lens` holds the real length of each sequence and
/// every per-timestep field has `seq_lens.len()` blocks of the same padded
/// length, usually `max(seq_lens)`.
///
/// Lengths of the fields are expected to agree; they are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleBatch {
    /// Observations, `len() * obs_dim` values.
    pub obs: Vec<f32>,

    /// Number of columns in `obs`.
    pub obs_dim: usize,

    /// Actions, `len() * act_dim` values.
    pub actions: Vec<f32>,

    /// Number of columns in `actions`.
    pub act_dim: usize,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// Terminal flags.
    pub dones: Vec<bool>,

    /// Value predictions made when the transitions were sampled.
    pub vf_preds: Vec<f32>,

    /// Advantage estimates.
    pub advantages: Vec<f32>,

    /// Regression targets of the value function.
    pub value_targets: Vec<f32>,

    /// Real lengths of padded sequences.
    pub seq_lens: Option<Vec<usize>>,
}

impl SampleBatch {
    /// Creates a batch from raw transitions.
    ///
    /// `advantages` and `value_targets` are left empty.
    pub fn new(
        obs: Vec<f32>,
        obs_dim: usize,
        actions: Vec<f32>,
        act_dim: usize,
        rewards: Vec<f32>,
        dones: Vec<bool>,
        vf_preds: Vec<f32>,
    ) -> Self {
        Self {
            obs,
            obs_dim,
            actions,
            act_dim,
            rewards,
            dones,
            vf_preds,
            advantages: vec![],
            value_targets: vec![],
            seq_lens: None,
        }
    }

    /// Sets the lengths of padded sequences.
    pub fn seq_lens(mut self, v: Vec<usize>) -> Self {
        self.seq_lens = Some(v);
        self
    }

    /// Sets advantages and value targets.
    pub fn with_advantages(mut self, advantages: Vec<f32>, value_targets: Vec<f32>) -> Self {
        self.advantages = advantages;
        self.value_targets = value_targets;
        self
    }

    /// Number of (possibly padded) timesteps.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if the batch has no timesteps.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Observation of the `ix`-th timestep.
    pub fn obs_at(&self, ix: usize) -> &[f32] {
        &self.obs[ix * self.obs_dim..(ix + 1) * self.obs_dim]
    }

    /// Returns `true` if the last timestep ends an episode.
    pub fn is_terminated(&self) -> bool {
        self.dones.last().copied().unwrap_or(false)
    }
}
