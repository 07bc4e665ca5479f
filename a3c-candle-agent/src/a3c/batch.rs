use crate::util::vec_to_tensor2;
use a3c_core::SampleBatch;
use anyhow::Result;
use candle_core::{Device, Tensor};

/// Tensors of a [`SampleBatch`] consumed by the loss.
pub struct A3cBatch {
    /// Observations, `(n, obs_dim)`.
    pub obs: Tensor,

    /// Actions, `(n, act_dim)`.
    pub actions: Tensor,

    /// Advantages, `(n,)`.
    pub advantages: Tensor,

    /// Value targets, `(n,)`.
    pub value_targets: Tensor,

    /// Real lengths of padded sequences.
    pub seq_lens: Option<Vec<usize>>,
}

impl A3cBatch {
    /// Moves the fields of a postprocessed batch to `device`.
    pub fn from_sample_batch(batch: &SampleBatch, device: &Device) -> Result<Self> {
        let n = batch.len();
        Ok(Self {
            obs: vec_to_tensor2(&batch.obs, batch.obs_dim, device)?,
            actions: vec_to_tensor2(&batch.actions, batch.act_dim, device)?,
            advantages: Tensor::from_slice(&batch.advantages, (n,), device)?,
            value_targets: Tensor::from_slice(&batch.value_targets, (n,), device)?,
            seq_lens: batch.seq_lens.clone(),
        })
    }

    /// Number of (possibly padded) timesteps.
    pub fn len(&self) -> usize {
        self.advantages.dims()[0]
    }

    /// Returns `true` if the batch has no timesteps.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
