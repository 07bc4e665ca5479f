use super::ActionDistribution;
use anyhow::Result;
use candle_core::{DType, Tensor, D};
use candle_nn::ops::log_softmax;

/// Categorical distribution over discrete actions, parameterized by logits.
///
/// Actions are given as indices in a single column, shape `(n, 1)`.
pub struct Categorical {
    log_probs: Tensor,
}

impl ActionDistribution for Categorical {
    fn from_model_out(model_out: &Tensor) -> Result<Self> {
        let log_probs = log_softmax(model_out, D::Minus1)?;
        Ok(Self { log_probs })
    }

    fn logp(&self, actions: &Tensor) -> Result<Tensor> {
        let ixs = actions.to_dtype(DType::U32)?;
        Ok(self.log_probs.gather(&ixs, 1)?.squeeze(1)?)
    }

    fn entropy(&self) -> Result<Tensor> {
        let probs = self.log_probs.exp()?;
        Ok((probs * &self.log_probs)?.sum(D::Minus1)?.neg()?)
    }
}
