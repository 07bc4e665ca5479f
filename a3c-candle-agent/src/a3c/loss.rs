use crate::{dist::ActionDistribution, util::masked};
use anyhow::Result;
use candle_core::Tensor;

/// Loss terms of A3C for a batch.
///
/// All terms are scalar tensors attached to the computation graph of the
/// model, so that [`A3cLoss::total_loss`] can be differentiated.
pub struct A3cLoss {
    pi_loss: Tensor,
    vf_loss: Tensor,
    entropy: Tensor,
    total_loss: Tensor,
}

impl A3cLoss {
    /// Computes the loss terms.
    ///
    /// * `actions` - `(n, act_dim)`
    /// * `advantages`, `v_target`, `vf` - `(n,)`
    /// * `valid_mask` - `(n,)` `u8` tensor, zero at padded timesteps
    ///
    /// Every per-timestep input is masked before it is combined with another,
    /// so padded timesteps never contribute to a term or its gradient.
    #[allow(clippy::too_many_arguments)]
    pub fn new<D: ActionDistribution>(
        action_dist: &D,
        actions: &Tensor,
        advantages: &Tensor,
        v_target: &Tensor,
        vf: &Tensor,
        valid_mask: &Tensor,
        vf_loss_coeff: f64,
        entropy_coeff: f64,
        use_critic: bool,
    ) -> Result<Self> {
        let logp = masked(&action_dist.logp(actions)?, valid_mask)?;
        let advantages = masked(advantages, valid_mask)?;

        let pi_loss = (logp * advantages)?.sum_all()?.neg()?;

        let vf_loss = match use_critic {
            true => {
                let delta = (masked(vf, valid_mask)? - masked(v_target, valid_mask)?)?;
                (delta.sqr()?.sum_all()? * 0.5)?
            }
            false => Tensor::new(0f32, vf.device())?,
        };

        let entropy = masked(&action_dist.entropy()?, valid_mask)?.sum_all()?;

        let total_loss =
            ((&pi_loss + (&vf_loss * vf_loss_coeff)?)? - (&entropy * entropy_coeff)?)?;

        Ok(Self {
            pi_loss,
            vf_loss,
            entropy,
            total_loss,
        })
    }

    /// Negative advantage-weighted log-likelihood of the taken actions.
    pub fn pi_loss(&self) -> &Tensor {
        &self.pi_loss
    }

    /// Half the sum of squared value residuals, or zero without a critic.
    pub fn vf_loss(&self) -> &Tensor {
        &self.vf_loss
    }

    /// Sum of the entropies of the action distributions.
    pub fn entropy(&self) -> &Tensor {
        &self.entropy
    }

    /// `pi_loss + vf_loss_coeff * vf_loss - entropy_coeff * entropy`.
    pub fn total_loss(&self) -> &Tensor {
        &self.total_loss
    }
}
