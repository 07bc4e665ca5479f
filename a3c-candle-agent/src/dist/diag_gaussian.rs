use super::ActionDistribution;
use anyhow::Result;
use candle_core::{Tensor, D};

const LN_2PI: f64 = 1.8378770664093453;

/// Gaussian distribution with a diagonal covariance.
///
/// The model output of shape `(n, 2 * act_dim)` is split into the mean and
/// the log standard deviation.
pub struct DiagGaussian {
    mean: Tensor,
    log_std: Tensor,
}

impl ActionDistribution for DiagGaussian {
    fn from_model_out(model_out: &Tensor) -> Result<Self> {
        let act_dim = model_out.dim(D::Minus1)? / 2;
        let mean = model_out.narrow(1, 0, act_dim)?;
        let log_std = model_out.narrow(1, act_dim, act_dim)?;
        Ok(Self { mean, log_std })
    }

    fn logp(&self, actions: &Tensor) -> Result<Tensor> {
        let act_dim = self.mean.dim(D::Minus1)? as f64;
        let z = ((actions - &self.mean)? / self.log_std.exp()?)?;
        let sq = z.sqr()?.sum(D::Minus1)?;
        let log_std = self.log_std.sum(D::Minus1)?;
        Ok(((sq * -0.5)? - log_std)?.affine(1.0, -0.5 * LN_2PI * act_dim)?)
    }

    fn entropy(&self) -> Result<Tensor> {
        let act_dim = self.mean.dim(D::Minus1)? as f64;
        Ok(self
            .log_std
            .sum(D::Minus1)?
            .affine(1.0, 0.5 * (LN_2PI + 1.0) * act_dim)?)
    }
}
