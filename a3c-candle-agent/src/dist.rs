//! Action distributions.
//!
//! A distribution is constructed from the policy output of the model for a
//! batch of timesteps and lives only for one loss evaluation.
mod categorical;
mod diag_gaussian;
use anyhow::Result;
pub use categorical::Categorical;
use candle_core::Tensor;
pub use diag_gaussian::DiagGaussian;

/// A batch of per-timestep action distributions.
pub trait ActionDistribution: Sized {
    /// Builds the distributions from the policy output of the model.
    fn from_model_out(model_out: &Tensor) -> Result<Self>;

    /// Log-probabilities (or densities) of the given actions, shape `(n,)`.
    ///
    /// `actions` has shape `(n, act_dim)`.
    fn logp(&self, actions: &Tensor) -> Result<Tensor>;

    /// Entropy of each distribution, shape `(n,)`.
    fn entropy(&self) -> Result<Tensor>;
}
