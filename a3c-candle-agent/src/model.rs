//! Interface of the actor-critic network consumed by the A3C core.
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarBuilder;

/// Neural network with a policy output and a value output.
///
/// The model does not own its [`VarMap`]; it is built from a [`VarBuilder`]
/// so that the parameters live in the map held by [`A3c`], which hands them
/// to the gradient computation and the optimizer.
///
/// [`VarMap`]: candle_nn::VarMap
/// [`A3c`]: crate::a3c::A3c
pub trait ActorCriticModel {
    /// Configuration from which the model is constructed.
    type Config;

    /// Builds the model with [`VarBuilder`] and [`ActorCriticModel::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Returns the inputs of the action distribution and the value
    /// predictions for a batch of observations.
    ///
    /// `obs` has shape `(n, obs_dim)`. The first output has shape
    /// `(n, dist_dim)`, the second `(n,)`. `seq_lens` is given to recurrent
    /// models, whose `n` timesteps are padded sequences laid out
    /// sequence-major.
    fn forward(&self, obs: &Tensor, seq_lens: Option<&[usize]>) -> Result<(Tensor, Tensor)>;

    /// Returns `true` if the output at a timestep depends on earlier
    /// timesteps of the same sequence.
    fn is_recurrent(&self) -> bool {
        false
    }
}
