use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`ActorCriticMlp`](super::ActorCriticMlp).
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `in_dim` - Dimension of observations.
    /// * `units` - Widths of the hidden layers shared by both heads.
    /// * `out_dim` - Dimension of the action distribution inputs, e.g. the
    ///   number of discrete actions, or twice the action dimension for a
    ///   diagonal Gaussian.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
        }
    }

    /// Returns the dimension of the action distribution inputs.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }
}
