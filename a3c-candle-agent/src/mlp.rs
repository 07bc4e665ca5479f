//! Multilayer perceptron with a policy head and a value head.
mod base;
mod config;
pub use base::ActorCriticMlp;
use candle_core::{Module, Tensor};
use candle_nn::Linear;
pub use config::MlpConfig;

fn mlp_forward(xs: Tensor, layers: &[Linear]) -> candle_core::Result<Tensor> {
    let mut xs = xs;
    for layer in layers {
        xs = layer.forward(&xs)?.relu()?;
    }
    Ok(xs)
}
