use super::{mlp_forward, MlpConfig};
use crate::model::ActorCriticModel;
use anyhow::Result;
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Returns the hidden layers described by [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: &VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let dims = std::iter::once(config.in_dim)
        .chain(config.units.iter().copied())
        .collect::<Vec<_>>();
    let vs = vs.pp(prefix);

    let layers = dims
        .windows(2)
        .enumerate()
        .map(|(i, w)| linear(w[0], w[1], vs.pp(format!("ln{}", i))))
        .collect::<candle_core::Result<Vec<_>>>()?;
    Ok(layers)
}

/// Multilayer perceptron with ReLU hidden layers shared by a policy head and
/// a value head.
///
/// Parameters are named `mlp.ln{i}.*`, `pi.*` and `vf.*` under the prefix of
/// the given [`VarBuilder`].
pub struct ActorCriticMlp {
    device: Device,
    layers: Vec<Linear>,
    pi: Linear,
    vf: Linear,
}

impl ActorCriticModel for ActorCriticMlp {
    type Config = MlpConfig;

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", &vs, &config)?;
        let in_dim = config.units.last().copied().unwrap_or(config.in_dim);
        let pi = linear(in_dim, config.out_dim, vs.pp("pi"))?;
        let vf = linear(in_dim, 1, vs.pp("vf"))?;

        Ok(Self {
            device,
            layers,
            pi,
            vf,
        })
    }

    fn forward(&self, obs: &Tensor, _seq_lens: Option<&[usize]>) -> Result<(Tensor, Tensor)> {
        let xs = obs.to_device(&self.device)?;
        let xs = mlp_forward(xs, &self.layers)?;
        let dist_inputs = self.pi.forward(&xs)?;
        let values = self.vf.forward(&xs)?.squeeze(1)?;
        Ok((dist_inputs, values))
    }
}
