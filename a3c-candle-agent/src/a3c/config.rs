//! Configuration of A3C policy.
use crate::{opt::OptimizerConfig, Device};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`A3c`](super::A3c).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct A3cConfig<C> {
    /// Configuration of the actor-critic model.
    pub model_config: Option<C>,

    /// Configuration of the optimizer. Its learning rate is replaced by the
    /// current value of the learning rate schedule.
    pub opt_config: OptimizerConfig,

    /// Learning rate.
    pub lr: f64,

    /// Endpoints `(timestep, lr)` of a piecewise linear learning rate
    /// schedule. If `None`, `lr` is used throughout training.
    pub lr_schedule: Option<Vec<(usize, f64)>>,

    /// Weight of the value function loss in the total loss.
    pub vf_loss_coeff: f64,

    /// Weight of the entropy bonus in the total loss.
    pub entropy_coeff: f64,

    /// If `false`, the value function loss is zero.
    pub use_critic: bool,

    /// If `true`, advantages are computed with GAE.
    pub use_gae: bool,

    /// Discount factor.
    pub gamma: f32,

    /// GAE parameter.
    pub lambda: f32,

    /// Threshold of the global norm of gradients.
    pub grad_clip: f64,

    /// Device of the model.
    pub device: Option<Device>,
}

impl<C> Default for A3cConfig<C> {
    fn default() -> Self {
        Self {
            model_config: None,
            opt_config: OptimizerConfig::default(),
            lr: 1e-4,
            lr_schedule: None,
            vf_loss_coeff: 0.5,
            entropy_coeff: 0.01,
            use_critic: true,
            use_gae: true,
            gamma: 0.99,
            lambda: 1.0,
            grad_clip: 40.0,
            device: None,
        }
    }
}

impl<C> A3cConfig<C>
where
    C: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, v: C) -> Self {
        self.model_config = Some(v);
        self
    }

    /// Sets the optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Learning rate.
    pub fn lr(mut self, v: f64) -> Self {
        self.lr = v;
        self
    }

    /// Learning rate schedule.
    pub fn lr_schedule(mut self, v: Vec<(usize, f64)>) -> Self {
        self.lr_schedule = Some(v);
        self
    }

    /// Value function loss coefficient.
    pub fn vf_loss_coeff(mut self, v: f64) -> Self {
        self.vf_loss_coeff = v;
        self
    }

    /// Entropy coefficient.
    pub fn entropy_coeff(mut self, v: f64) -> Self {
        self.entropy_coeff = v;
        self
    }

    /// Whether to train a value function.
    pub fn use_critic(mut self, v: bool) -> Self {
        self.use_critic = v;
        self
    }

    /// Whether to use GAE.
    pub fn use_gae(mut self, v: bool) -> Self {
        self.use_gae = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// GAE parameter.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Gradient clipping threshold.
    pub fn grad_clip(mut self, v: f64) -> Self {
        self.grad_clip = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: &candle_core::Device) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Constructs [`A3cConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of A3C policy from {}", path_.display());
        Ok(b)
    }

    /// Saves [`A3cConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of A3C policy into {}", path_.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mlp::MlpConfig;
    use tempdir::TempDir;

    #[test]
    fn test_serde_a3c_config() -> Result<()> {
        let config = A3cConfig::default()
            .model_config(MlpConfig::new(4, vec![64, 64], 2))
            .lr_schedule(vec![(0, 1e-3), (1000, 1e-4)])
            .entropy_coeff(0.05)
            .use_critic(false)
            .use_gae(false)
            .grad_clip(10.0)
            .device(&candle_core::Device::Cpu);

        let dir = TempDir::new("a3c_config")?;
        let path = dir.path().join("a3c_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = A3cConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);

        Ok(())
    }

    #[test]
    fn test_defaults() {
        let config = A3cConfig::<MlpConfig>::default();
        assert_eq!(config.vf_loss_coeff, 0.5);
        assert_eq!(config.entropy_coeff, 0.01);
        assert!(config.use_critic);
        assert_eq!(config.grad_clip, 40.0);
    }
}
