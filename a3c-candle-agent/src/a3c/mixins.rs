//! Capabilities attached to [`A3c`](super::A3c) before its first loss
//! computation.
use super::A3cConfig;
use crate::model::ActorCriticModel;
use a3c_core::schedule::Schedule;
use anyhow::Result;
use candle_core::{Device, Tensor};

/// Queries the value function of the model for a single observation.
///
/// Used to bootstrap the return of a trajectory cut before a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNetwork {
    enabled: bool,
}

impl ValueNetwork {
    /// The value function is queried only if either GAE or the critic is used.
    pub fn new(use_gae: bool, use_critic: bool) -> Self {
        Self {
            enabled: use_gae || use_critic,
        }
    }

    /// Value of `obs`, or `0.0` if the value function is not used.
    ///
    /// A recurrent model receives `obs` as a single sequence of length one.
    pub fn value<M: ActorCriticModel>(&self, model: &M, obs: &[f32], device: &Device) -> Result<f32> {
        if !self.enabled {
            return Ok(0.0);
        }
        let obs = Tensor::from_slice(obs, (1, obs.len()), device)?;
        let seq_lens: Option<&[usize]> = model.is_recurrent().then_some(&[1][..]);
        let (_, values) = model.forward(&obs, seq_lens)?;
        Ok(values.get(0)?.to_scalar::<f32>()?)
    }
}

/// Current learning rate following a [`Schedule`].
#[derive(Debug, Clone, PartialEq)]
pub struct LearningRateSchedule {
    schedule: Schedule,
    cur_lr: f64,
}

impl LearningRateSchedule {
    /// Creates the schedule and sets the learning rate at `step`.
    pub fn new(lr: f64, lr_schedule: Option<&[(usize, f64)]>, step: usize) -> Result<Self> {
        let schedule = Schedule::new(lr, lr_schedule)?;
        let cur_lr = schedule.value(step);
        Ok(Self { schedule, cur_lr })
    }

    /// Updates the learning rate to its value at the global timestep `step`.
    pub fn on_global_var_update(&mut self, step: usize) {
        self.cur_lr = self.schedule.value(step);
        log::trace!("Learning rate at step {}: {}", step, self.cur_lr);
    }

    /// Current learning rate.
    pub fn cur_lr(&self) -> f64 {
        self.cur_lr
    }
}

/// Fields of [`A3cConfig`] the mixins are built from.
#[derive(Debug, Clone, PartialEq)]
struct MixinsKey {
    use_gae: bool,
    use_critic: bool,
    lr: f64,
    lr_schedule: Option<Vec<(usize, f64)>>,
}

impl<C> From<&A3cConfig<C>> for MixinsKey {
    fn from(config: &A3cConfig<C>) -> Self {
        Self {
            use_gae: config.use_gae,
            use_critic: config.use_critic,
            lr: config.lr,
            lr_schedule: config.lr_schedule.clone(),
        }
    }
}

/// Mixins of [`A3c`](super::A3c).
#[derive(Debug, Clone, PartialEq)]
pub struct Mixins {
    key: MixinsKey,

    /// Value function query.
    pub value_network: ValueNetwork,

    /// Learning rate.
    pub lr_schedule: LearningRateSchedule,
}

impl Mixins {
    /// Builds the mixins with the learning rate at `step`.
    pub fn new<C>(config: &A3cConfig<C>, step: usize) -> Result<Self> {
        Ok(Self {
            key: config.into(),
            value_network: ValueNetwork::new(config.use_gae, config.use_critic),
            lr_schedule: LearningRateSchedule::new(
                config.lr,
                config.lr_schedule.as_deref(),
                step,
            )?,
        })
    }

    /// Returns `true` if the mixins were built from the same fields of
    /// `config`.
    pub fn is_built_from<C>(&self, config: &A3cConfig<C>) -> bool {
        self.key == MixinsKey::from(config)
    }
}
