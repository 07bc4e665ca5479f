use super::{
    clip_gradients, stats, A3cBatch, A3cConfig, A3cLoss, ClippedGradients, Mixins,
};
use crate::{
    dist::ActionDistribution,
    model::ActorCriticModel,
    opt::Optimizer,
    util::{global_norm, mask_to_tensor},
};
use a3c_core::{
    mask::valid_mask,
    postprocessing::{Gae, Postprocessor},
    record::Record,
    SampleBatch,
};
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use log::{debug, info, trace};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;

/// A3C policy.
///
/// Owns an actor-critic model `M`, its trainable variables and an optimizer.
/// `D` is the action distribution built from the policy output of the model.
///
/// A training step on a postprocessed [`SampleBatch`] consists of
/// [`A3c::actor_critic_loss`], [`A3c::compute_gradients`],
/// [`A3c::apply_gradients`] and the statistics of the step, which
/// [`A3c::learn_on_batch`] runs in sequence.
pub struct A3c<M, D>
where
    M: ActorCriticModel,
    M::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
    D: ActionDistribution,
{
    model: M,
    varmap: VarMap,
    opt: Optimizer,
    mixins: Mixins,
    postprocessor: Gae,
    vf_loss_coeff: f64,
    entropy_coeff: f64,
    use_critic: bool,
    grad_clip: f64,
    global_step: usize,
    device: Device,
    phantom: PhantomData<D>,
}

impl<M, D> A3c<M, D>
where
    M: ActorCriticModel,
    M::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
    D: ActionDistribution,
{
    /// Constructs the policy and sets up its mixins.
    pub fn build(config: A3cConfig<M::Config>) -> Result<Self> {
        let device = config
            .device
            .ok_or_else(|| anyhow!("No device is given for A3C policy"))?
            .build()?;
        let model_config = config
            .model_config
            .clone()
            .ok_or_else(|| anyhow!("No model config is given for A3C policy"))?;

        let varmap = VarMap::new();
        let model = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            M::build(vb, model_config)?
        };

        let mixins = Mixins::new(&config, 0)?;
        let opt = config
            .opt_config
            .clone()
            .learning_rate(mixins.lr_schedule.cur_lr())
            .build(varmap.all_vars())?;

        info!(
            "Build A3C policy with {} trainable variables, recurrent = {}",
            varmap.all_vars().len(),
            model.is_recurrent()
        );

        Ok(Self {
            model,
            varmap,
            opt,
            mixins,
            postprocessor: Gae {
                gamma: config.gamma,
                lambda: config.lambda,
                use_gae: config.use_gae,
                use_critic: config.use_critic,
            },
            vf_loss_coeff: config.vf_loss_coeff,
            entropy_coeff: config.entropy_coeff,
            use_critic: config.use_critic,
            grad_clip: config.grad_clip,
            global_step: 0,
            device,
            phantom: PhantomData,
        })
    }

    /// Sets up the mixins from `config`.
    ///
    /// Mixins are set up when the policy is built. Calling this again with a
    /// configuration that agrees on the fields of the mixins keeps them, so
    /// the current learning rate is kept. Otherwise the mixins are rebuilt at
    /// the current global timestep. In both cases the loss coefficients, the
    /// critic and GAE flags, the gradient clipping threshold and the
    /// advantage postprocessor follow `config`, so that the value function
    /// query and the loss never disagree on whether a critic is used.
    pub fn setup_mixins(&mut self, config: &A3cConfig<M::Config>) -> Result<()> {
        self.postprocessor = Gae {
            gamma: config.gamma,
            lambda: config.lambda,
            use_gae: config.use_gae,
            use_critic: config.use_critic,
        };
        self.vf_loss_coeff = config.vf_loss_coeff;
        self.entropy_coeff = config.entropy_coeff;
        self.use_critic = config.use_critic;
        self.grad_clip = config.grad_clip;

        if self.mixins.is_built_from(config) {
            trace!("Mixins are already set up");
            return Ok(());
        }
        self.mixins = Mixins::new(config, self.global_step)?;
        debug!("Set up mixins at step {}", self.global_step);
        Ok(())
    }

    /// Validity mask of the timesteps in `batch` as a `u8` tensor.
    pub fn valid_mask(&self, batch: &A3cBatch) -> Result<Tensor> {
        let mask = valid_mask(
            batch.len(),
            batch.seq_lens.as_deref(),
            self.model.is_recurrent(),
        )?;
        mask_to_tensor(&mask, &self.device)
    }

    /// Computes the loss of the batch.
    ///
    /// Returns the loss terms and the value predictions of the model.
    pub fn actor_critic_loss(&self, batch: &A3cBatch) -> Result<(A3cLoss, Tensor)> {
        let mask = self.valid_mask(batch)?;
        let (model_out, vf) = self.model.forward(&batch.obs, batch.seq_lens.as_deref())?;
        let action_dist = D::from_model_out(&model_out)?;

        let loss = A3cLoss::new(
            &action_dist,
            &batch.actions,
            &batch.advantages,
            &batch.value_targets,
            &vf,
            &mask,
            self.vf_loss_coeff,
            self.entropy_coeff,
            self.use_critic,
        )?;

        Ok((loss, vf))
    }

    /// Differentiates the total loss and clips the gradients by their global
    /// norm.
    pub fn compute_gradients(&self, loss: &A3cLoss) -> Result<ClippedGradients> {
        clip_gradients(loss.total_loss(), &self.varmap.all_vars(), self.grad_clip)
    }

    /// Statistics of the loss.
    pub fn stats(&self, loss: &A3cLoss) -> Result<Record> {
        let vars = self.varmap.all_vars();
        let var_gnorm = global_norm(vars.iter().map(|v| v.as_tensor()))?;
        stats::loss_stats(loss, self.cur_lr(), var_gnorm)
    }

    /// Statistics of the gradients and the value predictions `vf`.
    ///
    /// The explained variance is computed over the valid timesteps of the
    /// batch only.
    pub fn grad_stats(
        &self,
        batch: &A3cBatch,
        vf: &Tensor,
        grads: &ClippedGradients,
    ) -> Result<Record> {
        let mask = self.valid_mask(batch)?;
        stats::grad_stats(grads, &batch.value_targets, vf, &mask)
    }

    /// Updates the trainable variables with the current learning rate.
    pub fn apply_gradients(&mut self, grads: &ClippedGradients) -> Result<()> {
        self.opt.set_learning_rate(self.cur_lr());
        self.opt.step(grads.grad_store())
    }

    /// Runs a training step on a postprocessed batch and returns its
    /// statistics.
    pub fn learn_on_batch(&mut self, batch: &SampleBatch) -> Result<Record> {
        let batch = A3cBatch::from_sample_batch(batch, &self.device)?;

        trace!("actor_critic_loss()");
        let (loss, vf) = self.actor_critic_loss(&batch)?;
        let record = self.stats(&loss)?;

        trace!("compute_gradients()");
        let grads = self.compute_gradients(&loss)?;
        let record = record.merge(self.grad_stats(&batch, &vf, &grads)?);

        trace!("apply_gradients()");
        self.apply_gradients(&grads)?;

        debug!(
            "Learn on {} timesteps, total_loss = {}",
            batch.len(),
            record.get_scalar(stats::TOTAL_LOSS)?
        );
        Ok(record)
    }

    /// Updates the global timestep and the learning rate following it.
    pub fn on_global_var_update(&mut self, step: usize) {
        self.global_step = step;
        self.mixins.lr_schedule.on_global_var_update(step);
    }

    /// Current learning rate.
    pub fn cur_lr(&self) -> f64 {
        self.mixins.lr_schedule.cur_lr()
    }

    /// Value of an observation.
    ///
    /// Always `0.0` if neither GAE nor the critic is used.
    pub fn value(&self, obs: &[f32]) -> Result<f32> {
        self.mixins
            .value_network
            .value(&self.model, obs, &self.device)
    }

    /// Fills advantages and value targets of a trajectory.
    ///
    /// The return after the last timestep is bootstrapped with the value of
    /// `next_obs` unless the trajectory ends with a terminal state.
    pub fn postprocess_trajectory(&self, batch: SampleBatch, next_obs: &[f32]) -> Result<SampleBatch> {
        let last_r = match batch.is_terminated() {
            true => 0.0,
            false => self.value(next_obs)?,
        };
        self.postprocessor.postprocess(batch, last_r)
    }

    /// Mixins of the policy.
    pub fn mixins(&self) -> &Mixins {
        &self.mixins
    }

    /// The actor-critic model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Optimizer updating the trainable variables.
    pub fn optimizer(&self) -> &Optimizer {
        &self.opt
    }

    /// Map holding the trainable variables.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Trainable variables of the model.
    pub fn trainable_variables(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Device of the model.
    pub fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dist::Categorical,
        mlp::{ActorCriticMlp, MlpConfig},
        opt::OptimizerConfig,
    };

    type Policy = A3c<ActorCriticMlp, Categorical>;

    fn config() -> A3cConfig<MlpConfig> {
        A3cConfig::default()
            .model_config(MlpConfig::new(2, vec![4], 3))
            .opt_config(OptimizerConfig::Sgd { lr: 1.0 })
            .lr_schedule(vec![(0, 1e-2), (100, 1e-3)])
            .device(&candle_core::Device::Cpu)
    }

    #[test]
    fn test_build_requires_device() {
        let mut config = config();
        config.device = None;
        assert!(Policy::build(config).is_err());
    }

    #[test]
    fn test_setup_mixins_idempotent() -> Result<()> {
        let config = config();
        let mut policy = Policy::build(config.clone())?;
        assert_eq!(policy.cur_lr(), 1e-2);

        policy.on_global_var_update(50);
        let lr = policy.cur_lr();
        assert!((lr - 5.5e-3).abs() < 1e-12);

        policy.setup_mixins(&config)?;
        policy.setup_mixins(&config)?;
        assert_eq!(policy.cur_lr(), lr);

        // rebuilt at the current step with another schedule
        policy.setup_mixins(&config.lr_schedule(vec![(0, 1.0), (100, 0.0)]))?;
        assert!((policy.cur_lr() - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_setup_mixins_updates_loss() -> Result<()> {
        let mut policy = Policy::build(config())?;
        let batch = SampleBatch::new(
            vec![0.1, -0.2, 0.3, 0.4, -0.5, 0.6],
            2,
            vec![0.0, 2.0, 1.0],
            1,
            vec![1.0, -1.0, 2.0],
            vec![false; 3],
            vec![0.5, -0.5, 1.0],
        );

        let config = config()
            .use_critic(false)
            .use_gae(false)
            .entropy_coeff(0.5)
            .grad_clip(1e-3);
        policy.setup_mixins(&config)?;
        assert_eq!(policy.value(&[1.0, -1.0])?, 0.0);

        let batch = policy.postprocess_trajectory(batch, &[1.0, -1.0])?;
        assert_eq!(batch.value_targets, vec![0.0; 3]);

        let batch = A3cBatch::from_sample_batch(&batch, policy.device())?;
        let (loss, _) = policy.actor_critic_loss(&batch)?;
        assert_eq!(loss.vf_loss().to_scalar::<f32>()?, 0.0);

        let pi_loss = loss.pi_loss().to_scalar::<f32>()?;
        let entropy = loss.entropy().to_scalar::<f32>()?;
        let total_loss = loss.total_loss().to_scalar::<f32>()?;
        assert!((total_loss - (pi_loss - 0.5 * entropy)).abs() < 1e-5);

        let grads = policy.compute_gradients(&loss)?;
        assert!((grads.clipped_norm()? - 1e-3).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_value_without_critic() -> Result<()> {
        let config = config().use_critic(false).use_gae(false);
        let policy = Policy::build(config)?;
        assert_eq!(policy.value(&[1.0, -1.0])?, 0.0);
        Ok(())
    }
}
