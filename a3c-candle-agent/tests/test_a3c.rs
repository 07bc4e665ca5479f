use a3c_candle_agent::{
    a3c::{stats, A3c, A3cBatch, A3cConfig},
    dist::{Categorical, DiagGaussian},
    mlp::{ActorCriticMlp, MlpConfig},
    model::ActorCriticModel,
    opt::OptimizerConfig,
};
use a3c_core::SampleBatch;
use anyhow::Result;
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use serde::{Deserialize, Serialize};

const DIM_OBS: usize = 3;
const N_ACTIONS: usize = 2;
const LR: f64 = 0.05;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn snapshot(policy_vars: &[candle_core::Var]) -> Result<Vec<Vec<f32>>> {
    policy_vars
        .iter()
        .map(|v| -> Result<Vec<f32>> { Ok(v.as_tensor().flatten_all()?.to_vec1::<f32>()?) })
        .collect()
}

/// A trajectory of 4 transitions of a discrete-action environment.
fn trajectory(terminated: bool) -> SampleBatch {
    let obs = (0..4 * DIM_OBS).map(|i| (i as f32 * 0.37).sin()).collect();
    let actions = vec![0.0, 1.0, 1.0, 0.0];
    let rewards = vec![1.0, 0.0, -1.0, 0.5];
    let dones = vec![false, false, false, terminated];
    let vf_preds = vec![0.2, 0.1, -0.3, 0.4];
    SampleBatch::new(obs, DIM_OBS, actions, 1, rewards, dones, vf_preds)
}

type MlpPolicy = A3c<ActorCriticMlp, Categorical>;

fn mlp_config() -> A3cConfig<MlpConfig> {
    A3cConfig::default()
        .model_config(MlpConfig::new(DIM_OBS, vec![16, 16], N_ACTIONS))
        .opt_config(OptimizerConfig::Sgd { lr: LR })
        .lr(LR)
        .device(&Device::Cpu)
}

#[test]
fn test_learn_on_batch() -> Result<()> {
    init_logger();
    let mut policy = MlpPolicy::build(mlp_config())?;
    let batch = policy.postprocess_trajectory(trajectory(true), &[0.0; DIM_OBS])?;
    let vars = policy.trainable_variables();
    let before = snapshot(&vars)?;

    let record = policy.learn_on_batch(&batch)?;

    for key in [
        stats::CUR_LR,
        stats::POLICY_LOSS,
        stats::POLICY_ENTROPY,
        stats::VF_LOSS,
        stats::TOTAL_LOSS,
        stats::VAR_GNORM,
        stats::GRAD_GNORM,
        stats::VF_EXPLAINED_VAR,
    ] {
        let v = record.get_scalar(key)?;
        assert!(v.is_finite(), "{} = {}", key, v);
    }
    assert_eq!(record.len(), 8);
    assert!((record.get_scalar(stats::CUR_LR)? as f64 - LR).abs() < 1e-8);
    assert!(record.get_scalar(stats::GRAD_GNORM)? <= 40.0 + 1e-4);
    assert!(record.get_scalar(stats::VF_EXPLAINED_VAR)? >= -1.0);

    let after = snapshot(&vars)?;
    assert_ne!(before, after);
    Ok(())
}

#[test]
fn test_gradient_clipping() -> Result<()> {
    let mut policy = MlpPolicy::build(mlp_config().grad_clip(1e-3))?;
    let batch = policy.postprocess_trajectory(trajectory(true), &[0.0; DIM_OBS])?;
    let record = policy.learn_on_batch(&batch)?;
    assert!((record.get_scalar(stats::GRAD_GNORM)? - 1e-3).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_sgd_step_with_scheduled_lr() -> Result<()> {
    let config = mlp_config().lr_schedule(vec![(0, 1e-1), (10, 1e-2)]);
    let mut policy = MlpPolicy::build(config)?;
    policy.on_global_var_update(20);
    assert_eq!(policy.cur_lr(), 1e-2);

    let batch = policy.postprocess_trajectory(trajectory(false), &[0.5; DIM_OBS])?;
    let batch = A3cBatch::from_sample_batch(&batch, &Device::Cpu)?;
    let (loss, _) = policy.actor_critic_loss(&batch)?;
    let grads = policy.compute_gradients(&loss)?;
    let before = grads
        .iter()
        .map(|(v, g)| -> Result<(Tensor, Tensor)> { Ok((v.as_tensor().copy()?, g.clone())) })
        .collect::<Result<Vec<_>>>()?;

    policy.apply_gradients(&grads)?;
    assert_eq!(policy.optimizer().learning_rate(), 1e-2);

    // theta <- theta - lr * grad
    for ((v, _), (v0, g)) in grads.iter().zip(before.iter()) {
        let expected = (v0 - (g * 1e-2)?)?;
        let diff = (v.as_tensor() - expected)?
            .abs()?
            .flatten_all()?
            .max(0)?
            .to_scalar::<f32>()?;
        assert!(diff < 1e-6);
    }
    Ok(())
}

#[test]
fn test_continuous_actions() -> Result<()> {
    let config = A3cConfig::default()
        .model_config(MlpConfig::new(DIM_OBS, vec![8], 2))
        .device(&Device::Cpu);
    let mut policy = A3c::<ActorCriticMlp, DiagGaussian>::build(config)?;

    let obs = (0..4 * DIM_OBS).map(|i| i as f32 * 0.1).collect();
    let batch = SampleBatch::new(
        obs,
        DIM_OBS,
        vec![0.3, -0.2, 1.5, 0.0],
        1,
        vec![1.0; 4],
        vec![false; 4],
        vec![0.0; 4],
    );
    let batch = policy.postprocess_trajectory(batch, &[0.0; DIM_OBS])?;
    let record = policy.learn_on_batch(&batch)?;
    assert!(record.get_scalar(stats::TOTAL_LOSS)?.is_finite());
    Ok(())
}

#[test]
#[allow(deprecated)]
fn test_deprecated_postprocess_advantages() -> Result<()> {
    init_logger();
    let policy = MlpPolicy::build(mlp_config())?;
    let next_obs = [0.1, 0.2, 0.3];

    let direct = policy.postprocess_trajectory(trajectory(false), &next_obs)?;
    let deprecated =
        a3c_candle_agent::a3c::postprocess_advantages(&policy, trajectory(false), &next_obs)?;
    assert_eq!(direct, deprecated);
    Ok(())
}

#[test]
fn test_bootstrap_value() -> Result<()> {
    let policy = MlpPolicy::build(mlp_config().discount_factor(1.0).use_gae(false))?;
    let next_obs = [0.1, 0.2, 0.3];
    let last_r = policy.value(&next_obs)?;

    // returns of the last timestep
    let batch = policy.postprocess_trajectory(trajectory(false), &next_obs)?;
    assert!((batch.value_targets[3] - (0.5 + last_r)).abs() < 1e-5);

    let batch = policy.postprocess_trajectory(trajectory(true), &next_obs)?;
    assert!((batch.value_targets[3] - 0.5).abs() < 1e-6);
    Ok(())
}

/// Model flagged as recurrent whose outputs depend on the current timestep
/// only, so that a padded batch and its truncation give the same loss.
struct PerStepModel {
    pi: Linear,
    vf: Linear,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
struct PerStepConfig {
    in_dim: usize,
    out_dim: usize,
}

impl ActorCriticModel for PerStepModel {
    type Config = PerStepConfig;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        Ok(Self {
            pi: linear(config.in_dim, config.out_dim, vb.pp("pi"))?,
            vf: linear(config.in_dim, 1, vb.pp("vf"))?,
        })
    }

    fn forward(&self, obs: &Tensor, seq_lens: Option<&[usize]>) -> Result<(Tensor, Tensor)> {
        assert!(seq_lens.is_some());
        Ok((self.pi.forward(obs)?, self.vf.forward(obs)?.squeeze(1)?))
    }

    fn is_recurrent(&self) -> bool {
        true
    }
}

fn recurrent_policy() -> Result<A3c<PerStepModel, Categorical>> {
    let config = A3cConfig::default()
        .model_config(PerStepConfig {
            in_dim: DIM_OBS,
            out_dim: N_ACTIONS,
        })
        .device(&Device::Cpu);
    A3c::build(config)
}

/// Two sequences of lengths 2 and 1 padded to 2 timesteps. Padded entries of
/// advantages and value targets are not finite.
fn padded_batch() -> SampleBatch {
    let obs = vec![
        0.1, 0.2, 0.3, //
        0.4, 0.5, 0.6, //
        0.7, 0.8, 0.9, //
        0.0, 0.0, 0.0, //
    ];
    let mut batch = SampleBatch::new(
        obs,
        DIM_OBS,
        vec![1.0, 0.0, 1.0, 0.0],
        1,
        vec![0.0; 4],
        vec![false; 4],
        vec![0.0; 4],
    )
    .seq_lens(vec![2, 1]);
    batch.advantages = vec![0.5, -1.0, 2.0, f32::INFINITY];
    batch.value_targets = vec![1.0, 0.0, -1.0, f32::NAN];
    batch
}

#[test]
fn test_recurrent_padding() -> Result<()> {
    init_logger();
    let policy = recurrent_policy()?;
    let padded = A3cBatch::from_sample_batch(&padded_batch(), &Device::Cpu)?;

    let truncated = {
        let b = padded_batch();
        let mut t = SampleBatch::new(
            b.obs[..3 * DIM_OBS].to_vec(),
            DIM_OBS,
            b.actions[..3].to_vec(),
            1,
            vec![0.0; 3],
            vec![false; 3],
            vec![0.0; 3],
        )
        .seq_lens(vec![3]);
        t.advantages = b.advantages[..3].to_vec();
        t.value_targets = b.value_targets[..3].to_vec();
        A3cBatch::from_sample_batch(&t, &Device::Cpu)?
    };

    let (loss_p, _) = policy.actor_critic_loss(&padded)?;
    let (loss_t, _) = policy.actor_critic_loss(&truncated)?;
    for (a, b) in [
        (loss_p.pi_loss(), loss_t.pi_loss()),
        (loss_p.vf_loss(), loss_t.vf_loss()),
        (loss_p.entropy(), loss_t.entropy()),
        (loss_p.total_loss(), loss_t.total_loss()),
    ] {
        let (a, b) = (a.to_scalar::<f32>()?, b.to_scalar::<f32>()?);
        assert!(a.is_finite());
        assert!((a - b).abs() < 1e-5, "{} != {}", a, b);
    }

    let grads = policy.compute_gradients(&loss_p)?;
    assert!(grads.global_norm().is_finite());
    for (_, g) in grads.iter() {
        let s = g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        assert!(s.is_finite());
    }
    Ok(())
}

#[test]
fn test_recurrent_learn_on_batch() -> Result<()> {
    let mut policy = recurrent_policy()?;
    let record = policy.learn_on_batch(&padded_batch())?;
    assert!(record.get_scalar(stats::TOTAL_LOSS)?.is_finite());
    assert!(record.get_scalar(stats::VF_EXPLAINED_VAR)?.is_finite());
    Ok(())
}

#[test]
fn test_recurrent_without_seq_lens() -> Result<()> {
    let mut policy = recurrent_policy()?;
    let mut batch = padded_batch();
    batch.seq_lens = None;
    assert!(policy.learn_on_batch(&batch).is_err());
    Ok(())
}

#[test]
fn test_recurrent_bootstrap_value() -> Result<()> {
    let policy = recurrent_policy()?;
    let next_obs = [0.3, -0.1, 0.2];

    let last_r = policy.value(&next_obs)?;
    let obs = Tensor::from_slice(&next_obs, (1, DIM_OBS), &Device::Cpu)?;
    let (_, vf) = policy.model().forward(&obs, Some(&[1][..]))?;
    assert!((last_r - vf.get(0)?.to_scalar::<f32>()?).abs() < 1e-6);

    let batch = policy.postprocess_trajectory(trajectory(false), &next_obs)?;
    assert_eq!(batch.value_targets.len(), 4);
    assert!(batch.value_targets.iter().all(|v| v.is_finite()));
    Ok(())
}
