//! Statistics of a training step.
use super::{A3cLoss, ClippedGradients};
use crate::util::masked;
use a3c_core::record::{Record, RecordValue};
use anyhow::Result;
use candle_core::{DType, Tensor};

/// Current learning rate.
pub const CUR_LR: &str = "cur_lr";

/// Policy gradient loss.
pub const POLICY_LOSS: &str = "policy_loss";

/// Sum of the entropies of the action distributions.
pub const POLICY_ENTROPY: &str = "policy_entropy";

/// Value function loss.
pub const VF_LOSS: &str = "vf_loss";

/// Total loss.
pub const TOTAL_LOSS: &str = "total_loss";

/// Global norm of the trainable variables.
pub const VAR_GNORM: &str = "var_gnorm";

/// Global norm of the clipped gradients.
pub const GRAD_GNORM: &str = "grad_gnorm";

/// Explained variance of the value targets by the value predictions.
pub const VF_EXPLAINED_VAR: &str = "vf_explained_var";

/// Population variance over the positions where `valid_mask` is nonzero.
fn masked_variance(xs: &Tensor, valid_mask: &Tensor, n: f64) -> Result<f32> {
    let mean = (masked(xs, valid_mask)?.sum_all()? / n)?;
    let dev = masked(&xs.broadcast_sub(&mean)?, valid_mask)?;
    Ok((dev.sqr()?.sum_all()? / n)?.to_scalar::<f32>()?)
}

/// `max(-1, 1 - Var(y - pred) / Var(y))` over the valid timesteps.
///
/// Only positions where `valid_mask` is nonzero are taken into account, so
/// padded timesteps of a recurrent batch do not affect the value. A perfect
/// prediction gives 1 and predicting the mean of `y` gives 0. The value is
/// clamped at -1 and is -1 when `y` is constant or no timestep is valid.
pub fn explained_variance(y: &Tensor, pred: &Tensor, valid_mask: &Tensor) -> Result<f32> {
    let n = valid_mask
        .to_dtype(DType::F32)?
        .sum_all()?
        .to_scalar::<f32>()? as f64;
    if n == 0.0 {
        return Ok(-1.0);
    }

    let (y, pred) = (y.detach(), pred.detach());
    let var_y = masked_variance(&y, valid_mask, n)?;
    let var_res = masked_variance(&(&y - &pred)?, valid_mask, n)?;
    let ev = 1.0 - var_res / var_y;
    match ev.is_nan() {
        true => Ok(-1.0),
        false => Ok(ev.max(-1.0)),
    }
}

/// Statistics available right after the loss is computed.
pub fn loss_stats(loss: &A3cLoss, cur_lr: f64, var_gnorm: f32) -> Result<Record> {
    let scalar = |t: &Tensor| -> Result<RecordValue> {
        Ok(RecordValue::Scalar(t.to_scalar::<f32>()?))
    };

    Ok(Record::from_slice(&[
        (CUR_LR, RecordValue::Scalar(cur_lr as f32)),
        (POLICY_LOSS, scalar(loss.pi_loss())?),
        (POLICY_ENTROPY, scalar(loss.entropy())?),
        (VF_LOSS, scalar(loss.vf_loss())?),
        (TOTAL_LOSS, scalar(loss.total_loss())?),
        (VAR_GNORM, RecordValue::Scalar(var_gnorm)),
    ]))
}

/// Statistics available after the gradients are computed.
///
/// `value_targets` and `vf_preds` have shape `(n,)`, `valid_mask` is the `u8`
/// mask of the loss.
pub fn grad_stats(
    grads: &ClippedGradients,
    value_targets: &Tensor,
    vf_preds: &Tensor,
    valid_mask: &Tensor,
) -> Result<Record> {
    Ok(Record::from_slice(&[
        (GRAD_GNORM, RecordValue::Scalar(grads.clipped_norm()?)),
        (
            VF_EXPLAINED_VAR,
            RecordValue::Scalar(explained_variance(value_targets, vf_preds, valid_mask)?),
        ),
    ]))
}
