//! Utilities.
use anyhow::Result;
use candle_core::{DType, Device, Tensor};

/// Replaces the entries of `xs` where `mask` is zero with zeros.
///
/// `mask` is a `u8` tensor of the same shape as `xs`. The selection happens
/// element-wise, so values at masked-out positions, including `inf` and
/// `NaN`, reach neither the output nor the gradient of `xs`.
pub fn masked(xs: &Tensor, mask: &Tensor) -> Result<Tensor> {
    Ok(mask.where_cond(xs, &xs.zeros_like()?)?)
}

/// Converts a boolean mask to a `u8` tensor of shape `(mask.len(),)`.
pub fn mask_to_tensor(mask: &[bool], device: &Device) -> Result<Tensor> {
    let v = mask.iter().map(|&m| m as u8).collect::<Vec<_>>();
    Ok(Tensor::from_vec(v, (mask.len(),), device)?)
}

/// Global norm of a set of tensors, `sqrt(sum_i ||t_i||^2)`.
pub fn global_norm<'a>(ts: impl IntoIterator<Item = &'a Tensor>) -> Result<f32> {
    let mut sum_sq = 0f64;
    for t in ts {
        sum_sq += t
            .to_dtype(DType::F64)?
            .sqr()?
            .sum_all()?
            .to_scalar::<f64>()?;
    }
    Ok(sum_sq.sqrt() as f32)
}

/// Creates a tensor of shape `(v.len() / cols, cols)` from flat values.
pub fn vec_to_tensor2(v: &[f32], cols: usize, device: &Device) -> Result<Tensor> {
    let rows = if cols == 0 { 0 } else { v.len() / cols };
    Ok(Tensor::from_slice(v, (rows, cols), device)?)
}
