use crate::util::global_norm;
use anyhow::Result;
use candle_core::{backprop::GradStore, Tensor, Var};

/// Gradients of a loss with respect to trainable variables after clipping.
pub struct ClippedGradients {
    grads: GradStore,
    pairs: Vec<(Var, Tensor)>,
    global_norm: f32,
}

impl ClippedGradients {
    /// Pairs of a variable and its (clipped) gradient.
    ///
    /// Variables that do not receive a gradient from the loss are absent.
    pub fn iter(&self) -> impl Iterator<Item = &(Var, Tensor)> {
        self.pairs.iter()
    }

    /// Gradients in the form consumed by [`Optimizer::step`](crate::opt::Optimizer::step).
    pub fn grad_store(&self) -> &GradStore {
        &self.grads
    }

    /// Global norm of the gradients before clipping.
    pub fn global_norm(&self) -> f32 {
        self.global_norm
    }

    /// Global norm of the gradients after clipping.
    pub fn clipped_norm(&self) -> Result<f32> {
        global_norm(self.pairs.iter().map(|(_, g)| g))
    }

    /// Number of variables with a gradient.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no variable receives a gradient.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Differentiates `loss` with respect to `vars` and clips the gradients by
/// their global norm.
///
/// If the global norm exceeds `grad_clip`, every gradient is multiplied by
/// `grad_clip / global_norm`. Otherwise the gradients are returned as they
/// are.
pub fn clip_gradients(loss: &Tensor, vars: &[Var], grad_clip: f64) -> Result<ClippedGradients> {
    let mut grads = loss.backward()?;
    let pairs = vars
        .iter()
        .filter_map(|var| grads.get(var.as_tensor()).map(|g| (var.clone(), g.clone())))
        .collect::<Vec<_>>();
    let norm = global_norm(pairs.iter().map(|(_, g)| g))?;

    let pairs = if norm as f64 > grad_clip {
        let scale = grad_clip / norm as f64;
        log::trace!("Clip gradients, global norm = {}, scale = {}", norm, scale);
        pairs
            .into_iter()
            .map(|(var, g)| -> Result<(Var, Tensor)> {
                let g = (g * scale)?;
                grads.insert(var.as_tensor(), g.clone());
                Ok((var, g))
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        pairs
    };

    Ok(ClippedGradients {
        grads,
        pairs,
        global_norm: norm,
    })
}
