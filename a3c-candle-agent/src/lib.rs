//! A3C loss core implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The entry point is [`a3c::A3c`], which owns a model implementing
//! [`model::ActorCriticModel`], its parameters and an optimizer, and runs a
//! training step on an advantage-annotated [`a3c_core::SampleBatch`]:
//! masking, loss evaluation, gradient clipping and statistics.
pub mod a3c;
pub mod dist;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use candle_core::DeviceLocation;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// A CUDA device with the given ordinal.
    Cuda(usize),

    /// A Metal device with the given ordinal.
    Metal(usize),
}

impl From<&candle_core::Device> for Device {
    fn from(device: &candle_core::Device) -> Self {
        match device.location() {
            DeviceLocation::Cpu => Self::Cpu,
            DeviceLocation::Cuda { gpu_id } => Self::Cuda(gpu_id),
            DeviceLocation::Metal { gpu_id } => Self::Metal(gpu_id),
        }
    }
}

impl Device {
    /// Creates the corresponding [`candle_core::Device`].
    pub fn build(self) -> candle_core::Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => candle_core::Device::new_cuda(n),
            Self::Metal(n) => candle_core::Device::new_metal(n),
        }
    }
}
