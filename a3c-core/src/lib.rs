#![warn(missing_docs)]
//! Backend-agnostic building blocks of the A3C loss core.
//!
//! This crate holds the parts of an actor-critic training step that do not
//! depend on a tensor backend:
//!
//! * [`SampleBatch`] - a collected, advantage-annotated trajectory batch
//! * [`mask`] - validity masks over (possibly padded) timesteps
//! * [`postprocessing`] - advantage and value-target computation
//! * [`schedule`] - learning-rate schedule descriptions
//! * [`record`] - named statistics produced by a training step
pub mod error;
pub mod mask;
pub mod postprocessing;
pub mod record;
pub mod schedule;

mod batch;
pub use batch::SampleBatch;
