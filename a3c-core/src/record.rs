//! Named values reported by a training step.
//!
//! Statistics of the A3C loss core (loss components, parameter and gradient
//! norms, explained variance) are returned as a [`Record`], a map from a
//! fixed set of names to [`RecordValue`]s. A record is produced once per
//! training step and handed to the caller; nothing in this workspace reads
//! it back.
//!
//! ```rust
//! use a3c_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("policy_loss", -0.25);
//! record.insert("vf_loss", RecordValue::Scalar(0.5));
//!
//! assert_eq!(record.get_scalar("vf_loss").unwrap(), 0.5);
//! ```
mod base;

pub use base::{Record, RecordValue};
