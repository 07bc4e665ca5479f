//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum A3cError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// A recurrent policy received a batch without sequence lengths.
    #[error("Sequence lengths are required for a recurrent policy")]
    MissingSeqLens,

    /// GAE was requested without a value function.
    #[error("GAE requires a value function (use_critic = true)")]
    GaeWithoutCritic,

    /// A learning rate schedule without any endpoint.
    #[error("Learning rate schedule has no endpoints")]
    EmptySchedule,
}
