//! Validity masks over timesteps.
//!
//! Sequences of a recurrent policy have different lengths. They are padded
//! to the longest one so that they can be processed as a single tensor, and
//! a mask marks which positions hold real timesteps. The loss ignores every
//! position whose mask entry is `false`.
use crate::{error::A3cError, SampleBatch};

/// Builds a flat, sequence-major mask from sequence lengths.
///
/// Each sequence occupies a block of `max_seq_len` positions. The first
/// `seq_lens[i]` positions of block `i` are `true`, the rest are padding.
/// `max_seq_len` defaults to the largest entry of `seq_lens`.
///
/// A sequence of length zero gives an all-false block.
pub fn sequence_mask(seq_lens: &[usize], max_seq_len: Option<usize>) -> Vec<bool> {
    let max_seq_len =
        max_seq_len.unwrap_or_else(|| seq_lens.iter().copied().max().unwrap_or(0));

    seq_lens
        .iter()
        .flat_map(|&len| (0..max_seq_len).map(move |t| t < len))
        .collect()
}

/// Returns the validity mask of a batch of `n_timesteps` timesteps.
///
/// For a recurrent policy the mask is derived from `seq_lens`, with each
/// sequence padded to `n_timesteps / seq_lens.len()` positions (the largest
/// sequence length when the batch is padded to it). Otherwise every timestep
/// is valid and `seq_lens` is ignored.
pub fn valid_mask(
    n_timesteps: usize,
    seq_lens: Option<&[usize]>,
    is_recurrent: bool,
) -> Result<Vec<bool>, A3cError> {
    if is_recurrent {
        let seq_lens = seq_lens.ok_or(A3cError::MissingSeqLens)?;
        let max_seq_len = n_timesteps.checked_div(seq_lens.len()).unwrap_or(0);
        let mask = sequence_mask(seq_lens, Some(max_seq_len));
        log::trace!(
            "Mask for {} sequences, {} valid of {} timesteps",
            seq_lens.len(),
            mask.iter().filter(|m| **m).count(),
            mask.len()
        );
        Ok(mask)
    } else {
        Ok(vec![true; n_timesteps])
    }
}

/// [`valid_mask`] of a [`SampleBatch`].
pub fn batch_mask(batch: &SampleBatch, is_recurrent: bool) -> Result<Vec<bool>, A3cError> {
    valid_mask(batch.len(), batch.seq_lens.as_deref(), is_recurrent)
}
