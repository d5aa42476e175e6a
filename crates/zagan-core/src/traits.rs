//! The reversible byte transform contract.

use crate::error::Result;

/// A reversible byte-to-byte transform.
///
/// Forward and inverse both consume a source slice and fill a destination
/// slice, returning `(read, written)`. The invariant every implementation
/// upholds: for any input accepted by `forward`, applying `inverse` to the
/// forward output (with a destination large enough for the original data)
/// reproduces the input exactly.
///
/// Transforms take `&mut self` because several keep owned work buffers that
/// grow through a single resize path; none of them retain references into
/// the processed data.
pub trait ByteTransform {
    /// Apply the forward transform.
    ///
    /// Fails (without useful output) when the transform does not apply to
    /// this data, e.g. a run-length pass over run-free data or the text
    /// codec over binary data.
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)>;

    /// Apply the inverse transform. `dst` must be large enough for the
    /// original data; the framing layer knows that size.
    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)>;

    /// Worst-case forward output size for `src_len` input bytes.
    fn max_encoded_len(&self, src_len: usize) -> usize {
        src_len
    }
}
