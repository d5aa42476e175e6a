//! Identity transform.

use zagan_core::{ByteTransform, Error, Result};

/// The null transform: a straight copy. It keeps the pipeline total when a
/// type word contains no real transforms.
#[derive(Debug, Default)]
pub struct NullTransform;

impl NullTransform {
    pub fn new() -> Self {
        Self
    }

    fn copy(src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        if dst.len() < src.len() {
            return Err(Error::invalid_argument(format!(
                "output buffer too small: {} < {}",
                dst.len(),
                src.len()
            )));
        }

        dst[..src.len()].copy_from_slice(src);
        Ok((src.len(), src.len()))
    }
}

impl ByteTransform for NullTransform {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        Self::copy(src, dst)
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        Self::copy(src, dst)
    }
}
