//! Move-to-front transform.
//!
//! Forward replaces each byte with its rank in a recency list and moves it
//! to the front; inverse indexes the same list. Runs of identical bytes
//! become runs of zeros, which pairs naturally with the zero run-length
//! transform after a BWT.

use zagan_core::{ByteTransform, Error, Result};

/// Move-to-front transform over a 256-entry recency list.
#[derive(Debug)]
pub struct Mtft {
    ranks: [u8; 256],
}

impl Mtft {
    pub fn new() -> Self {
        let mut ranks = [0u8; 256];

        for (i, r) in ranks.iter_mut().enumerate() {
            *r = i as u8;
        }

        Self { ranks }
    }

    fn reset(&mut self) {
        for (i, r) in self.ranks.iter_mut().enumerate() {
            *r = i as u8;
        }
    }

    fn check_sizes(src: &[u8], dst: &[u8]) -> Result<()> {
        if dst.len() < src.len() {
            return Err(Error::invalid_argument(format!(
                "output buffer too small: {} < {}",
                dst.len(),
                src.len()
            )));
        }

        Ok(())
    }
}

impl Default for Mtft {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteTransform for Mtft {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        Self::check_sizes(src, dst)?;
        self.reset();

        for (i, &b) in src.iter().enumerate() {
            // Rank lookup, then shift the prefix down by one.
            let rank = self.ranks.iter().position(|&s| s == b).unwrap();
            dst[i] = rank as u8;
            self.ranks.copy_within(0..rank, 1);
            self.ranks[0] = b;
        }

        Ok((src.len(), src.len()))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        Self::check_sizes(src, dst)?;
        self.reset();

        for (i, &r) in src.iter().enumerate() {
            let rank = r as usize;
            let b = self.ranks[rank];
            dst[i] = b;
            self.ranks.copy_within(0..rank, 1);
            self.ranks[0] = b;
        }

        Ok((src.len(), src.len()))
    }
}
