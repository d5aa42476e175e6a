//! Sorted-by-rank transform.
//!
//! A family of rank transforms over one mask/shift parameterization:
//! move-to-front (rank by last occurrence), rank (average of position and
//! last occurrence) and timestamp (last occurrence only). Symbols are
//! emitted as their current rank and then bubbled up to the position their
//! updated key earns.

use zagan_core::{ByteTransform, Error, Result};

/// Ranking discipline for [`Sbrt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbrtMode {
    /// Pure move-to-front.
    Mtf,
    /// Rank by halved sum of previous position and current position.
    Rank,
    /// Rank by most recent position.
    Timestamp,
}

/// Sorted-by-rank transform.
#[derive(Debug)]
pub struct Sbrt {
    mask1: i32,
    mask2: i32,
    shift: u32,
}

impl Sbrt {
    pub fn new(mode: SbrtMode) -> Self {
        Self {
            mask1: if mode == SbrtMode::Timestamp { 0 } else { -1 },
            mask2: if mode == SbrtMode::Mtf { 0 } else { -1 },
            shift: if mode == SbrtMode::Rank { 1 } else { 0 },
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

impl ByteTransform for Sbrt {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        Self::check_sizes(src, dst)?;

        let mut p = [0i32; 256]; // previous position per symbol
        let mut q = [0i32; 256]; // current rank key per symbol
        let mut s2r = [0u8; 256];
        let mut r2s = [0u8; 256];

        for i in 0..256 {
            s2r[i] = i as u8;
            r2s[i] = i as u8;
        }

        for (i, &b) in src.iter().enumerate() {
            let c = b as usize;
            let mut r = s2r[c] as usize;
            dst[i] = r as u8;
            let qc = ((i as i32 & self.mask1) + (p[c] & self.mask2)) >> self.shift;
            p[c] = i as i32;
            q[c] = qc;

            // Bubble the symbol up to the rank its key earns.
            while r > 0 && q[r2s[r - 1] as usize] <= qc {
                r2s[r] = r2s[r - 1];
                s2r[r2s[r] as usize] = r as u8;
                r -= 1;
            }

            r2s[r] = c as u8;
            s2r[c] = r as u8;
        }

        Ok((src.len(), src.len()))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        Self::check_sizes(src, dst)?;

        let mut p = [0i32; 256];
        let mut q = [0i32; 256];
        let mut r2s = [0u8; 256];

        for i in 0..256 {
            r2s[i] = i as u8;
        }

        for (i, &rank) in src.iter().enumerate() {
            let mut r = rank as usize;
            let c = r2s[r] as usize;
            dst[i] = c as u8;
            let qc = ((i as i32 & self.mask1) + (p[c] & self.mask2)) >> self.shift;
            p[c] = i as i32;
            q[c] = qc;

            while r > 0 && q[r2s[r - 1] as usize] <= qc {
                r2s[r] = r2s[r - 1];
                r -= 1;
            }

            r2s[r] = c as u8;
        }

        Ok((src.len(), src.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(mode: SbrtMode, data: &[u8]) -> Vec<u8> {
        let mut t = Sbrt::new(mode);
        let mut mid = vec![0u8; data.len()];
        t.forward(data, &mut mid).unwrap();
        let mut t2 = Sbrt::new(mode);
        let mut out = vec![0u8; data.len()];
        t2.inverse(&mid, &mut out).unwrap();
        out
    }

    #[test]
    fn all_modes_roundtrip() {
        let data = b"sort by rank, sort by time, sort by front".repeat(40);

        for mode in [SbrtMode::Mtf, SbrtMode::Rank, SbrtMode::Timestamp] {
            assert_eq!(roundtrip(mode, &data), data, "{mode:?}");
        }
    }

    #[test]
    fn all_byte_values_roundtrip() {
        let data: Vec<u8> = (0u16..256).map(|i| i as u8).collect::<Vec<_>>().repeat(16);

        for mode in [SbrtMode::Mtf, SbrtMode::Rank, SbrtMode::Timestamp] {
            assert_eq!(roundtrip(mode, &data), data, "{mode:?}");
        }
    }

    #[test]
    fn rank_mode_favors_frequent_symbols() {
        // After a long training prefix, the dominant symbol should map to
        // rank 0 even when another byte appeared more recently.
        let mut data = Vec::new();

        for _ in 0..200 {
            data.extend_from_slice(b"eeee eee ee");
        }

        let mut t = Sbrt::new(SbrtMode::Rank);
        let mut out = vec![0u8; data.len()];
        t.forward(&data, &mut out).unwrap();
        let zeros = out.iter().filter(|&&r| r == 0).count();
        assert!(zeros > data.len() / 2);
    }
}
