//! Run-length transform with per-symbol compression flags.
//!
//! A first pass counts the run mass of each symbol and builds a 256-bit
//! flag map (32 bytes, emitted first): only flagged symbols get their runs
//! encoded, so rare accidental repeats of other symbols stay literal. A
//! run of a flagged symbol is emitted as `threshold` literals followed by
//! the remaining length in a 1/2/3-byte escape ladder.

use zagan_core::{ByteTransform, Error, Result};

const RUN_LEN_ENCODE1: usize = 224;
const RUN_LEN_ENCODE2: usize = (255 - RUN_LEN_ENCODE1) << 8;
const MAX_RUN: usize = 0xFFFF;

/// Run-length transform.
#[derive(Debug)]
pub struct Rlt {
    run_threshold: usize,
    flags: [u8; 32],
    counters: [i32; 256],
}

impl Rlt {
    /// Default threshold of 3: shorter repeats stay literal.
    pub fn new() -> Self {
        Self::with_threshold(3).unwrap()
    }

    /// `run_threshold` must be at least 2.
    pub fn with_threshold(run_threshold: usize) -> Result<Self> {
        if run_threshold < 2 {
            return Err(Error::invalid_argument(format!(
                "invalid run threshold {run_threshold} (must be at least 2)"
            )));
        }

        Ok(Self {
            run_threshold,
            flags: [0; 32],
            counters: [0; 256],
        })
    }

    fn emit_run_length(dst: &mut [u8], mut dst_idx: usize, mut run: usize) -> Result<usize> {
        if run >= RUN_LEN_ENCODE1 {
            if run < RUN_LEN_ENCODE2 {
                run -= RUN_LEN_ENCODE1;
                Self::push(dst, &mut dst_idx, (RUN_LEN_ENCODE1 + (run >> 8)) as u8)?;
            } else {
                run -= RUN_LEN_ENCODE2;
                Self::push(dst, &mut dst_idx, 0xFF)?;
                Self::push(dst, &mut dst_idx, (run >> 8) as u8)?;
            }
        }

        Self::push(dst, &mut dst_idx, run as u8)?;
        Ok(dst_idx)
    }

    #[inline]
    fn push(dst: &mut [u8], dst_idx: &mut usize, val: u8) -> Result<()> {
        if *dst_idx >= dst.len() {
            return Err(Error::invalid_argument("data not compressible with RLT"));
        }

        dst[*dst_idx] = val;
        *dst_idx += 1;
        Ok(())
    }
}

impl Default for Rlt {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteTransform for Rlt {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        if src.is_empty() {
            return Ok((0, 0));
        }

        if dst.len() < self.max_encoded_len(src.len()).min(src.len() + 32) {
            return Err(Error::invalid_argument(format!(
                "output buffer too small: {} < {}",
                dst.len(),
                src.len() + 32
            )));
        }

        self.flags = [0; 32];
        self.counters = [0; 256];

        let threshold = self.run_threshold;
        let max_run = MAX_RUN + threshold;

        // Pass 1: measure the run mass per symbol and set the flags.
        let mut prev = !src[0];
        let mut run = 0usize;

        for &val in src {
            if prev == val && run < MAX_RUN {
                run += 1;
                continue;
            }

            if run >= threshold {
                self.counters[prev as usize] += (run - threshold) as i32 - 1;
            }

            prev = val;
            run = 1;
        }

        if run >= threshold {
            self.counters[prev as usize] += (run - threshold) as i32 - 1;
        }

        for i in 0..256 {
            if self.counters[i] > 0 {
                self.flags[i >> 3] |= 1 << (7 - (i & 7));
            }
        }

        let mut dst_idx = 0;

        for &flag in &self.flags {
            Self::push(dst, &mut dst_idx, flag)?;
        }

        // Pass 2: literals, with flagged runs collapsed past the threshold.
        let mut prev = !src[0];
        let mut run = 0usize;

        for &val in src {
            if prev == val && run < max_run && self.counters[prev as usize] > 0 {
                run += 1;

                if run < threshold {
                    Self::push(dst, &mut dst_idx, prev)?;
                }

                continue;
            }

            if run >= threshold {
                Self::push(dst, &mut dst_idx, prev)?;
                dst_idx = Self::emit_run_length(dst, dst_idx, run - threshold)?;
            }

            Self::push(dst, &mut dst_idx, val)?;
            prev = val;
            run = 1;
        }

        if run >= threshold {
            Self::push(dst, &mut dst_idx, prev)?;
            dst_idx = Self::emit_run_length(dst, dst_idx, run - threshold)?;
        }

        Ok((src.len(), dst_idx))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        if src.is_empty() {
            return Ok((0, 0));
        }

        if src.len() < 32 {
            return Err(Error::invalid_format("RLT block shorter than its flag map"));
        }

        let threshold = self.run_threshold;
        let max_run = MAX_RUN + threshold;
        let mut src_idx = 0;

        for i in 0..32 {
            let flag = src[src_idx];
            src_idx += 1;
            self.flags[i] = flag;

            for j in 0..8 {
                self.counters[(i << 3) + j] = i32::from((flag >> (7 - j)) & 1);
            }
        }

        if src_idx >= src.len() {
            return Ok((src_idx, 0));
        }

        let mut dst_idx = 0;
        let mut prev = !src[src_idx];
        let mut run = 0usize;

        while src_idx < src.len() {
            let val = src[src_idx];
            src_idx += 1;

            if prev == val && self.counters[prev as usize] > 0 {
                run += 1;

                if run >= threshold {
                    // Decode the remaining run length.
                    if src_idx >= src.len() {
                        return Err(Error::invalid_format_at("truncated run length", src_idx));
                    }

                    let first = src[src_idx] as usize;
                    src_idx += 1;

                    let mut extra = if first == 0xFF {
                        if src_idx + 2 > src.len() {
                            return Err(Error::invalid_format_at("truncated run length", src_idx));
                        }

                        let hi = src[src_idx] as usize;
                        let lo = src[src_idx + 1] as usize;
                        src_idx += 2;
                        ((hi << 8) | lo) + RUN_LEN_ENCODE2
                    } else if first >= RUN_LEN_ENCODE1 {
                        if src_idx >= src.len() {
                            return Err(Error::invalid_format_at("truncated run length", src_idx));
                        }

                        let lo = src[src_idx] as usize;
                        src_idx += 1;
                        ((first - RUN_LEN_ENCODE1) << 8) + lo + RUN_LEN_ENCODE1
                    } else {
                        first
                    };

                    if run + extra > max_run || dst_idx + extra > dst.len() {
                        return Err(Error::invalid_format_at("invalid run length", src_idx));
                    }

                    while extra > 0 {
                        dst[dst_idx] = prev;
                        dst_idx += 1;
                        extra -= 1;
                    }

                    run = 0;
                }
            } else {
                prev = val;
                run = 1;
            }

            if dst_idx >= dst.len() {
                return Err(Error::invalid_format_at("output block overflow", src_idx));
            }

            dst[dst_idx] = val;
            dst_idx += 1;
        }

        Ok((src_idx, dst_idx))
    }

    fn max_encoded_len(&self, src_len: usize) -> usize {
        src_len + 32
    }
}
