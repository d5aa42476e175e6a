//! Zero run-length transform.
//!
//! Tuned for post-BWT/MTF data where zeros dominate. A run of n zeros is
//! emitted as the binary digits of n+1 minus its leading one, one digit per
//! byte (so bytes 0 and 1 are reserved for run digits). Nonzero values are
//! shifted up by one; 0xFE and 0xFF are escaped behind an 0xFF prefix.
//! The transform fails on data it would expand.

use zagan_core::{ByteTransform, Error, Result};

/// Zero run-length transform.
#[derive(Debug, Default)]
pub struct Zrlt;

impl Zrlt {
    pub fn new() -> Self {
        Self
    }
}

impl ByteTransform for Zrlt {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let mut src_idx = 0;
        let mut dst_idx = 0;
        let dst_end = dst.len().min(src.len());

        while src_idx < src.len() {
            if src[src_idx] == 0 {
                let mut run = 1usize;

                while src_idx + run < src.len() && src[src_idx + run] == 0 {
                    run += 1;
                }

                src_idx += run;

                // Digits of run+1, most significant (implicit one) dropped.
                let value = (run + 1) as u32;
                let mut log2 = 31 - value.leading_zeros();

                if dst_idx + log2 as usize > dst_end {
                    return Err(Error::invalid_argument("data not compressible with ZRLT"));
                }

                while log2 > 0 {
                    log2 -= 1;
                    dst[dst_idx] = ((value >> log2) & 1) as u8;
                    dst_idx += 1;
                }

                continue;
            }

            let val = src[src_idx];
            let needed = if val >= 0xFE { 2 } else { 1 };

            if dst_idx + needed > dst_end {
                return Err(Error::invalid_argument("data not compressible with ZRLT"));
            }

            if val >= 0xFE {
                dst[dst_idx] = 0xFF;
                dst[dst_idx + 1] = val - 0xFE;
            } else {
                dst[dst_idx] = val + 1;
            }

            src_idx += 1;
            dst_idx += needed;
        }

        Ok((src_idx, dst_idx))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let mut src_idx = 0;
        let mut dst_idx = 0;

        while src_idx < src.len() {
            let val = src[src_idx];

            if val <= 1 {
                // Rebuild the run length from its digit bytes.
                let mut value = 1u64;

                while src_idx < src.len() && src[src_idx] <= 1 {
                    value = (value << 1) | u64::from(src[src_idx]);
                    src_idx += 1;

                    if value > (1 << 30) {
                        return Err(Error::invalid_format_at("zero run overflows", src_idx));
                    }
                }

                let run = (value - 1) as usize;

                if dst_idx + run > dst.len() {
                    return Err(Error::invalid_format_at(
                        "zero run exceeds output block",
                        src_idx,
                    ));
                }

                dst[dst_idx..dst_idx + run].fill(0);
                dst_idx += run;
                continue;
            }

            if dst_idx >= dst.len() {
                return Err(Error::invalid_format_at("output block overflow", src_idx));
            }

            if val == 0xFF {
                src_idx += 1;

                if src_idx >= src.len() {
                    return Err(Error::invalid_format_at("truncated escape", src_idx));
                }

                let payload = src[src_idx];

                if payload > 1 {
                    return Err(Error::invalid_format_at("invalid escape payload", src_idx));
                }

                dst[dst_idx] = 0xFE + payload;
            } else {
                dst[dst_idx] = val - 1;
            }

            src_idx += 1;
            dst_idx += 1;
        }

        Ok((src_idx, dst_idx))
    }
}
