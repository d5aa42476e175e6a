//! Rice-Golomb byte-oriented code.
//!
//! A Golomb code with a power-of-two divisor: the quotient `v >> log_base`
//! is sent unary (zeros terminated by a one), followed by `log_base`
//! remainder bits. The signed variant appends one sign bit to nonzero
//! magnitudes; zero never carries a sign.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Error, Result};

fn validate_log_base(log_base: u32) -> Result<()> {
    if !(1..=12).contains(&log_base) {
        return Err(Error::invalid_argument(format!(
            "invalid log base: {log_base} (must be in [1..12])"
        )));
    }

    Ok(())
}

/// Rice-Golomb encoder with divisor `1 << log_base`.
pub struct RiceGolombEncoder {
    signed: bool,
    log_base: u32,
    base: u32,
}

impl RiceGolombEncoder {
    /// `log_base` must be in `[1, 12]`.
    pub fn new(signed: bool, log_base: u32) -> Result<Self> {
        validate_log_base(log_base)?;

        Ok(Self {
            signed,
            log_base,
            base: 1 << log_base,
        })
    }

    /// Encode one byte.
    pub fn encode_byte<W: Write>(&self, bs: &mut BitWriter<W>, val: u8) -> Result<()> {
        let (sgn, mag) = if self.signed {
            let v = i32::from(val as i8);
            ((v < 0) as u64, v.unsigned_abs())
        } else {
            (0, u32::from(val))
        };

        // One field: q leading zeros, the terminating one (the base bit),
        // the remainder, and for signed nonzero values a trailing sign.
        let q = mag >> self.log_base;
        let mut emit = u64::from(self.base | (mag & (self.base - 1)));
        let mut n = q + self.log_base + 1;

        if self.signed && mag != 0 {
            emit = (emit << 1) | sgn;
            n += 1;
        }

        if n <= 64 {
            bs.write_bits(emit, n)
        } else {
            bs.write_bits(0, n - 64)?;
            bs.write_bits(emit, 64)
        }
    }

    /// Encode a whole block.
    pub fn encode<W: Write>(&self, bs: &mut BitWriter<W>, block: &[u8]) -> Result<usize> {
        for &b in block {
            self.encode_byte(bs, b)?;
        }

        Ok(block.len())
    }
}

/// Rice-Golomb decoder.
pub struct RiceGolombDecoder {
    signed: bool,
    log_base: u32,
}

impl RiceGolombDecoder {
    /// `log_base` must match the encoder.
    pub fn new(signed: bool, log_base: u32) -> Result<Self> {
        validate_log_base(log_base)?;
        Ok(Self { signed, log_base })
    }

    /// Decode one byte.
    pub fn decode_byte<R: Read>(&self, bs: &mut BitReader<R>) -> Result<u8> {
        let mut q = 0u32;

        while bs.read_bit()? == 0 {
            q += 1;

            if q > 256 {
                return Err(Error::invalid_format("runaway Rice-Golomb quotient"));
            }
        }

        let r = bs.read_bits(self.log_base)? as u32;
        let mag = (q << self.log_base) | r;

        if !self.signed || mag == 0 {
            return Ok(mag as u8);
        }

        if bs.read_bit()? == 1 {
            Ok((mag as u8).wrapping_neg())
        } else {
            Ok(mag as u8)
        }
    }

    /// Decode a whole block.
    pub fn decode<R: Read>(&self, bs: &mut BitReader<R>, block: &mut [u8]) -> Result<usize> {
        for b in block.iter_mut() {
            *b = self.decode_byte(bs)?;
        }

        Ok(block.len())
    }
}
