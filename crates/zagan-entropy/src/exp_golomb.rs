//! Exp-Golomb byte-oriented code.
//!
//! Unsigned grammar: a value of 0 is the single bit `1`; otherwise, with
//! `L = floor(log2(v + 1))`, the code is `v + 1` written in `2L + 1` bits
//! (L leading zeros, the marker bit, then the low L bits). The signed
//! variant appends one sign bit to nonzero magnitudes and reconstructs via
//! `(res - sgn) ^ -sgn`. The shortest-prefix property follows from the
//! grammar: each length class covers a dyadic value range exactly once.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Result};

/// Exp-Golomb encoder. `signed` selects the signed byte grammar.
pub struct ExpGolombEncoder {
    signed: bool,
}

impl ExpGolombEncoder {
    pub fn new(signed: bool) -> Self {
        Self { signed }
    }

    /// Encode one byte.
    pub fn encode_byte<W: Write>(&self, bs: &mut BitWriter<W>, val: u8) -> Result<()> {
        if val == 0 {
            return bs.write_bit(1);
        }

        if self.signed {
            let v = i32::from(val as i8);
            let sgn = (v < 0) as u32;
            let mag = v.unsigned_abs();
            let log2 = 31 - (mag + 1).leading_zeros();
            // L zeros, marker, low bits of mag+1, then the sign bit.
            bs.write_bits(u64::from(((mag + 1) << 1) | sgn), 2 * log2 + 2)
        } else {
            let v = u32::from(val);
            let log2 = 31 - (v + 1).leading_zeros();
            bs.write_bits(u64::from(v + 1), 2 * log2 + 1)
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

/// Exp-Golomb decoder.
pub struct ExpGolombDecoder {
    signed: bool,
}

impl ExpGolombDecoder {
    pub fn new(signed: bool) -> Self {
        Self { signed }
    }

    /// Decode one byte.
    pub fn decode_byte<R: Read>(&self, bs: &mut BitReader<R>) -> Result<u8> {
        if bs.read_bit()? == 1 {
            return Ok(0);
        }

        let mut log2 = 1u32;

        while bs.read_bit()? == 0 {
            log2 += 1;
        }

        if self.signed {
            // Value bits plus trailing sign.
            let res = bs.read_bits(log2 + 1)? as u32;
            let sgn = res & 1;
            let mag = (res >> 1) + (1 << log2) - 1;
            Ok((mag.wrapping_sub(sgn) ^ sgn.wrapping_neg()) as u8)
        } else {
            let low = bs.read_bits(log2)? as u32;
            Ok(((1 << log2) - 1 + low) as u8)
        }
    }

    /// Decode a whole block. The loop is unrolled by 8, matching the
    /// encoder's byte-oriented framing.
    pub fn decode<R: Read>(&self, bs: &mut BitReader<R>, block: &mut [u8]) -> Result<usize> {
        let len8 = block.len() & !7;
        let mut i = 0;

        while i < len8 {
            block[i] = self.decode_byte(bs)?;
            block[i + 1] = self.decode_byte(bs)?;
            block[i + 2] = self.decode_byte(bs)?;
            block[i + 3] = self.decode_byte(bs)?;
            block[i + 4] = self.decode_byte(bs)?;
            block[i + 5] = self.decode_byte(bs)?;
            block[i + 6] = self.decode_byte(bs)?;
            block[i + 7] = self.decode_byte(bs)?;
            i += 8;
        }

        while i < block.len() {
            block[i] = self.decode_byte(bs)?;
            i += 1;
        }

        Ok(block.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zagan_core::{BitReader, BitWriter};

    fn roundtrip(signed: bool, data: &[u8]) -> Vec<u8> {
        let encoder = ExpGolombEncoder::new(signed);
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, data).unwrap();
        let bytes = writer.into_inner().unwrap();

        let decoder = ExpGolombDecoder::new(signed);
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; data.len()];
        decoder.decode(&mut reader, &mut out).unwrap();
        out
    }

    #[test]
    fn unsigned_all_values_roundtrip() {
        let data: Vec<u8> = (0u16..256).map(|i| i as u8).collect();
        assert_eq!(roundtrip(false, &data), data);
    }

    #[test]
    fn signed_all_values_roundtrip() {
        let data: Vec<u8> = (0u16..256).map(|i| i as u8).collect();
        assert_eq!(roundtrip(true, &data), data);
    }

    #[test]
    fn zero_is_one_bit() {
        let encoder = ExpGolombEncoder::new(false);
        let mut writer = BitWriter::new(Vec::new());

        for _ in 0..8 {
            encoder.encode_byte(&mut writer, 0).unwrap();
        }

        assert_eq!(writer.bits_written(), 8);
        let bytes = writer.into_inner().unwrap();
        assert_eq!(bytes, vec![0xFF]);
    }

    #[test]
    fn code_lengths_follow_the_grammar() {
        // v in [2^L - 1, 2^(L+1) - 2] takes 2L + 1 bits.
        let encoder = ExpGolombEncoder::new(false);

        for (v, expected) in [(0u8, 1u64), (1, 3), (2, 3), (3, 5), (6, 5), (7, 7), (255, 17)] {
            let mut writer = BitWriter::new(Vec::new());
            encoder.encode_byte(&mut writer, v).unwrap();
            assert_eq!(writer.bits_written(), expected, "value {v}");
        }
    }

    #[test]
    fn signed_extreme_magnitude() {
        // -128 has no positive i8 counterpart; the two's-complement
        // reconstruction must still land on 0x80.
        assert_eq!(roundtrip(true, &[0x80]), vec![0x80]);
        assert_eq!(roundtrip(true, &[0x7F, 0x81, 0x01, 0xFF]), vec![0x7F, 0x81, 0x01, 0xFF]);
    }

    #[test]
    fn long_block_roundtrip() {
        let data: Vec<u8> = (0u32..10_000).map(|i| (i * 31 % 256) as u8).collect();
        assert_eq!(roundtrip(false, &data), data);
        assert_eq!(roundtrip(true, &data), data);
    }
}
