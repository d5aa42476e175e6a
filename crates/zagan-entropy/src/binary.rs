//! Binary arithmetic codec driven by a bit predictor.
//!
//! A classic carry-less arithmetic coder over 56-bit interval bounds. After
//! each bit the interval is split at the predictor's probability (12-bit
//! precision) and the settled top 32 bits are flushed whenever encoder and
//! decoder agree on them. The block is coded in chunks, each laid out as
//! `byte-count varint | final low (56 bits) | payload bytes`; below 64 MiB
//! the whole block is a single chunk.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Cancellation, Error, Result};

use crate::predictor::Predictor;
use crate::utils::{read_varint, write_varint};

const TOP: u64 = 0x00FF_FFFF_FFFF_FFFF;
const MASK_24_56: u64 = 0x00FF_FFFF_FF00_0000;
const MASK_0_24: u64 = 0x0000_0000_00FF_FFFF;
const MASK_0_32: u64 = 0x0000_0000_FFFF_FFFF;

fn chunk_length(count: usize) -> usize {
    if count >= 1 << 26 {
        // Big blocks are split to bound the staging buffer.
        if count < 1 << 29 {
            count >> 3
        } else {
            count >> 4
        }
    } else {
        count.max(64)
    }
}

/// Arithmetic encoder over a [`Predictor`].
pub struct BinaryEntropyEncoder<P: Predictor> {
    predictor: P,
    low: u64,
    high: u64,
    buffer: Vec<u8>,
    cancel: Cancellation,
}

impl<P: Predictor> BinaryEntropyEncoder<P> {
    pub fn new(predictor: P) -> Self {
        Self {
            predictor,
            low: 0,
            high: TOP,
            buffer: Vec::new(),
            cancel: Cancellation::new(),
        }
    }

    /// Attach a cancellation token checked between chunks.
    pub fn set_cancellation(&mut self, cancel: Cancellation) {
        self.cancel = cancel;
    }

    /// Encode `block` into the bit stream. Returns the input length.
    pub fn encode<W: Write>(&mut self, bs: &mut BitWriter<W>, block: &[u8]) -> Result<usize> {
        if block.len() >= 1 << 30 {
            return Err(Error::invalid_argument(format!(
                "invalid block size {} (max is 1<<30)",
                block.len()
            )));
        }

        if block.is_empty() {
            return Ok(0);
        }

        let length = chunk_length(block.len());

        for chunk in block.chunks(length) {
            self.cancel.check()?;
            self.low = 0;
            self.high = TOP;
            self.buffer.clear();

            for &b in chunk {
                self.encode_byte(b);
            }

            write_varint(bs, self.buffer.len() as u32)?;
            bs.write_bits(self.low | MASK_0_24, 56)?;
            bs.write_bytes(&self.buffer)?;
        }

        Ok(block.len())
    }

    #[inline]
    fn encode_byte(&mut self, val: u8) {
        let v = i32::from(val);
        self.encode_bit((v >> 7) & 1);
        self.encode_bit((v >> 6) & 1);
        self.encode_bit((v >> 5) & 1);
        self.encode_bit((v >> 4) & 1);
        self.encode_bit((v >> 3) & 1);
        self.encode_bit((v >> 2) & 1);
        self.encode_bit((v >> 1) & 1);
        self.encode_bit(v & 1);
    }

    #[inline]
    fn encode_bit(&mut self, bit: i32) {
        // Split the interval; written to maximize multiply precision.
        let split = (((self.high - self.low) >> 4) * self.predictor.get() as u64) >> 8;

        if bit == 0 {
            self.low += split + 1;
        } else {
            self.high = self.low + split;
        }

        self.predictor.update(bit);

        // Flush the settled top 32 bits.
        while (self.low ^ self.high) & MASK_24_56 == 0 {
            self.buffer
                .extend_from_slice(&((self.high >> 24) as u32).to_be_bytes());
            self.low = (self.low << 32) & TOP;
            self.high = ((self.high << 32) | MASK_0_32) & TOP;
        }
    }
}

/// Arithmetic decoder over a [`Predictor`].
pub struct BinaryEntropyDecoder<P: Predictor> {
    predictor: P,
    low: u64,
    high: u64,
    current: u64,
    stream: Vec<u8>,
    idx: usize,
    cancel: Cancellation,
}

impl<P: Predictor> BinaryEntropyDecoder<P> {
    pub fn new(predictor: P) -> Self {
        Self {
            predictor,
            low: 0,
            high: TOP,
            current: 0,
            stream: Vec::new(),
            idx: 0,
            cancel: Cancellation::new(),
        }
    }

    /// Attach a cancellation token checked between chunks.
    pub fn set_cancellation(&mut self, cancel: Cancellation) {
        self.cancel = cancel;
    }

    /// Decode `block.len()` bytes from the bit stream.
    pub fn decode<R: Read>(&mut self, bs: &mut BitReader<R>, block: &mut [u8]) -> Result<usize> {
        if block.len() >= 1 << 30 {
            return Err(Error::invalid_argument(format!(
                "invalid block size {} (max is 1<<30)",
                block.len()
            )));
        }

        if block.is_empty() {
            return Ok(0);
        }

        let length = chunk_length(block.len());

        for chunk in block.chunks_mut(length) {
            self.cancel.check()?;

            let n = read_varint(bs)? as usize;

            if n > chunk.len() * 2 + 64 {
                return Err(Error::invalid_format(format!(
                    "arithmetic chunk declares {n} bytes for {} output bytes",
                    chunk.len()
                )));
            }

            let tail = bs.read_bits(56)?;

            self.stream.clear();
            self.stream.resize(n, 0);
            bs.read_bytes(&mut self.stream)?;
            self.stream.extend_from_slice(&tail.to_be_bytes()[1..]);

            self.low = 0;
            self.high = TOP;
            self.current = u64::from_be_bytes([
                0,
                self.stream[0],
                self.stream[1],
                self.stream[2],
                self.stream[3],
                self.stream[4],
                self.stream[5],
                self.stream[6],
            ]);
            self.idx = 7;

            for out in chunk.iter_mut() {
                *out = self.decode_byte()?;
            }
        }

        Ok(block.len())
    }

    #[inline]
    fn decode_byte(&mut self) -> Result<u8> {
        let mut val = 0i32;

        for _ in 0..8 {
            val = (val << 1) | self.decode_bit()?;
        }

        Ok(val as u8)
    }

    #[inline]
    fn decode_bit(&mut self) -> Result<i32> {
        let split = self.low + ((((self.high - self.low) >> 4) * self.predictor.get() as u64) >> 8);

        let bit = if self.current <= split {
            self.high = split;
            1
        } else {
            self.low = split + 1;
            0
        };

        self.predictor.update(bit);

        while (self.low ^ self.high) & MASK_24_56 == 0 {
            self.low = (self.low << 32) & TOP;
            self.high = ((self.high << 32) | MASK_0_32) & TOP;

            if self.idx + 4 > self.stream.len() {
                return Err(Error::invalid_format("truncated arithmetic chunk"));
            }

            let next = u32::from_be_bytes(self.stream[self.idx..self.idx + 4].try_into().unwrap());
            self.current = ((self.current << 32) | u64::from(next)) & TOP;
            self.idx += 4;
        }

        Ok(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{CmPredictor, FpaqPredictor};
    use zagan_core::{BitReader, BitWriter};

    fn roundtrip_fpaq(data: &[u8]) -> Vec<u8> {
        let mut encoder = BinaryEntropyEncoder::new(FpaqPredictor::new());
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, data).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut decoder = BinaryEntropyDecoder::new(FpaqPredictor::new());
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; data.len()];
        decoder.decode(&mut reader, &mut out).unwrap();
        out
    }

    #[test]
    fn fpaq_roundtrip_text() {
        let data = b"compression is the art of counting expectations ".repeat(100);
        assert_eq!(roundtrip_fpaq(&data), data);
    }

    #[test]
    fn fpaq_roundtrip_all_bytes() {
        let data: Vec<u8> = (0u16..256).map(|i| i as u8).collect::<Vec<_>>().repeat(8);
        assert_eq!(roundtrip_fpaq(&data), data);
    }

    #[test]
    fn fpaq_roundtrip_tiny() {
        for len in 0..16usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 77) as u8).collect();
            assert_eq!(roundtrip_fpaq(&data), data, "len {len}");
        }
    }

    #[test]
    fn fpaq_compresses_biased_data() {
        let data = vec![0u8; 1 << 16];
        let mut encoder = BinaryEntropyEncoder::new(FpaqPredictor::new());
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, &data).unwrap();
        let bytes = writer.into_inner().unwrap();
        assert!(
            bytes.len() < data.len() / 20,
            "only reached {} bytes",
            bytes.len()
        );
    }

    #[test]
    fn cm_roundtrip() {
        let data = b"aaaabbbbccccddddeeee".repeat(300);
        let mut encoder = BinaryEntropyEncoder::new(CmPredictor::new());
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, &data).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut decoder = BinaryEntropyDecoder::new(CmPredictor::new());
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; data.len()];
        decoder.decode(&mut reader, &mut out).unwrap();
        assert_eq!(out, data);
    }
}
