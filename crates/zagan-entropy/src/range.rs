//! Order-0 range codec.
//!
//! A 64-bit carry-less range coder (Subbotin style): top bytes are emitted
//! as soon as they settle, and interval underflow is resolved by snapping
//! the range to the next alignment boundary, which both sides do
//! identically. Chunking and the alphabet/frequency header are shared with
//! the ANS codec, so the statistics side of the wire format is uniform
//! across the range-based coders.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Cancellation, Error, Result};

use crate::histogram::{histogram_order0, FREQ_ROW};
use crate::utils::{
    decode_frequencies, encode_frequencies, normalize_frequencies, read_varint, write_varint,
};

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 1 << 27;

/// Default chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 15;

/// Default frequency precision.
pub const DEFAULT_LOG_RANGE: u32 = 12;

const TOP_MASK: u64 = 0xFF00_0000_0000_0000;
const BOTTOM: u64 = 1 << 16;

fn validate_params(chunk_size: Option<usize>, log_range: u32) -> Result<usize> {
    if !(8..=14).contains(&log_range) {
        return Err(Error::invalid_argument(format!(
            "range codec: invalid range {log_range} (must be in [8..14])"
        )));
    }

    match chunk_size {
        None => Ok(DEFAULT_CHUNK_SIZE),
        Some(0) => Ok(0),
        Some(sz) if sz < 1024 => Err(Error::invalid_argument(format!(
            "range codec: chunk size {sz} is below the 1024 byte minimum"
        ))),
        Some(sz) if sz > MAX_CHUNK_SIZE => Err(Error::invalid_argument(format!(
            "range codec: chunk size {sz} exceeds {MAX_CHUNK_SIZE}"
        ))),
        Some(sz) => Ok(sz),
    }
}

/// Range encoder.
pub struct RangeEncoder {
    chunk_size: usize,
    log_range: u32,
    low: u64,
    range: u64,
    freqs: Vec<u32>,
    cum_freqs: [u32; 257],
    alphabet: [u8; 256],
    buffer: Vec<u8>,
    cancel: Cancellation,
}

impl RangeEncoder {
    /// `chunk_size` of `None` selects the default; `Some(0)` uses a single
    /// chunk for the whole block.
    pub fn new(chunk_size: Option<usize>, log_range: u32) -> Result<Self> {
        let chunk_size = validate_params(chunk_size, log_range)?;

        Ok(Self {
            chunk_size,
            log_range,
            low: 0,
            range: u64::MAX,
            freqs: vec![0; FREQ_ROW],
            cum_freqs: [0; 257],
            alphabet: [0; 256],
            buffer: Vec::new(),
            cancel: Cancellation::new(),
        })
    }

    /// Attach a cancellation token checked between chunks.
    pub fn set_cancellation(&mut self, cancel: Cancellation) {
        self.cancel = cancel;
    }

    /// Encode `block` into the bit stream. Returns the input length.
    pub fn encode<W: Write>(&mut self, bs: &mut BitWriter<W>, block: &[u8]) -> Result<usize> {
        if block.is_empty() {
            return Ok(0);
        }

        let sz = if self.chunk_size == 0 {
            block.len().min(MAX_CHUNK_SIZE)
        } else {
            self.chunk_size
        };

        for chunk in block.chunks(sz) {
            self.cancel.check()?;

            let mut lr = self.log_range;

            while lr > 8 && (1usize << lr) > chunk.len() {
                lr -= 1;
            }

            histogram_order0(chunk, &mut self.freqs);
            let total = self.freqs[256];
            let count =
                normalize_frequencies(&mut self.freqs, &mut self.alphabet, total, 1 << lr)?;

            self.cum_freqs[0] = 0;

            for i in 0..256 {
                self.cum_freqs[i + 1] = self.cum_freqs[i] + self.freqs[i];
            }

            bs.write_bits(u64::from(lr - 8), 3)?;
            encode_frequencies(bs, &self.alphabet[..count], &self.freqs, lr)?;

            self.low = 0;
            self.range = u64::MAX;
            self.buffer.clear();

            for &b in chunk {
                self.encode_byte(b, lr);
            }

            // Flush: the final low is the code tail.
            for _ in 0..8 {
                self.buffer.push((self.low >> 56) as u8);
                self.low <<= 8;
            }

            write_varint(bs, self.buffer.len() as u32)?;
            bs.write_bytes(&self.buffer)?;
        }

        Ok(block.len())
    }

    #[inline]
    fn encode_byte(&mut self, b: u8, lr: u32) {
        let s = usize::from(b);
        let r = self.range >> lr;
        self.low = self.low.wrapping_add(r * u64::from(self.cum_freqs[s]));
        self.range = r * u64::from(self.freqs[s]);

        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) & TOP_MASK != 0 {
                if self.range >= BOTTOM {
                    break;
                }

                // Underflow: snap the range to the next boundary.
                self.range = BOTTOM - (self.low & (BOTTOM - 1));
            }

            self.buffer.push((self.low >> 56) as u8);
            self.low <<= 8;
            self.range <<= 8;
        }
    }
}

/// Range decoder.
pub struct RangeDecoder {
    chunk_size: usize,
    low: u64,
    range: u64,
    code: u64,
    freqs: Vec<u32>,
    cum_freqs: [u32; 257],
    alphabet: [u8; 256],
    f2s: Vec<u8>,
    buffer: Vec<u8>,
    idx: usize,
    cancel: Cancellation,
}

impl RangeDecoder {
    /// `chunk_size` must match the encoder.
    pub fn new(chunk_size: Option<usize>) -> Result<Self> {
        let chunk_size = validate_params(chunk_size, DEFAULT_LOG_RANGE)?;

        Ok(Self {
            chunk_size,
            low: 0,
            range: u64::MAX,
            code: 0,
            freqs: vec![0; FREQ_ROW],
            cum_freqs: [0; 257],
            alphabet: [0; 256],
            f2s: Vec::new(),
            buffer: Vec::new(),
            idx: 0,
            cancel: Cancellation::new(),
        })
    }

    /// Attach a cancellation token checked between chunks.
    pub fn set_cancellation(&mut self, cancel: Cancellation) {
        self.cancel = cancel;
    }

    /// Decode `block.len()` bytes from the bit stream.
    pub fn decode<R: Read>(&mut self, bs: &mut BitReader<R>, block: &mut [u8]) -> Result<usize> {
        if block.is_empty() {
            return Ok(0);
        }

        let len = block.len();
        let sz = if self.chunk_size == 0 {
            len.min(MAX_CHUNK_SIZE)
        } else {
            self.chunk_size
        };

        for chunk in block.chunks_mut(sz) {
            self.cancel.check()?;

            let lr = bs.read_bits(3)? as u32 + 8;
            let count = decode_frequencies(bs, &mut self.alphabet, &mut self.freqs, lr)?;

            if count == 0 {
                return Err(Error::invalid_format("empty range coder alphabet"));
            }

            self.cum_freqs[0] = 0;

            for i in 0..256 {
                self.cum_freqs[i + 1] = self.cum_freqs[i] + self.freqs[i];
            }

            if self.f2s.len() < 1 << lr {
                self.f2s.resize(1 << lr, 0);
            }

            for &s in &self.alphabet[..count] {
                let base = self.cum_freqs[usize::from(s)] as usize;
                let freq = self.freqs[usize::from(s)] as usize;
                self.f2s[base..base + freq].fill(s);
            }

            let n = read_varint(bs)? as usize;

            if n > chunk.len() * 4 + 64 {
                return Err(Error::invalid_format(format!(
                    "range chunk declares {n} bytes for {} output bytes",
                    chunk.len()
                )));
            }

            if n < 8 {
                return Err(Error::invalid_format("truncated range coder chunk"));
            }

            self.buffer.resize(n, 0);
            bs.read_bytes(&mut self.buffer)?;
            self.code = u64::from_be_bytes(self.buffer[..8].try_into().unwrap());
            self.idx = 8;
            self.low = 0;
            self.range = u64::MAX;

            for out in chunk.iter_mut() {
                *out = self.decode_byte(lr)?;
            }
        }

        Ok(len)
    }

    #[inline]
    fn decode_byte(&mut self, lr: u32) -> Result<u8> {
        let r = self.range >> lr;
        let slot = (self.code.wrapping_sub(self.low) / r).min((1 << lr) - 1);
        let s = self.f2s[slot as usize];
        let sym = usize::from(s);

        self.low = self.low.wrapping_add(r * u64::from(self.cum_freqs[sym]));
        self.range = r * u64::from(self.freqs[sym]);

        loop {
            if (self.low ^ self.low.wrapping_add(self.range)) & TOP_MASK != 0 {
                if self.range >= BOTTOM {
                    break;
                }

                self.range = BOTTOM - (self.low & (BOTTOM - 1));
            }

            if self.idx >= self.buffer.len() {
                return Err(Error::invalid_format("truncated range coder chunk"));
            }

            self.code = (self.code << 8) | u64::from(self.buffer[self.idx]);
            self.idx += 1;
            self.low <<= 8;
            self.range <<= 8;
        }

        Ok(s)
    }
}
