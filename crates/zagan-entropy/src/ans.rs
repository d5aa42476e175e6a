//! Asymmetric Numeral Systems range codec, order 0 and order 1.
//!
//! See "Asymmetric Numeral Systems" by Jarek Duda, arXiv:0902.0271. The
//! state machine follows the rANS construction: encoding runs from the
//! last byte to the first so that decoding comes out forward, and the
//! per-symbol division is replaced by an Alverson reciprocal
//! (multiply + shift) that is part of the wire contract.
//!
//! The block is split into chunks; every chunk re-derives its statistics
//! and carries a compact header: 3 bits of `log_range - 8`, then for each
//! context the sparse alphabet and the normalized frequencies in groups
//! with a log-max prefix. For order 1 there is one table per previous-byte
//! context; the first byte of a chunk is coded in context 0 (the anchor),
//! so the decoder can seed its context chain.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Cancellation, Error, Result};

use crate::histogram::{histogram_order0, histogram_order1, FREQ_ROW};
use crate::utils::{
    decode_frequencies, encode_frequencies, normalize_frequencies, read_varint, write_varint,
};

/// Lower bound of the normalized encoder state interval.
pub const ANS_TOP: u32 = 1 << 23;

/// Default chunk size for order 0 (order 1 shifts this by 8 bits).
pub const DEFAULT_ANS0_CHUNK_SIZE: usize = 1 << 15;

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 1 << 27;

/// Default frequency precision; the largest usable with `ANS_TOP = 1 << 23`.
pub const DEFAULT_LOG_RANGE: u32 = 13;

/// Per-symbol encoder entry: renormalization threshold and the reciprocal
/// form of the frequency (Alverson, "Integer division using reciprocals").
#[derive(Debug, Clone, Copy, Default)]
struct EncSymbol {
    x_max: u32,
    cmpl_freq: u32,
    inv_shift: u32,
    inv_freq: u64,
    bias: u32,
}

impl EncSymbol {
    fn reset(&mut self, cum_freq: u32, freq: u32, log_range: u32) {
        // Keep x_max a positive 32-bit quantity when a single symbol owns
        // the whole range.
        let freq = freq.min((1 << log_range) - 1);

        self.x_max = ((ANS_TOP >> log_range) << 8) * freq;
        self.cmpl_freq = (1 << log_range) - freq;

        if freq < 2 {
            self.inv_freq = 0xFFFF_FFFF;
            self.inv_shift = 32;
            self.bias = cum_freq + (1 << log_range) - 1;
        } else {
            let mut shift = 0u32;

            while freq > (1 << shift) {
                shift += 1;
            }

            self.inv_freq = ((1u64 << (shift + 31)) + u64::from(freq) - 1) / u64::from(freq)
                & 0xFFFF_FFFF;
            self.inv_shift = 32 + shift - 1;
            self.bias = cum_freq;
        }
    }
}

/// Per-symbol decoder entry.
#[derive(Debug, Clone, Copy, Default)]
struct DecSymbol {
    cum_freq: u32,
    freq: u32,
}

impl DecSymbol {
    fn reset(&mut self, cum_freq: u32, freq: u32, log_range: u32) {
        self.cum_freq = cum_freq;
        self.freq = freq.min((1 << log_range) - 1);
    }
}

fn validate_params(order: u32, chunk_size: Option<usize>, log_range: u32) -> Result<usize> {
    if order > 1 {
        return Err(Error::invalid_argument(format!(
            "ANS codec: invalid order {order} (must be 0 or 1)"
        )));
    }

    if !(8..=16).contains(&log_range) {
        return Err(Error::invalid_argument(format!(
            "ANS codec: invalid range {log_range} (must be in [8..16])"
        )));
    }

    match chunk_size {
        None => Ok(DEFAULT_ANS0_CHUNK_SIZE << (8 * order)),
        Some(0) => Ok(0),
        Some(sz) if sz < 1024 => Err(Error::invalid_argument(format!(
            "ANS codec: chunk size {sz} is below the 1024 byte minimum"
        ))),
        Some(sz) if sz > MAX_CHUNK_SIZE => Err(Error::invalid_argument(format!(
            "ANS codec: chunk size {sz} exceeds {MAX_CHUNK_SIZE}"
        ))),
        Some(sz) => Ok(sz),
    }
}

/// rANS encoder.
pub struct AnsRangeEncoder {
    order: u32,
    chunk_size: usize,
    log_range: u32,
    alphabet: Vec<u8>,     // dim rows of 256
    freqs: Vec<u32>,       // dim rows of 257
    symbols: Vec<EncSymbol>, // dim rows of 256
    buffer: Vec<u8>,
    cancel: Cancellation,
}

impl AnsRangeEncoder {
    /// Create an encoder. `chunk_size` of `None` selects the default for
    /// the order; `Some(0)` treats the whole block as a single chunk.
    pub fn new(order: u32, chunk_size: Option<usize>, log_range: u32) -> Result<Self> {
        let chunk_size = validate_params(order, chunk_size, log_range)?;
        let dim = 255 * order as usize + 1;

        Ok(Self {
            order,
            chunk_size,
            log_range,
            alphabet: vec![0; dim * 256],
            freqs: vec![0; dim * FREQ_ROW],
            symbols: vec![EncSymbol::default(); dim * 256],
            buffer: Vec::new(),
            cancel: Cancellation::new(),
        })
    }

    /// Create an order-`order` encoder with default chunking and range.
    pub fn with_order(order: u32) -> Result<Self> {
        Self::new(order, None, DEFAULT_LOG_RANGE)
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

        if self.buffer.len() < sz + (sz >> 3) {
            self.buffer.resize(sz + (sz >> 3), 0);
        }

        for chunk in block.chunks(sz) {
            self.cancel.check()?;

            let mut lr = self.log_range;

            // Lower the range when the chunk is small.
            while lr > 8 && (1usize << lr) > chunk.len() {
                lr -= 1;
            }

            self.rebuild_statistics(bs, chunk, lr)?;
            self.encode_chunk(bs, chunk)?;
        }

        Ok(block.len())
    }

    fn rebuild_statistics<W: Write>(
        &mut self,
        bs: &mut BitWriter<W>,
        chunk: &[u8],
        lr: u32,
    ) -> Result<()> {
        if self.order == 0 {
            histogram_order0(chunk, &mut self.freqs);
        } else {
            histogram_order1(chunk, &mut self.freqs);
        }

        self.update_frequencies(bs, lr)
    }

    // Normalize per-context frequencies, rebuild symbol entries and emit
    // the chunk header.
    fn update_frequencies<W: Write>(&mut self, bs: &mut BitWriter<W>, lr: u32) -> Result<()> {
        let dim = 255 * self.order as usize + 1;
        bs.write_bits(u64::from(lr - 8), 3)?;

        for k in 0..dim {
            let row = &mut self.freqs[k * FREQ_ROW..(k + 1) * FREQ_ROW];
            let total = row[256];
            let alphabet = &mut self.alphabet[k * 256..(k + 1) * 256];
            let alphabet_size = normalize_frequencies(row, alphabet, total, 1 << lr)?;

            if alphabet_size > 0 {
                let symbols = &mut self.symbols[k << 8..(k + 1) << 8];
                let mut sum = 0u32;

                for i in 0..256 {
                    if row[i] == 0 {
                        continue;
                    }

                    symbols[i].reset(sum, row[i], lr);
                    sum += row[i];
                }
            }

            encode_frequencies(bs, &alphabet[..alphabet_size], row, lr)?;
        }

        Ok(())
    }

    fn encode_chunk<W: Write>(&mut self, bs: &mut BitWriter<W>, chunk: &[u8]) -> Result<()> {
        let mut st = ANS_TOP;
        let top = self.buffer.len();
        let mut p = top;

        if self.order == 0 {
            for &b in chunk.iter().rev() {
                let sym = self.symbols[b as usize];

                while st >= sym.x_max {
                    if p == 0 {
                        return Err(Error::invalid_format("ANS chunk expansion exceeded buffer"));
                    }

                    p -= 1;
                    self.buffer[p] = st as u8;
                    st >>= 8;
                }

                // C(s,x) = M * floor(x / q_s) + mod(x, q_s) + b_s
                let q = ((u64::from(st) * sym.inv_freq) >> sym.inv_shift) as u32;
                st = st + sym.bias + q * sym.cmpl_freq;
            }
        } else {
            let mut prv = chunk[chunk.len() - 1] as usize;

            for &b in chunk[..chunk.len() - 1].iter().rev() {
                let cur = b as usize;
                let sym = self.symbols[(cur << 8) | prv];

                while st >= sym.x_max {
                    if p == 0 {
                        return Err(Error::invalid_format("ANS chunk expansion exceeded buffer"));
                    }

                    p -= 1;
                    self.buffer[p] = st as u8;
                    st >>= 8;
                }

                let q = ((u64::from(st) * sym.inv_freq) >> sym.inv_shift) as u32;
                st = st + sym.bias + q * sym.cmpl_freq;
                prv = cur;
            }

            // First chunk byte: coded in context 0, read back first.
            let sym = self.symbols[prv];

            while st >= sym.x_max {
                if p == 0 {
                    return Err(Error::invalid_format("ANS chunk expansion exceeded buffer"));
                }

                p -= 1;
                self.buffer[p] = st as u8;
                st >>= 8;
            }

            let q = ((u64::from(st) * sym.inv_freq) >> sym.inv_shift) as u32;
            st = st + sym.bias + q * sym.cmpl_freq;
        }

        write_varint(bs, (top - p) as u32)?;
        bs.write_bits(u64::from(st), 32)?;
        bs.write_bytes(&self.buffer[p..top])?;
        Ok(())
    }
}

/// rANS decoder.
pub struct AnsRangeDecoder {
    order: u32,
    chunk_size: usize,
    alphabet: Vec<u8>,       // dim rows of 256
    freqs: Vec<u32>,         // dim rows of 257
    symbols: Vec<DecSymbol>, // dim rows of 256
    f2s: Vec<u8>,            // dim << lr slot-to-symbol map
    buffer: Vec<u8>,
    cancel: Cancellation,
}

impl AnsRangeDecoder {
    /// Create a decoder with the same parameters as the encoder.
    pub fn new(order: u32, chunk_size: Option<usize>) -> Result<Self> {
        let chunk_size = validate_params(order, chunk_size, DEFAULT_LOG_RANGE)?;
        let dim = 255 * order as usize + 1;

        Ok(Self {
            order,
            chunk_size,
            alphabet: vec![0; dim * 256],
            freqs: vec![0; dim * FREQ_ROW],
            symbols: vec![DecSymbol::default(); dim * 256],
            f2s: Vec::new(),
            buffer: Vec::new(),
            cancel: Cancellation::new(),
        })
    }

    /// Create an order-`order` decoder with default chunking.
    pub fn with_order(order: u32) -> Result<Self> {
        Self::new(order, None)
    }

    /// Attach a cancellation token checked between chunks.
    pub fn set_cancellation(&mut self, cancel: Cancellation) {
        self.cancel = cancel;
    }

    /// Decode `block.len()` bytes from the bit stream into `block`.
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
            let lr = self.decode_header(bs)?;
            self.decode_chunk(bs, chunk, lr)?;
        }

        Ok(len)
    }

    fn decode_header<R: Read>(&mut self, bs: &mut BitReader<R>) -> Result<u32> {
        let lr = bs.read_bits(3)? as u32 + 8;
        let dim = 255 * self.order as usize + 1;
        let scale = 1u32 << lr;

        if self.f2s.len() < dim << lr {
            self.f2s.resize(dim << lr, 0);
        }

        for k in 0..dim {
            let alphabet = &mut self.alphabet[k * 256..(k + 1) * 256];
            let row = &mut self.freqs[k * FREQ_ROW..(k + 1) * FREQ_ROW];
            let alphabet_size = decode_frequencies(bs, alphabet, row, lr)?;

            if alphabet_size == 0 {
                continue;
            }

            // Rebuild symbols and the slot-to-symbol map.
            let mut cum = 0u32;

            for &s in &alphabet[..alphabet_size] {
                let f = row[s as usize];
                self.symbols[(k << 8) + s as usize].reset(cum, f, lr);
                let base = (k << lr) + cum as usize;
                self.f2s[base..base + f as usize].fill(s);
                cum += f;
            }

            if cum != scale {
                return Err(Error::invalid_format(format!(
                    "frequency table sums to {cum}, expected {scale}"
                )));
            }
        }

        Ok(lr)
    }

    fn decode_chunk<R: Read>(
        &mut self,
        bs: &mut BitReader<R>,
        chunk: &mut [u8],
        lr: u32,
    ) -> Result<()> {
        let n = read_varint(bs)? as usize;

        // The encoder's staging buffer bounds any honest chunk.
        if n > chunk.len() * 2 + 64 {
            return Err(Error::invalid_format(format!(
                "ANS chunk declares {n} bytes for {} output bytes",
                chunk.len()
            )));
        }

        let mut st = bs.read_bits(32)? as u32;

        if self.buffer.len() < n {
            self.buffer.resize(n, 0);
        }

        bs.read_bytes(&mut self.buffer[..n])?;

        let mask = (1u32 << lr) - 1;
        let mut idx = 0usize;

        if self.order == 0 {
            for out in chunk.iter_mut() {
                let s = self.f2s[(st & mask) as usize];
                *out = s;
                let sym = self.symbols[s as usize];

                if sym.freq == 0 {
                    return Err(Error::invalid_format_at("invalid ANS symbol", idx));
                }

                st = sym.freq * (st >> lr) + (st & mask) - sym.cum_freq;

                while st < ANS_TOP {
                    if idx >= n {
                        return Err(Error::invalid_format("truncated ANS chunk"));
                    }

                    st = (st << 8) | u32::from(self.buffer[idx]);
                    idx += 1;
                }
            }
        } else {
            let mut prv = 0usize;

            for out in chunk.iter_mut() {
                let s = self.f2s[(prv << lr) + (st & mask) as usize];
                *out = s;
                let sym = self.symbols[(prv << 8) + s as usize];

                if sym.freq == 0 {
                    return Err(Error::invalid_format_at("invalid ANS symbol", idx));
                }

                st = sym.freq * (st >> lr) + (st & mask) - sym.cum_freq;

                while st < ANS_TOP {
                    if idx >= n {
                        return Err(Error::invalid_format("truncated ANS chunk"));
                    }

                    st = (st << 8) | u32::from(self.buffer[idx]);
                    idx += 1;
                }

                prv = s as usize;
            }
        }

        if st != ANS_TOP || idx != n {
            return Err(Error::invalid_format(format!(
                "ANS chunk did not settle: state {st:#x}, {} trailing bytes",
                n - idx
            )));
        }

        Ok(())
    }
}
