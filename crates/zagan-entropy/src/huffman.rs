//! Canonical Huffman codec.
//!
//! Code lengths are computed in place with the Moffat-Katajainen
//! algorithm ("In-Place Calculation of Minimum-Redundancy Codes") and
//! capped at 24 bits. Only the lengths travel: the header is the sparse
//! alphabet followed by the length deltas from the previous length
//! (starting at 2), signed Exp-Golomb coded. Both sides then rebuild the
//! same canonical codes, shortest first, ties broken by symbol value.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Error, Result};

use crate::exp_golomb::{ExpGolombDecoder, ExpGolombEncoder};
use crate::histogram::{histogram_order0, FREQ_ROW};
use crate::utils::{decode_alphabet, encode_alphabet};

/// Longest permitted code.
pub const MAX_SYMBOL_SIZE: u32 = 24;

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 1 << 27;

/// Default chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 16;

fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size != 0 && chunk_size < 1024 {
        return Err(Error::invalid_argument(format!(
            "Huffman codec: chunk size {chunk_size} is below the 1024 byte minimum"
        )));
    }

    if chunk_size > MAX_CHUNK_SIZE {
        return Err(Error::invalid_argument(format!(
            "Huffman codec: chunk size {chunk_size} exceeds {MAX_CHUNK_SIZE}"
        )));
    }

    Ok(())
}

// Assign canonical codes from lengths: symbols sorted by (length, value),
// first code 0, each next code incremented then left-shifted into its
// length. Returns an error when a length exceeds the cap.
fn generate_canonical_codes(sizes: &[u8; 256], sorted: &[u8], codes: &mut [u32; 256]) -> Result<()> {
    let mut code = 0u32;
    let mut len = u32::from(sizes[usize::from(sorted[0])]);

    for &s in sorted {
        let cur = u32::from(sizes[usize::from(s)]);

        if cur == 0 || cur > MAX_SYMBOL_SIZE {
            return Err(Error::invalid_format(format!(
                "invalid Huffman code length {cur} for symbol {s}"
            )));
        }

        code <<= cur - len;
        len = cur;
        codes[usize::from(s)] = code;
        code += 1;
    }

    Ok(())
}

// Sort symbols by (length, value); the canonical order.
fn sort_by_length(alphabet: &[u8], sizes: &[u8; 256]) -> Vec<u8> {
    let mut sorted = alphabet.to_vec();
    sorted.sort_by_key(|&s| (sizes[usize::from(s)], s));
    sorted
}

// Phase 1 of Moffat-Katajainen: overwrite the sorted frequency array with
// internal node parents.
fn compute_in_place_sizes_phase1(data: &mut [u32], n: usize) {
    let mut s = 0usize;
    let mut r = 0usize;

    for t in 0..n - 1 {
        let mut sum = 0u32;

        for _ in 0..2 {
            if s >= n || (r < t && data[r] < data[s]) {
                sum += data[r];
                data[r] = t as u32;
                r += 1;
            } else {
                sum += data[s];

                if s > t {
                    data[s] = 0;
                }

                s += 1;
            }
        }

        data[t] = sum;
    }
}

// Phase 2: convert the parent chain into leaf depths.
fn compute_in_place_sizes_phase2(data: &mut [u32], n: usize) {
    let mut top_level = n - 2;
    let mut depth = 1u32;
    let mut i = n;
    let mut total_nodes_at_level = 2usize;

    while i > 0 {
        let mut k = top_level;

        while k > 0 && data[k - 1] >= top_level as u32 {
            k -= 1;
        }

        let internal_nodes_at_level = top_level - k;
        let leaves_at_level = total_nodes_at_level - internal_nodes_at_level;

        for _ in 0..leaves_at_level {
            i -= 1;
            data[i] = depth;
        }

        total_nodes_at_level = internal_nodes_at_level << 1;
        top_level = k;
        depth += 1;
    }
}

/// Canonical Huffman encoder, chunked.
pub struct HuffmanEncoder {
    chunk_size: usize,
    freqs: Vec<u32>,
    sizes: [u8; 256],
    codes: [u32; 256],
}

impl HuffmanEncoder {
    /// `chunk_size` of 0 treats the whole block as one chunk.
    pub fn new(chunk_size: usize) -> Result<Self> {
        validate_chunk_size(chunk_size)?;

        Ok(Self {
            chunk_size,
            freqs: vec![0; FREQ_ROW],
            sizes: [0; 256],
            codes: [0; 256],
        })
    }

    /// Encoder with the default 64 KiB chunking.
    pub fn with_default_chunking() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE).unwrap()
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
            histogram_order0(chunk, &mut self.freqs);
            self.update_frequencies(bs)?;

            for &b in chunk {
                let s = usize::from(b);
                bs.write_bits(u64::from(self.codes[s]), u32::from(self.sizes[s]))?;
            }
        }

        Ok(block.len())
    }

    // Rebuild code lengths and canonical codes; emit the chunk header.
    fn update_frequencies<W: Write>(&mut self, bs: &mut BitWriter<W>) -> Result<()> {
        let mut alphabet = Vec::with_capacity(256);

        for i in 0..256usize {
            self.sizes[i] = 0;
            self.codes[i] = 0;

            if self.freqs[i] > 0 {
                alphabet.push(i as u8);
            }
        }

        encode_alphabet(bs, &alphabet)?;
        self.compute_code_lengths(&alphabet)?;

        // Transmit only the code lengths, as deltas from the previous one.
        let eg = ExpGolombEncoder::new(true);
        let mut prev = 2i32;

        for &s in &alphabet {
            let cur = i32::from(self.sizes[usize::from(s)]);
            eg.encode_byte(bs, (cur - prev) as u8)?;
            prev = cur;
        }

        let sorted = sort_by_length(&alphabet, &self.sizes);
        generate_canonical_codes(&self.sizes, &sorted, &mut self.codes)
    }

    fn compute_code_lengths(&mut self, alphabet: &[u8]) -> Result<()> {
        let count = alphabet.len();

        if count == 1 {
            self.sizes[usize::from(alphabet[0])] = 1;
            return Ok(());
        }

        // Sort by (frequency, value) and run the in-place algorithm over
        // the frequency buffer.
        let mut ranked = alphabet.to_vec();
        ranked.sort_by_key(|&s| (self.freqs[usize::from(s)], s));

        let mut buffer: Vec<u32> = ranked
            .iter()
            .map(|&s| self.freqs[usize::from(s)])
            .collect();

        compute_in_place_sizes_phase1(&mut buffer, count);
        compute_in_place_sizes_phase2(&mut buffer, count);

        for (i, &s) in ranked.iter().enumerate() {
            let len = buffer[i];

            if len == 0 || len > MAX_SYMBOL_SIZE {
                return Err(Error::invalid_argument(format!(
                    "could not generate codes: max code length ({MAX_SYMBOL_SIZE} bits) exceeded"
                )));
            }

            self.sizes[usize::from(s)] = len as u8;
        }

        Ok(())
    }
}

/// Canonical Huffman decoder, chunked.
pub struct HuffmanDecoder {
    chunk_size: usize,
    sizes: [u8; 256],
    // Canonical tables per length: first code, first index, count.
    first_code: [u32; MAX_SYMBOL_SIZE as usize + 1],
    first_index: [usize; MAX_SYMBOL_SIZE as usize + 1],
    counts: [usize; MAX_SYMBOL_SIZE as usize + 1],
    sorted: Vec<u8>,
}

impl HuffmanDecoder {
    /// `chunk_size` must match the encoder.
    pub fn new(chunk_size: usize) -> Result<Self> {
        validate_chunk_size(chunk_size)?;

        Ok(Self {
            chunk_size,
            sizes: [0; 256],
            first_code: [0; MAX_SYMBOL_SIZE as usize + 1],
            first_index: [0; MAX_SYMBOL_SIZE as usize + 1],
            counts: [0; MAX_SYMBOL_SIZE as usize + 1],
            sorted: Vec::new(),
        })
    }

    /// Decoder with the default 64 KiB chunking.
    pub fn with_default_chunking() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE).unwrap()
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
            self.read_lengths(bs)?;

            for out in chunk.iter_mut() {
                *out = self.decode_byte(bs)?;
            }
        }

        Ok(len)
    }

    fn read_lengths<R: Read>(&mut self, bs: &mut BitReader<R>) -> Result<()> {
        let mut alphabet = [0u8; 256];
        let count = decode_alphabet(bs, &mut alphabet)?;

        if count == 0 {
            return Err(Error::invalid_format("empty Huffman alphabet"));
        }

        self.sizes = [0; 256];
        let eg = ExpGolombDecoder::new(true);
        let mut prev = 2i32;

        for &s in &alphabet[..count] {
            let delta = i32::from(eg.decode_byte(bs)? as i8);
            let cur = prev + delta;

            if cur <= 0 || cur > MAX_SYMBOL_SIZE as i32 {
                return Err(Error::invalid_format(format!(
                    "incorrect length {cur} for Huffman symbol {s}"
                )));
            }

            self.sizes[usize::from(s)] = cur as u8;
            prev = cur;
        }

        self.sorted = sort_by_length(&alphabet[..count], &self.sizes);
        let mut codes = [0u32; 256];
        generate_canonical_codes(&self.sizes, &self.sorted, &mut codes)?;

        // Per-length first code / first index tables for canonical decode.
        self.first_code = [0; MAX_SYMBOL_SIZE as usize + 1];
        self.first_index = [0; MAX_SYMBOL_SIZE as usize + 1];
        self.counts = [0; MAX_SYMBOL_SIZE as usize + 1];

        for (i, &s) in self.sorted.iter().enumerate() {
            let l = usize::from(self.sizes[usize::from(s)]);

            if self.counts[l] == 0 {
                self.first_code[l] = codes[usize::from(s)];
                self.first_index[l] = i;
            }

            self.counts[l] += 1;
        }

        Ok(())
    }

    fn decode_byte<R: Read>(&mut self, bs: &mut BitReader<R>) -> Result<u8> {
        let mut code = 0u32;

        for len in 1..=MAX_SYMBOL_SIZE as usize {
            code = (code << 1) | bs.read_bit()?;

            if self.counts[len] > 0 && code >= self.first_code[len] {
                let offset = (code - self.first_code[len]) as usize;

                if offset < self.counts[len] {
                    return Ok(self.sorted[self.first_index[len] + offset]);
                }
            }
        }

        Err(Error::invalid_format("incorrect Huffman code"))
    }
}
