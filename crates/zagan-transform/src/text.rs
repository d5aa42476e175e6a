//! Word-dictionary text transform.
//!
//! Replaces recurring words (ASCII letter runs) with short dictionary
//! indexes. Both sides start from the same seed dictionary of common
//! English words and grow it deterministically with every word that is
//! emitted literally, so no dictionary ever travels in the stream.
//!
//! Token bytes: `0x0F` + LEB128 index is a verbatim dictionary hit,
//! `0x0E` + index is a hit modulo a capitalized first letter, and `0x0B`
//! escapes the rare payload bytes that collide with the token values.
//! Blocks that do not look like text are rejected up front.

use std::collections::HashMap;

use zagan_core::{ByteTransform, Error, Result, TransformContext};

const ESC_INDEX: u8 = 0x0F;
const ESC_INDEX_CAPS: u8 = 0x0E;
const ESC_LITERAL: u8 = 0x0B;

const MIN_WORD_LEN: usize = 2;
const MAX_WORD_LEN: usize = 32;
const MAX_DICT_SIZE: usize = 1 << 16;

// Seed dictionary shared by encoder and decoder.
const SEED_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "in", "that", "have", "it", "for", "not", "on", "with", "he",
    "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we", "say", "her",
    "she", "or", "an", "will", "my", "one", "all", "would", "there", "their", "what", "so", "up",
    "out", "if", "about", "who", "get", "which", "go", "me", "when", "make", "can", "like",
    "time", "no", "just", "him", "know", "take", "people", "into", "year", "your", "good",
    "some", "could", "them", "see", "other", "than", "then", "now", "look", "only", "come",
    "its", "over", "think", "also", "back", "after", "use", "two", "how", "our", "work",
    "first", "well", "way", "even", "new", "want", "because", "any", "these", "give", "day",
    "most", "us", "is", "was", "are", "been", "has", "had", "were", "said", "did", "having",
    "may", "should", "each", "where", "much", "through", "before", "between", "under", "while",
    "more", "many", "such", "those", "both", "during", "without", "again", "here", "still",
    "every", "own", "does", "against", "place", "world", "very", "must", "thing", "long",
];

#[inline]
fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

#[inline]
fn is_text_byte(b: u8) -> bool {
    b.is_ascii_graphic() || matches!(b, b' ' | b'\n' | b'\r' | b'\t')
}

#[inline]
fn needs_escape(b: u8) -> bool {
    matches!(b, ESC_LITERAL | ESC_INDEX_CAPS | ESC_INDEX)
}

// The shared word dictionary with deterministic growth.
struct Dictionary {
    words: Vec<Vec<u8>>,
    index: HashMap<Vec<u8>, u32>,
    capacity: usize,
}

impl Dictionary {
    fn new(capacity: usize) -> Self {
        let mut dict = Self {
            words: Vec::with_capacity(SEED_WORDS.len()),
            index: HashMap::with_capacity(SEED_WORDS.len()),
            capacity,
        };

        for w in SEED_WORDS {
            dict.add(w.as_bytes());
        }

        dict
    }

    fn add(&mut self, word: &[u8]) {
        if self.words.len() >= self.capacity || self.index.contains_key(word) {
            return;
        }

        self.index.insert(word.to_vec(), self.words.len() as u32);
        self.words.push(word.to_vec());
    }

    fn lookup(&self, word: &[u8]) -> Option<u32> {
        self.index.get(word).copied()
    }

    fn word(&self, idx: u32) -> Option<&[u8]> {
        self.words.get(idx as usize).map(Vec::as_slice)
    }
}

// Tracks letter runs in a byte stream and feeds complete words into the
// dictionary; both sides run this over the plain-text side of the stream.
struct WordTracker {
    word: Vec<u8>,
    overflow: bool,
}

impl WordTracker {
    fn new() -> Self {
        Self {
            word: Vec::with_capacity(MAX_WORD_LEN),
            overflow: false,
        }
    }

    fn feed(&mut self, b: u8, dict: &mut Dictionary) {
        if is_letter(b) {
            if self.word.len() < MAX_WORD_LEN {
                self.word.push(b);
            } else {
                self.overflow = true;
            }

            return;
        }

        self.flush(dict);
    }

    fn flush(&mut self, dict: &mut Dictionary) {
        if !self.overflow && self.word.len() >= MIN_WORD_LEN {
            dict.add(&self.word);
        }

        self.word.clear();
        self.overflow = false;
    }
}

/// Word-dictionary text codec.
///
/// Requires `blockSize` in the construction context; reads `codec` to
/// pick the text-detection threshold (binary context-mixing backends
/// accept messier input).
pub struct TextCodec {
    threshold_pct: usize,
    dict_capacity: usize,
}

impl TextCodec {
    pub fn new(ctx: &TransformContext) -> Result<Self> {
        let block_size = ctx.block_size().ok_or_else(|| {
            Error::invalid_argument("text codec requires a blockSize context entry")
        })?;

        let threshold_pct = match ctx.codec() {
            Some(name) if matches!(name.to_uppercase().as_str(), "TPAQ" | "CM" | "FPAQ") => 75,
            _ => 85,
        };

        Ok(Self {
            threshold_pct,
            dict_capacity: MAX_DICT_SIZE.min((block_size / 32).max(SEED_WORDS.len())),
        })
    }

    #[inline]
    fn push(dst: &mut [u8], dst_idx: &mut usize, val: u8) -> Result<()> {
        if *dst_idx >= dst.len() {
            return Err(Error::invalid_argument("data not compressible as text"));
        }

        dst[*dst_idx] = val;
        *dst_idx += 1;
        Ok(())
    }

    fn push_varint(dst: &mut [u8], dst_idx: &mut usize, mut value: u32) -> Result<()> {
        while value >= 128 {
            Self::push(dst, dst_idx, 0x80 | (value & 0x7F) as u8)?;
            value >>= 7;
        }

        Self::push(dst, dst_idx, value as u8)
    }

    // Emit one completed word: a dictionary token when possible, else the
    // literal bytes (which both sides then add to the dictionary).
    fn emit_word(
        word: &[u8],
        dict: &mut Dictionary,
        dst: &mut [u8],
        dst_idx: &mut usize,
    ) -> Result<()> {
        if word.len() >= MIN_WORD_LEN && word.len() <= MAX_WORD_LEN {
            if let Some(idx) = dict.lookup(word) {
                Self::push(dst, dst_idx, ESC_INDEX)?;
                return Self::push_varint(dst, dst_idx, idx);
            }

            if word[0].is_ascii_uppercase() {
                let mut lowered = word.to_vec();
                lowered[0] = lowered[0].to_ascii_lowercase();

                if let Some(idx) = dict.lookup(&lowered) {
                    Self::push(dst, dst_idx, ESC_INDEX_CAPS)?;
                    Self::push_varint(dst, dst_idx, idx)?;
                    // The decoder sees the capitalized form in its output
                    // and learns it; stay in lockstep.
                    dict.add(word);
                    return Ok(());
                }
            }

            dict.add(word);
        }

        for &b in word {
            Self::push(dst, dst_idx, b)?;
        }

        Ok(())
    }
}

impl ByteTransform for TextCodec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        if src.len() < 64 {
            return Err(Error::invalid_argument("block too short for the text codec"));
        }

        let text_bytes = src.iter().filter(|&&b| is_text_byte(b)).count();

        if text_bytes * 100 < self.threshold_pct * src.len() {
            return Err(Error::invalid_argument("block does not look like text"));
        }

        let mut dict = Dictionary::new(self.dict_capacity);
        let mut dst_idx = 0;
        let mut word_start = None;

        for i in 0..=src.len() {
            let b = src.get(i).copied();

            if let Some(b) = b {
                if is_letter(b) {
                    if word_start.is_none() {
                        word_start = Some(i);
                    }

                    continue;
                }
            }

            if let Some(start) = word_start.take() {
                Self::emit_word(&src[start..i], &mut dict, dst, &mut dst_idx)?;
            }

            if let Some(b) = b {
                if needs_escape(b) {
                    Self::push(dst, &mut dst_idx, ESC_LITERAL)?;
                }

                Self::push(dst, &mut dst_idx, b)?;
            }
        }

        Ok((src.len(), dst_idx))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let mut dict = Dictionary::new(self.dict_capacity);
        let mut tracker = WordTracker::new();
        let mut src_idx = 0;
        let mut dst_idx = 0;

        let mut emit = |dst: &mut [u8],
                        dst_idx: &mut usize,
                        tracker: &mut WordTracker,
                        dict: &mut Dictionary,
                        b: u8|
         -> Result<()> {
            if *dst_idx >= dst.len() {
                return Err(Error::invalid_format("output block overflow"));
            }

            dst[*dst_idx] = b;
            *dst_idx += 1;
            tracker.feed(b, dict);
            Ok(())
        };

        while src_idx < src.len() {
            let b = src[src_idx];
            src_idx += 1;

            match b {
                ESC_LITERAL => {
                    if src_idx >= src.len() {
                        return Err(Error::invalid_format_at("truncated escape", src_idx));
                    }

                    let lit = src[src_idx];
                    src_idx += 1;
                    emit(dst, &mut dst_idx, &mut tracker, &mut dict, lit)?;
                }
                ESC_INDEX | ESC_INDEX_CAPS => {
                    let mut idx = 0u32;
                    let mut shift = 0u32;

                    loop {
                        if src_idx >= src.len() || shift > 28 {
                            return Err(Error::invalid_format_at("truncated word index", src_idx));
                        }

                        let v = src[src_idx];
                        src_idx += 1;
                        idx |= u32::from(v & 0x7F) << shift;

                        if v < 128 {
                            break;
                        }

                        shift += 7;
                    }

                    let word = dict
                        .word(idx)
                        .ok_or_else(|| {
                            Error::invalid_format_at(format!("invalid word index {idx}"), src_idx)
                        })?
                        .to_vec();

                    for (k, &wb) in word.iter().enumerate() {
                        let out = if k == 0 && b == ESC_INDEX_CAPS {
                            wb.to_ascii_uppercase()
                        } else {
                            wb
                        };

                        emit(dst, &mut dst_idx, &mut tracker, &mut dict, out)?;
                    }
                }
                _ => emit(dst, &mut dst_idx, &mut tracker, &mut dict, b)?,
            }
        }

        tracker.flush(&mut dict);
        Ok((src_idx, dst_idx))
    }

    fn max_encoded_len(&self, src_len: usize) -> usize {
        src_len + (src_len >> 2) + 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(block_size: usize) -> TransformContext {
        TransformContext::with_block_size(block_size)
    }

    fn roundtrip(data: &[u8]) -> Vec<u8> {
        let mut t = TextCodec::new(&ctx(data.len())).unwrap();
        let mut mid = vec![0u8; t.max_encoded_len(data.len())];
        let (_, written) = t.forward(data, &mut mid).unwrap();

        let mut t2 = TextCodec::new(&ctx(data.len())).unwrap();
        let mut out = vec![0u8; data.len()];
        let (_, produced) = t2.inverse(&mid[..written], &mut out).unwrap();
        assert_eq!(produced, data.len());
        out
    }

    #[test]
    fn requires_block_size() {
        assert!(TextCodec::new(&TransformContext::new()).is_err());
        assert!(TextCodec::new(&ctx(4096)).is_ok());
    }

    #[test]
    fn codec_key_tunes_threshold() {
        let mut c = ctx(4096);
        c.set("codec", "TPAQ");
        assert_eq!(TextCodec::new(&c).unwrap().threshold_pct, 75);
        c.set("codec", "HUFFMAN");
        assert_eq!(TextCodec::new(&c).unwrap().threshold_pct, 85);
    }

    #[test]
    fn seed_words_compress() {
        let data = b"the people said that they would come back before the day was out ".repeat(40);
        let mut t = TextCodec::new(&ctx(data.len())).unwrap();
        let mut mid = vec![0u8; t.max_encoded_len(data.len())];
        let (_, written) = t.forward(&data, &mut mid).unwrap();
        assert!(written < data.len() * 3 / 4, "only reached {written}");
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn learned_words_compress_on_repeat() {
        let data = b"marmalade sandwiches, marmalade toast, marmalade everything else ".repeat(30);
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn capitalization_variant() {
        let data =
            b"The thing about the weather: When it turns, you know. And the turn came fast. "
                .repeat(20);
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn escape_bytes_in_payload() {
        let mut data = b"mostly ordinary text with a stray control byte ".repeat(20);
        data[100] = ESC_INDEX;
        data[200] = ESC_INDEX_CAPS;
        data[300] = ESC_LITERAL;
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn binary_data_is_rejected() {
        let data: Vec<u8> = (0u32..4096).map(|i| (i.wrapping_mul(193)) as u8).collect();
        let mut t = TextCodec::new(&ctx(data.len())).unwrap();
        let mut out = vec![0u8; t.max_encoded_len(data.len())];
        assert!(t.forward(&data, &mut out).is_err());
    }

    #[test]
    fn very_long_letter_runs_stay_literal() {
        let mut data = Vec::new();

        for _ in 0..10 {
            data.extend(std::iter::repeat(b'q').take(100));
            data.push(b' ');
        }

        data.extend_from_slice(b" and some regular words to finish the block ");
        assert_eq!(roundtrip(&data), data);
    }
}
