//! Bijective Burrows-Wheeler Transform (Scott's variant).
//!
//! The input is factored into its Lyndon words (Duval's algorithm); the
//! cyclic rotations of all words are sorted together by their infinite
//! periodic expansions, and the transform emits the character preceding
//! each rotation within its word. No primary index is needed: the inverse
//! decomposes the LF permutation into cycles, each cycle yielding one
//! word, and the words are reassembled in reverse discovery order.
//!
//! Construction here is comparison-based: two periodic expansions are
//! decided within `|u| + |v|` symbols (Fine and Wilf), so sorting is
//! `O(n log n)` comparisons with a bounded probe each.

use zagan_core::{ByteTransform, Error, Result};

use crate::bwt::MAX_BLOCK_SIZE;

/// Bijective BWT.
#[derive(Debug, Default)]
pub struct Bwts {
    // (word start, word length) per position.
    word_of: Vec<(u32, u32)>,
    order: Vec<u32>,
}

impl Bwts {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_block(count: usize, dst_len: usize) -> Result<()> {
        if count > MAX_BLOCK_SIZE {
            return Err(Error::invalid_argument(format!(
                "block of {count} bytes exceeds the BWTS maximum of {MAX_BLOCK_SIZE}"
            )));
        }

        if dst_len < count {
            return Err(Error::invalid_argument(format!(
                "output buffer too small: {dst_len} < {count}"
            )));
        }

        Ok(())
    }
}

// Duval's algorithm: the Lyndon factorization as (start, len) pairs.
fn lyndon_factors(src: &[u8]) -> Vec<(u32, u32)> {
    let n = src.len();
    let mut factors = Vec::new();
    let mut i = 0;

    while i < n {
        let mut j = i + 1;
        let mut k = i;

        while j < n && src[k] <= src[j] {
            if src[k] < src[j] {
                k = i;
            } else {
                k += 1;
            }

            j += 1;
        }

        while i <= k {
            let len = j - k;
            factors.push((i as u32, len as u32));
            i += len;
        }
    }

    factors
}

// Compare the infinite periodic expansions of two rotations.
fn compare_rotations(src: &[u8], a: (u32, u32, u32), b: (u32, u32, u32)) -> std::cmp::Ordering {
    let (ao, am, ap) = (a.0 as usize, a.1 as usize, a.2 as usize);
    let (bo, bm, bp) = (b.0 as usize, b.1 as usize, b.2 as usize);
    let limit = am + bm;

    let mut ai = ap - ao;
    let mut bi = bp - bo;

    for _ in 0..limit {
        let ca = src[ao + ai];
        let cb = src[bo + bi];

        if ca != cb {
            return ca.cmp(&cb);
        }

        ai += 1;

        if ai == am {
            ai = 0;
        }

        bi += 1;

        if bi == bm {
            bi = 0;
        }
    }

    std::cmp::Ordering::Equal
}

impl ByteTransform for Bwts {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let count = src.len();
        Self::check_block(count, dst.len())?;

        if count < 2 {
            dst[..count].copy_from_slice(src);
            return Ok((count, count));
        }

        self.word_of.clear();
        self.word_of.resize(count, (0, 0));

        for &(start, len) in &lyndon_factors(src) {
            for p in start..start + len {
                self.word_of[p as usize] = (start, len);
            }
        }

        self.order.clear();
        self.order.extend(0..count as u32);

        let word_of = &self.word_of;
        self.order.sort_by(|&p, &q| {
            let (po, pm) = word_of[p as usize];
            let (qo, qm) = word_of[q as usize];
            compare_rotations(src, (po, pm, p), (qo, qm, q)).then(p.cmp(&q))
        });

        for (i, &p) in self.order.iter().enumerate() {
            let (o, m) = self.word_of[p as usize];
            // Character preceding the rotation, cyclically within its word.
            let prev = o + (p - o + m - 1) % m;
            dst[i] = src[prev as usize];
        }

        Ok((count, count))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let count = src.len();
        Self::check_block(count, dst.len())?;

        if count < 2 {
            dst[..count].copy_from_slice(src);
            return Ok((count, count));
        }

        // Standard LF mapping over the transform column.
        let mut buckets = [0u32; 256];

        for &b in src {
            buckets[b as usize] += 1;
        }

        let mut sum = 0u32;

        for b in buckets.iter_mut() {
            sum += *b;
            *b = sum - *b;
        }

        let mut lf = vec![0u32; count];

        for (i, &b) in src.iter().enumerate() {
            lf[i] = buckets[b as usize];
            buckets[b as usize] += 1;
        }

        // Cycle decomposition: each cycle is one Lyndon word; words found
        // later sort higher and belong earlier in the factorization, so
        // each recovered word is prepended.
        let mut visited = vec![false; count];
        let mut out_end = count;

        for start in 0..count {
            if visited[start] {
                continue;
            }

            let mut j = start;

            // The backward LF walk emits the word back to front, and the
            // slots are filled back to front too, so the word lands in
            // reading order.
            loop {
                visited[j] = true;

                if out_end == 0 {
                    return Err(Error::invalid_format("corrupt BWTS permutation"));
                }

                out_end -= 1;
                dst[out_end] = src[j];
                j = lf[j] as usize;

                if j == start {
                    break;
                }
            }
        }

        if out_end != 0 {
            return Err(Error::invalid_format("corrupt BWTS permutation"));
        }

        Ok((count, count))
    }
}
