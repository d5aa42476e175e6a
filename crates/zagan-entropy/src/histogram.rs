//! Order-0 and order-1 byte histograms.
//!
//! Frequency rows are 257 entries wide: 256 counts plus the row total at
//! index 256. The order-1 histogram keys rows by the previous byte, with
//! the first byte of the block counted in context 0 so that the anchor
//! symbol always has a nonzero frequency.

/// Entries per frequency row (256 symbols + total).
pub const FREQ_ROW: usize = 257;

/// Compute an order-0 histogram over `block` into a 257-entry row.
pub fn histogram_order0(block: &[u8], freqs: &mut [u32]) {
    debug_assert!(freqs.len() >= FREQ_ROW);
    freqs[..FREQ_ROW].fill(0);

    for &b in block {
        freqs[b as usize] += 1;
    }

    freqs[256] = block.len() as u32;
}

/// Compute an order-1 histogram over `block` into 256 rows of 257 entries,
/// flat, keyed by previous byte.
pub fn histogram_order1(block: &[u8], freqs: &mut [u32]) {
    debug_assert!(freqs.len() >= 256 * FREQ_ROW);
    freqs[..256 * FREQ_ROW].fill(0);

    let mut prv = 0usize;

    for &b in block {
        let row = prv * FREQ_ROW;
        freqs[row + b as usize] += 1;
        freqs[row + 256] += 1;
        prv = b as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order0_counts_and_total() {
        let mut freqs = vec![0u32; FREQ_ROW];
        histogram_order0(b"mississippi", &mut freqs);

        assert_eq!(freqs[b'i' as usize], 4);
        assert_eq!(freqs[b's' as usize], 4);
        assert_eq!(freqs[b'p' as usize], 2);
        assert_eq!(freqs[b'm' as usize], 1);
        assert_eq!(freqs[256], 11);
    }

    #[test]
    fn order1_first_byte_lands_in_context_zero() {
        let mut freqs = vec![0u32; 256 * FREQ_ROW];
        histogram_order1(b"ab", &mut freqs);

        assert_eq!(freqs[b'a' as usize], 1); // context 0 -> 'a'
        assert_eq!(freqs[256], 1);
        assert_eq!(freqs[b'a' as usize * FREQ_ROW + b'b' as usize], 1);
        assert_eq!(freqs[b'a' as usize * FREQ_ROW + 256], 1);
    }

    #[test]
    fn order1_row_totals_sum_to_len() {
        let data: Vec<u8> = (0u16..500).map(|i| (i % 97) as u8).collect();
        let mut freqs = vec![0u32; 256 * FREQ_ROW];
        histogram_order1(&data, &mut freqs);

        let total: u32 = (0..256).map(|k| freqs[k * FREQ_ROW + 256]).sum();
        assert_eq!(total, data.len() as u32);
    }
}
