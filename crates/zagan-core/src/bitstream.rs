//! MSB-first bit streams over byte I/O.
//!
//! The writer packs bits into a 64-bit accumulator and spills big-endian
//! words into an internal buffer; the reader mirrors it exactly, so the two
//! agree byte-for-byte on identical operations. The endianness contract is
//! bit-level: within every produced byte the first bit written is the most
//! significant.

use std::io::{Read, Write};

use crate::error::{Error, Result};

const WRITE_BUFFER_SIZE: usize = 1 << 16;
const READ_BUFFER_SIZE: usize = 1 << 16;

/// Buffered bit-oriented writer over any [`Write`] sink.
pub struct BitWriter<W: Write> {
    sink: W,
    buffer: Vec<u8>,
    current: u64,
    // Free bit positions left in `current` (64 when empty).
    avail: u32,
    bits_written: u64,
    closed: bool,
}

impl<W: Write> BitWriter<W> {
    /// Create a writer over `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            buffer: Vec::with_capacity(WRITE_BUFFER_SIZE),
            current: 0,
            avail: 64,
            bits_written: 0,
            closed: false,
        }
    }

    /// Write the least significant `count` bits of `value`, MSB first.
    ///
    /// `count` must be in `[1, 64]`.
    pub fn write_bits(&mut self, value: u64, count: u32) -> Result<()> {
        if count == 0 || count > 64 {
            return Err(Error::invalid_argument(format!(
                "invalid bit count: {count} (must be in [1..64])"
            )));
        }

        if self.closed {
            return Err(Error::invalid_argument("bit stream closed"));
        }

        let value = if count < 64 {
            value & ((1u64 << count) - 1)
        } else {
            value
        };

        if count < self.avail {
            self.current |= value << (self.avail - count);
            self.avail -= count;
        } else {
            let remaining = count - self.avail;

            if remaining < 64 {
                self.current |= value >> remaining;
            }

            self.push_current()?;

            if remaining != 0 {
                self.current = value << (64 - remaining);
                self.avail = 64 - remaining;
            }
        }

        self.bits_written += u64::from(count);
        Ok(())
    }

    /// Write a single bit (the least significant bit of `bit`).
    #[inline]
    pub fn write_bit(&mut self, bit: u32) -> Result<()> {
        self.write_bits(u64::from(bit & 1), 1)
    }

    /// Write a whole byte array (exactly `8 * bytes.len()` bits).
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut chunks = bytes.chunks_exact(8);

        for chunk in &mut chunks {
            let word = u64::from_be_bytes(chunk.try_into().unwrap());
            self.write_bits(word, 64)?;
        }

        for &b in chunks.remainder() {
            self.write_bits(u64::from(b), 8)?;
        }

        Ok(())
    }

    /// Number of bits written so far.
    #[inline]
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Flush any partial byte (padded with zero bits, MSB first) and the
    /// internal buffer to the sink. The writer refuses further writes.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        let pending = (64 - self.avail) as usize;
        let pending_bytes = pending.div_ceil(8);
        let words = self.current.to_be_bytes();
        self.buffer.extend_from_slice(&words[..pending_bytes]);
        self.current = 0;
        self.avail = 64;
        self.flush_buffer()?;
        self.sink.flush()?;
        self.closed = true;
        Ok(())
    }

    /// Close the stream and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        Ok(self.sink)
    }

    fn push_current(&mut self) -> Result<()> {
        self.buffer.extend_from_slice(&self.current.to_be_bytes());
        self.current = 0;
        self.avail = 64;

        if self.buffer.len() >= WRITE_BUFFER_SIZE {
            self.flush_buffer()?;
        }

        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.sink.write_all(&self.buffer)?;
            self.buffer.clear();
        }

        Ok(())
    }
}

/// Buffered bit-oriented reader over any [`Read`] source.
pub struct BitReader<R: Read> {
    source: R,
    buffer: Vec<u8>,
    pos: usize,
    // Bits still unread in `current` (low `avail` bits of the last byte).
    current: u64,
    avail: u32,
    bits_read: u64,
}

impl<R: Read> BitReader<R> {
    /// Create a reader over `source`.
    pub fn new(source: R) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            pos: 0,
            current: 0,
            avail: 0,
            bits_read: 0,
        }
    }

    /// Read `count` bits (in `[1, 64]`), returning them right-aligned.
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        if count == 0 || count > 64 {
            return Err(Error::invalid_argument(format!(
                "invalid bit count: {count} (must be in [1..64])"
            )));
        }

        let mut result = 0u64;
        let mut need = count;

        while need > 0 {
            if self.avail == 0 {
                self.current = u64::from(self.next_byte()?);
                self.avail = 8;
            }

            // At most 8 bits are staged at a time, so `take` is always < 64.
            let take = need.min(self.avail);
            let shift = self.avail - take;
            let bits = (self.current >> shift) & ((1u64 << take) - 1);
            result = (result << take) | bits;
            self.avail -= take;
            need -= take;
        }

        self.bits_read += u64::from(count);
        Ok(result)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<u32> {
        Ok(self.read_bits(1)? as u32)
    }

    /// Fill `dst` with whole bytes (exactly `8 * dst.len()` bits).
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        if self.avail == 0 {
            // Byte aligned: serve straight from the internal buffer.
            let mut filled = 0;

            while filled < dst.len() {
                if self.pos == self.buffer.len() {
                    self.refill()?;
                }

                let n = (self.buffer.len() - self.pos).min(dst.len() - filled);
                dst[filled..filled + n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
                self.pos += n;
                filled += n;
            }

            self.bits_read += 8 * dst.len() as u64;
        } else {
            for b in dst.iter_mut() {
                *b = self.read_bits(8)? as u8;
            }
        }

        Ok(())
    }

    /// Number of bits read so far.
    #[inline]
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    fn next_byte(&mut self) -> Result<u8> {
        if self.pos == self.buffer.len() {
            self.refill()?;
        }

        let b = self.buffer[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn refill(&mut self) -> Result<()> {
        self.buffer.resize(READ_BUFFER_SIZE, 0);
        self.pos = 0;
        let n = self.source.read(&mut self.buffer)?;

        if n == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "unexpected end of bit stream",
            )));
        }

        self.buffer.truncate(n);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(writes: &[(u64, u32)]) -> Vec<u64> {
        let mut writer = BitWriter::new(Vec::new());

        for &(v, n) in writes {
            writer.write_bits(v, n).unwrap();
        }

        let bytes = writer.into_inner().unwrap();
        let mut reader = BitReader::new(bytes.as_slice());
        writes
            .iter()
            .map(|&(_, n)| reader.read_bits(n).unwrap())
            .collect()
    }

    #[test]
    fn single_bits_are_msb_first() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(1).unwrap();
        writer.write_bit(0).unwrap();
        writer.write_bit(1).unwrap();
        let bytes = writer.into_inner().unwrap();
        // 101 followed by five zero pad bits.
        assert_eq!(bytes, vec![0b1010_0000]);
    }

    #[test]
    fn mixed_width_roundtrip() {
        let writes = [
            (0b1u64, 1),
            (0x5Au64, 8),
            (0x1234u64, 13),
            (u64::MAX, 64),
            (0x0u64, 3),
            (0xFFFF_FFFFu64, 32),
            (0x7u64, 3),
        ];
        let values: Vec<u64> = writes.iter().map(|&(v, n)| v & mask(n)).collect();
        assert_eq!(roundtrip(&writes), values);
    }

    fn mask(n: u32) -> u64 {
        if n == 64 {
            u64::MAX
        } else {
            (1 << n) - 1
        }
    }

    #[test]
    fn byte_array_roundtrip_unaligned() {
        let payload: Vec<u8> = (0u16..300).map(|i| (i * 7) as u8).collect();
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bytes(&payload).unwrap();
        writer.write_bits(0x2, 2).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut reader = BitReader::new(bytes.as_slice());
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        let mut back = vec![0u8; payload.len()];
        reader.read_bytes(&mut back).unwrap();
        assert_eq!(back, payload);
        assert_eq!(reader.read_bits(2).unwrap(), 0x2);
    }

    #[test]
    fn counters_track_bits() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0, 5).unwrap();
        writer.write_bits(0, 64).unwrap();
        assert_eq!(writer.bits_written(), 69);
        let bytes = writer.into_inner().unwrap();
        // 69 bits padded to 9 bytes.
        assert_eq!(bytes.len(), 9);

        let mut reader = BitReader::new(bytes.as_slice());
        reader.read_bits(40).unwrap();
        assert_eq!(reader.bits_read(), 40);
    }

    #[test]
    fn randomized_writer_reader_agreement() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0xB17);

        for _ in 0..50 {
            let writes: Vec<(u64, u32)> = (0..rng.gen_range(1..400))
                .map(|_| {
                    let n = rng.gen_range(1..=64);
                    (rng.gen::<u64>(), n)
                })
                .collect();

            let mut writer = BitWriter::new(Vec::new());

            for &(v, n) in &writes {
                writer.write_bits(v, n).unwrap();
            }

            let total: u64 = writes.iter().map(|&(_, n)| u64::from(n)).sum();
            assert_eq!(writer.bits_written(), total);
            let bytes = writer.into_inner().unwrap();
            assert_eq!(bytes.len() as u64, total.div_ceil(8));

            let mut reader = BitReader::new(bytes.as_slice());

            for &(v, n) in &writes {
                assert_eq!(reader.read_bits(n).unwrap(), v & mask(n));
            }
        }
    }

    #[test]
    fn eof_is_reported() {
        let mut reader = BitReader::new([0xAAu8].as_slice());
        reader.read_bits(8).unwrap();
        assert!(reader.read_bits(1).is_err());
    }

    #[test]
    fn zero_count_rejected() {
        let mut writer = BitWriter::new(Vec::new());
        assert!(writer.write_bits(1, 0).is_err());
        assert!(writer.write_bits(1, 65).is_err());
    }
}
