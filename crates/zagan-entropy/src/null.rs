//! Pass-through entropy coder: bytes go to the bit stream verbatim.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Result};

/// Entropy coder that performs no compression.
#[derive(Debug, Default)]
pub struct NullEntropyCoder;

impl NullEntropyCoder {
    pub fn new() -> Self {
        Self
    }

    /// Write `block` to the bit stream as-is.
    pub fn encode<W: Write>(&mut self, bs: &mut BitWriter<W>, block: &[u8]) -> Result<usize> {
        bs.write_bytes(block)?;
        Ok(block.len())
    }

    /// Read `block.len()` bytes from the bit stream.
    pub fn decode<R: Read>(&mut self, bs: &mut BitReader<R>, block: &mut [u8]) -> Result<usize> {
        bs.read_bytes(block)?;
        Ok(block.len())
    }
}
