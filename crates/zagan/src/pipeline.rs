//! Minimal block framing: the surface the toolkit's tests and examples
//! drive the core through.
//!
//! Layout per block, bit-packed MSB-first:
//!
//! ```text
//! type word (32) | entropy id (4) | original size varint |
//! transformed size varint | entropy-coded payload
//! ```
//!
//! This is not an archive format: no magic, no checksums, no metadata.
//! It stores exactly what the core needs to reverse itself.

use zagan_core::{BitReader, BitWriter, ByteTransform, Error, Result, TransformContext};
use zagan_entropy::utils::{read_varint, write_varint};
use zagan_entropy::{decode_block, encode_block, EntropyCodecType};
use zagan_transform::TransformFactory;

/// Largest block the pipeline accepts.
pub const MAX_BLOCK_SIZE: usize = 1 << 30;

/// Compress one block with a transform specification string (see
/// [`TransformFactory::parse_name`]) and an entropy codec.
pub fn compress_block(
    input: &[u8],
    transform_spec: &str,
    codec: EntropyCodecType,
    jobs: usize,
) -> Result<Vec<u8>> {
    if input.len() > MAX_BLOCK_SIZE {
        return Err(Error::invalid_argument(format!(
            "block of {} bytes exceeds the maximum of {MAX_BLOCK_SIZE}",
            input.len()
        )));
    }

    let word = TransformFactory::parse_name(transform_spec)?;

    let mut ctx = TransformContext::with_block_size(input.len());
    ctx.set("codec", codec.name());
    ctx.set("jobs", jobs.to_string());

    let mut sequence = TransformFactory::new_sequence(&ctx, word)?;
    let mut transformed = vec![0u8; sequence.max_encoded_len(input.len()).max(16)];
    let (_, written) = sequence.forward(input, &mut transformed)?;
    transformed.truncate(written);

    let mut bs = BitWriter::new(Vec::new());
    bs.write_bits(u64::from(word), 32)?;
    bs.write_bits(u64::from(codec.id()), 4)?;
    write_varint(&mut bs, input.len() as u32)?;
    write_varint(&mut bs, written as u32)?;
    encode_block(codec, &mut bs, &transformed)?;
    bs.into_inner()
}

/// Decompress one block produced by [`compress_block`].
pub fn decompress_block(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut bs = BitReader::new(bytes);
    let word = bs.read_bits(32)? as u32;
    let codec = EntropyCodecType::from_id(bs.read_bits(4)? as u32)?;
    let original_len = read_varint(&mut bs)? as usize;
    let transformed_len = read_varint(&mut bs)? as usize;

    if original_len > MAX_BLOCK_SIZE || transformed_len > MAX_BLOCK_SIZE {
        return Err(Error::invalid_format("block header declares absurd sizes"));
    }

    let mut transformed = vec![0u8; transformed_len];
    decode_block(codec, &mut bs, &mut transformed)?;

    let mut ctx = TransformContext::with_block_size(original_len);
    ctx.set("codec", codec.name());

    let mut sequence = TransformFactory::new_sequence(&ctx, word)?;
    let mut output = vec![0u8; original_len];
    let (_, produced) = sequence.inverse(&transformed, &mut output)?;

    if produced != original_len {
        return Err(Error::invalid_format(format!(
            "block decoded to {produced} bytes, expected {original_len}"
        )));
    }

    Ok(output)
}
