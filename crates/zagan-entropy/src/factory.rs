//! Entropy codec selection by name or stream identifier.

use std::io::{Read, Write};

use zagan_core::{BitReader, BitWriter, Error, Result};

use crate::ans::{AnsRangeDecoder, AnsRangeEncoder};
use crate::binary::{BinaryEntropyDecoder, BinaryEntropyEncoder};
use crate::exp_golomb::{ExpGolombDecoder, ExpGolombEncoder};
use crate::huffman::{HuffmanDecoder, HuffmanEncoder};
use crate::null::NullEntropyCoder;
use crate::predictor::{CmPredictor, FpaqPredictor};
use crate::range::{RangeDecoder, RangeEncoder};
use crate::tpaq::TpaqPredictor;

/// The entropy coders the toolkit can put behind a transform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyCodecType {
    None,
    Huffman,
    Ans0,
    Ans1,
    Range,
    Fpaq,
    Cm,
    Tpaq,
    ExpGolomb,
}

impl EntropyCodecType {
    /// Parse a codec name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "HUFFMAN" => Ok(Self::Huffman),
            "ANS0" => Ok(Self::Ans0),
            "ANS1" => Ok(Self::Ans1),
            "RANGE" => Ok(Self::Range),
            "FPAQ" => Ok(Self::Fpaq),
            "CM" => Ok(Self::Cm),
            "TPAQ" => Ok(Self::Tpaq),
            "EXPGOLOMB" => Ok(Self::ExpGolomb),
            _ => Err(Error::invalid_argument(format!(
                "unknown entropy codec: {name}"
            ))),
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Huffman => "HUFFMAN",
            Self::Ans0 => "ANS0",
            Self::Ans1 => "ANS1",
            Self::Range => "RANGE",
            Self::Fpaq => "FPAQ",
            Self::Cm => "CM",
            Self::Tpaq => "TPAQ",
            Self::ExpGolomb => "EXPGOLOMB",
        }
    }

    /// Compact stream identifier.
    pub fn id(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Huffman => 1,
            Self::Ans0 => 2,
            Self::Ans1 => 3,
            Self::Range => 4,
            Self::Fpaq => 5,
            Self::Cm => 6,
            Self::Tpaq => 7,
            Self::ExpGolomb => 8,
        }
    }

    /// Inverse of [`EntropyCodecType::id`]; rejects reserved identifiers.
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::Huffman),
            2 => Ok(Self::Ans0),
            3 => Ok(Self::Ans1),
            4 => Ok(Self::Range),
            5 => Ok(Self::Fpaq),
            6 => Ok(Self::Cm),
            7 => Ok(Self::Tpaq),
            8 => Ok(Self::ExpGolomb),
            _ => Err(Error::unsupported(format!("unknown entropy codec id: {id}"))),
        }
    }
}

/// Encode `block` with the selected codec at default parameters.
pub fn encode_block<W: Write>(
    codec: EntropyCodecType,
    bs: &mut BitWriter<W>,
    block: &[u8],
) -> Result<usize> {
    match codec {
        EntropyCodecType::None => NullEntropyCoder::new().encode(bs, block),
        EntropyCodecType::Huffman => HuffmanEncoder::with_default_chunking().encode(bs, block),
        EntropyCodecType::Ans0 => AnsRangeEncoder::with_order(0)?.encode(bs, block),
        EntropyCodecType::Ans1 => AnsRangeEncoder::with_order(1)?.encode(bs, block),
        EntropyCodecType::Range => RangeEncoder::new(None, 12)?.encode(bs, block),
        EntropyCodecType::Fpaq => BinaryEntropyEncoder::new(FpaqPredictor::new()).encode(bs, block),
        EntropyCodecType::Cm => BinaryEntropyEncoder::new(CmPredictor::new()).encode(bs, block),
        EntropyCodecType::Tpaq => BinaryEntropyEncoder::new(TpaqPredictor::new()).encode(bs, block),
        EntropyCodecType::ExpGolomb => ExpGolombEncoder::new(false).encode(bs, block),
    }
}

/// Decode `block.len()` bytes with the selected codec.
pub fn decode_block<R: Read>(
    codec: EntropyCodecType,
    bs: &mut BitReader<R>,
    block: &mut [u8],
) -> Result<usize> {
    match codec {
        EntropyCodecType::None => NullEntropyCoder::new().decode(bs, block),
        EntropyCodecType::Huffman => HuffmanDecoder::with_default_chunking().decode(bs, block),
        EntropyCodecType::Ans0 => AnsRangeDecoder::with_order(0)?.decode(bs, block),
        EntropyCodecType::Ans1 => AnsRangeDecoder::with_order(1)?.decode(bs, block),
        EntropyCodecType::Range => RangeDecoder::new(None)?.decode(bs, block),
        EntropyCodecType::Fpaq => BinaryEntropyDecoder::new(FpaqPredictor::new()).decode(bs, block),
        EntropyCodecType::Cm => BinaryEntropyDecoder::new(CmPredictor::new()).decode(bs, block),
        EntropyCodecType::Tpaq => BinaryEntropyDecoder::new(TpaqPredictor::new()).decode(bs, block),
        EntropyCodecType::ExpGolomb => ExpGolombDecoder::new(false).decode(bs, block),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for name in ["NONE", "HUFFMAN", "ANS0", "ANS1", "RANGE", "FPAQ", "CM", "TPAQ", "EXPGOLOMB"]
        {
            let codec = EntropyCodecType::from_name(name).unwrap();
            assert_eq!(codec.name(), name);
            assert_eq!(EntropyCodecType::from_id(codec.id()).unwrap(), codec);
        }

        assert!(EntropyCodecType::from_name("huffman").is_ok());
        assert!(EntropyCodecType::from_name("LZW").is_err());
        assert!(EntropyCodecType::from_id(15).is_err());
    }
}
