//! Transform names, the packed 32-bit type word, and instantiation.
//!
//! A specification string like `BWT+MTFT+ZRLT` packs into a 32-bit word of
//! eight 4-bit transform identifiers, most significant nibble first. The
//! word is the wire encoding only; in code a sequence is a typed list of
//! transform instances produced by [`TransformFactory::new_sequence`].

use zagan_core::{ByteTransform, Error, Result, TransformContext};

use crate::bwt::BwtBlockCodec;
use crate::bwts::Bwts;
use crate::lz4::Lz4Codec;
use crate::mtft::Mtft;
use crate::null::NullTransform;
use crate::rlt::Rlt;
use crate::sbrt::{Sbrt, SbrtMode};
use crate::sequence::TransformSequence;
use crate::snappy::SnappyCodec;
use crate::text::TextCodec;
use crate::x86::X86Codec;
use crate::zrlt::Zrlt;

/// Identity / unused slot.
pub const NONE_TYPE: u32 = 0;
/// Burrows-Wheeler.
pub const BWT_TYPE: u32 = 1;
/// Burrows-Wheeler-Scott (bijective).
pub const BWTS_TYPE: u32 = 2;
/// LZ4 block codec.
pub const LZ4_TYPE: u32 = 3;
/// Snappy block codec.
pub const SNAPPY_TYPE: u32 = 4;
/// Run length.
pub const RLT_TYPE: u32 = 5;
/// Zero run length.
pub const ZRLT_TYPE: u32 = 6;
/// Move to front.
pub const MTFT_TYPE: u32 = 7;
/// Rank transform.
pub const RANK_TYPE: u32 = 8;
/// X86 call-target codec.
pub const X86_TYPE: u32 = 9;
/// Text codec.
pub const DICT_TYPE: u32 = 10;

/// Parser and instantiator for transform type words.
pub struct TransformFactory;

impl TransformFactory {
    /// Parse a `+`-separated specification into a packed type word.
    /// `NONE` tokens are identities and are dropped during packing; the
    /// empty or all-`NONE` specification packs to 0.
    pub fn parse_name(name: &str) -> Result<u32> {
        if name.trim().is_empty() {
            return Ok(0);
        }

        let tokens: Vec<&str> = name.split('+').collect();

        if tokens.len() > 8 {
            return Err(Error::invalid_argument(format!(
                "only 8 transforms allowed: {name}"
            )));
        }

        let mut res = 0u32;
        let mut shift = 28;

        for token in tokens {
            let t = Self::parse_token(token)?;

            if t != NONE_TYPE {
                res |= t << shift;
                shift -= 4;
            }
        }

        Ok(res)
    }

    fn parse_token(token: &str) -> Result<u32> {
        match token.to_uppercase().as_str() {
            "BWT" => Ok(BWT_TYPE),
            "BWTS" => Ok(BWTS_TYPE),
            "LZ4" => Ok(LZ4_TYPE),
            "SNAPPY" => Ok(SNAPPY_TYPE),
            "RLT" => Ok(RLT_TYPE),
            "ZRLT" => Ok(ZRLT_TYPE),
            "MTFT" => Ok(MTFT_TYPE),
            "RANK" => Ok(RANK_TYPE),
            "X86" => Ok(X86_TYPE),
            "TEXT" => Ok(DICT_TYPE),
            "NONE" => Ok(NONE_TYPE),
            _ => Err(Error::invalid_argument(format!(
                "unknown transform type: {token}"
            ))),
        }
    }

    /// Render a type word as its `+`-joined name; the all-zero word is
    /// `NONE`.
    pub fn name_of(function_type: u32) -> String {
        let mut parts = Vec::new();

        for i in 0..8 {
            let t = (function_type >> (28 - 4 * i)) & 0x0F;

            if t != NONE_TYPE {
                parts.push(Self::token_name(t));
            }
        }

        if parts.is_empty() {
            return Self::token_name(NONE_TYPE).to_string();
        }

        parts.join("+")
    }

    fn token_name(t: u32) -> &'static str {
        match t {
            NONE_TYPE => "NONE",
            BWT_TYPE => "BWT",
            BWTS_TYPE => "BWTS",
            LZ4_TYPE => "LZ4",
            SNAPPY_TYPE => "SNAPPY",
            RLT_TYPE => "RLT",
            ZRLT_TYPE => "ZRLT",
            MTFT_TYPE => "MTFT",
            RANK_TYPE => "RANK",
            X86_TYPE => "X86",
            DICT_TYPE => "TEXT",
            _ => "?",
        }
    }

    /// Instantiate the transform sequence a type word describes. The
    /// all-zero word yields a single null transform; identifiers in the
    /// reserved range are rejected.
    pub fn new_sequence(ctx: &TransformContext, function_type: u32) -> Result<TransformSequence> {
        let mut transforms: Vec<Box<dyn ByteTransform + Send>> = Vec::new();

        for i in 0..8 {
            let t = (function_type >> (28 - 4 * i)) & 0x0F;

            if t != NONE_TYPE {
                transforms.push(Self::new_token(ctx, t)?);
            }
        }

        if transforms.is_empty() {
            transforms.push(Box::new(NullTransform::new()));
        }

        TransformSequence::new(transforms)
    }

    fn new_token(ctx: &TransformContext, t: u32) -> Result<Box<dyn ByteTransform + Send>> {
        let jobs = ctx
            .int("jobs")
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(1)
            .max(1);

        match t {
            BWT_TYPE => Ok(Box::new(BwtBlockCodec::with_jobs(jobs)?)),
            BWTS_TYPE => Ok(Box::new(Bwts::new())),
            LZ4_TYPE => Ok(Box::new(Lz4Codec::new())),
            SNAPPY_TYPE => Ok(Box::new(SnappyCodec::new())),
            RLT_TYPE => Ok(Box::new(Rlt::new())),
            ZRLT_TYPE => Ok(Box::new(Zrlt::new())),
            MTFT_TYPE => Ok(Box::new(Mtft::new())),
            RANK_TYPE => Ok(Box::new(Sbrt::new(SbrtMode::Rank))),
            X86_TYPE => Ok(Box::new(X86Codec::new())),
            DICT_TYPE => Ok(Box::new(TextCodec::new(ctx)?)),
            NONE_TYPE => Ok(Box::new(NullTransform::new())),
            _ => Err(Error::unsupported(format!(
                "unknown transform type: {t}"
            ))),
        }
    }
}
