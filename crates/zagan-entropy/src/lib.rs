//! # Zagan Entropy
//!
//! Entropy coders for the Zagan compression toolkit.
//!
//! ## Coders
//!
//! - [`AnsRangeEncoder`] / [`AnsRangeDecoder`] - chunked rANS, order 0/1
//! - [`BinaryEntropyEncoder`] / [`BinaryEntropyDecoder`] - arithmetic
//!   coder over any [`Predictor`] ([`FpaqPredictor`], [`CmPredictor`],
//!   [`TpaqPredictor`])
//! - [`HuffmanEncoder`] / [`HuffmanDecoder`] - canonical Huffman
//! - [`RangeEncoder`] / [`RangeDecoder`] - order-0 range coder
//! - [`ExpGolombEncoder`] / [`ExpGolombDecoder`] and
//!   [`RiceGolombEncoder`] / [`RiceGolombDecoder`] - variable-length codes
//! - [`NullEntropyCoder`] - raw pass-through
//!
//! All coders borrow a bit stream for the duration of a single encode or
//! decode call and own their statistics tables; none of them share state.

pub mod ans;
pub mod apm;
pub mod binary;
pub mod exp_golomb;
pub mod factory;
pub mod histogram;
pub mod huffman;
pub mod null;
pub mod predictor;
pub mod range;
pub mod rice_golomb;
pub mod tpaq;
pub mod utils;

pub use ans::{AnsRangeDecoder, AnsRangeEncoder};
pub use apm::LogisticApm;
pub use binary::{BinaryEntropyDecoder, BinaryEntropyEncoder};
pub use exp_golomb::{ExpGolombDecoder, ExpGolombEncoder};
pub use factory::{decode_block, encode_block, EntropyCodecType};
pub use huffman::{HuffmanDecoder, HuffmanEncoder};
pub use null::NullEntropyCoder;
pub use predictor::{CmPredictor, FpaqPredictor, Predictor};
pub use range::{RangeDecoder, RangeEncoder};
pub use rice_golomb::{RiceGolombDecoder, RiceGolombEncoder};
pub use tpaq::TpaqPredictor;
