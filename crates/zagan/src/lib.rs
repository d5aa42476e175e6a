//! # Zagan
//!
//! A lossless data compression toolkit built as a pipeline of reversible
//! byte transforms composed with an entropy coder.
//!
//! Zagan is named after the 61st demon of the Ars Goetia, who turns water
//! into wine and metal into coin - transmuting data into denser forms.
//!
//! ## Shape of the pipeline
//!
//! ```text
//! raw block -> TransformSequence (up to 8 transforms) -> entropy coder -> bit stream
//! ```
//!
//! Decoding reverses the order using the 32-bit transform type word stored
//! by the framing layer.
//!
//! ## Example
//!
//! ```
//! use zagan::{compress_block, decompress_block, EntropyCodecType};
//!
//! let data = b"sing in me, muse, and through me tell the story ".repeat(100);
//! let packed = compress_block(&data, "BWT+MTFT+ZRLT", EntropyCodecType::Ans0, 1).unwrap();
//! assert!(packed.len() < data.len());
//! assert_eq!(decompress_block(&packed).unwrap(), data);
//! ```

pub mod pipeline;

pub use pipeline::{compress_block, decompress_block};

pub use zagan_core::{
    BitReader, BitWriter, ByteTransform, Cancellation, Error, Result, TransformContext,
};
pub use zagan_entropy::{
    AnsRangeDecoder, AnsRangeEncoder, BinaryEntropyDecoder, BinaryEntropyEncoder, CmPredictor,
    EntropyCodecType, ExpGolombDecoder, ExpGolombEncoder, FpaqPredictor, HuffmanDecoder,
    HuffmanEncoder, NullEntropyCoder, Predictor, RangeDecoder, RangeEncoder, RiceGolombDecoder, RiceGolombEncoder,
    TpaqPredictor,
};
pub use zagan_transform::{
    Bwt, BwtBlockCodec, Bwts, Lz4Codec, Mtft, NullTransform, Rlt, Sbrt, SbrtMode, SnappyCodec,
    TextCodec, TransformFactory, TransformSequence, X86Codec, Zrlt,
};
