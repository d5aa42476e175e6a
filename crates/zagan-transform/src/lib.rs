//! # Zagan Transform
//!
//! Reversible byte transforms for the Zagan compression toolkit, and the
//! machinery to compose up to eight of them into a single pipeline stage.
//!
//! ## Transforms
//!
//! - [`Bwt`] / [`BwtBlockCodec`] - Burrows-Wheeler Transform with a
//!   concurrent multi-chunk inverse
//! - [`Bwts`] - the bijective variant
//! - [`Mtft`], [`Zrlt`], [`Rlt`], [`Sbrt`] - rank and run-length passes
//! - [`Lz4Codec`], [`SnappyCodec`] - LZ block codecs
//! - [`X86Codec`] - call-target rewriting for machine code
//! - [`TextCodec`] - word-dictionary pass for text
//! - [`NullTransform`] - the identity
//!
//! ## Composition
//!
//! [`TransformFactory`] parses `+`-separated specification strings into a
//! packed 32-bit type word (the wire form) and instantiates
//! [`TransformSequence`] values from it. Forward applies slots in order;
//! inverse applies the inverses in reverse order; a failing stage aborts
//! the block and reports its slot.

pub mod bwt;
pub mod bwts;
pub mod factory;
pub mod lz4;
pub mod mtft;
pub mod null;
pub mod rlt;
pub mod sbrt;
pub mod sequence;
pub mod snappy;
pub mod suffix_array;
pub mod text;
pub mod x86;
pub mod zrlt;

pub use bwt::{bwt_chunks, Bwt, BwtBlockCodec};
pub use bwts::Bwts;
pub use factory::TransformFactory;
pub use lz4::Lz4Codec;
pub use mtft::Mtft;
pub use null::NullTransform;
pub use rlt::Rlt;
pub use sbrt::{Sbrt, SbrtMode};
pub use sequence::TransformSequence;
pub use snappy::SnappyCodec;
pub use text::TextCodec;
pub use x86::X86Codec;
pub use zrlt::Zrlt;
