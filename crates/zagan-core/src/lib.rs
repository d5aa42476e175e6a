//! # Zagan Core
//!
//! Core traits, types and bit-level streaming for the Zagan compression
//! toolkit.
//!
//! Zagan is named after the 61st demon of the Ars Goetia, who turns water
//! into wine and metal into coin - just as compression transmutes data into
//! denser representations.
//!
//! ## Design Philosophy
//!
//! - **Owned buffers, explicit lifetimes**: work buffers belong to the
//!   engine that fills them and grow through a single resize path
//! - **Slices at the seams**: blocks are plain `&[u8]` / `&mut [u8]`
//! - **No global state**: every table is per-instance; the math tables are
//!   compile-time constants
//!
//! ## Contents
//!
//! - [`Error`] / [`Result`] - the workspace-wide error type
//! - [`ByteTransform`] - the reversible transform contract
//! - [`BitWriter`] / [`BitReader`] - MSB-first bit streams over byte I/O
//! - [`TransformContext`] - string-keyed configuration consumed at
//!   transform construction
//! - [`Cancellation`] - cooperative cancellation token checked between
//!   chunks of long operations

pub mod bitstream;
pub mod cancel;
pub mod context;
pub mod error;
pub mod math;
pub mod traits;
pub mod varint;

pub use bitstream::{BitReader, BitWriter};
pub use cancel::Cancellation;
pub use context::TransformContext;
pub use error::{Error, Result};
pub use traits::ByteTransform;
