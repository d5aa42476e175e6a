//! String-keyed configuration consumed at transform construction.

use std::collections::HashMap;

/// A case-sensitive string map of configuration options.
///
/// Recognized keys are `blockSize` (integer), `codec` (string) and
/// `bsVersion` (integer); unknown keys are ignored by all consumers.
/// Transforms that require a key fail construction with an
/// invalid-argument error when it is missing.
#[derive(Debug, Clone, Default)]
pub struct TransformContext {
    entries: HashMap<String, String>,
}

impl TransformContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context pre-populated with the current block size.
    pub fn with_block_size(block_size: usize) -> Self {
        let mut ctx = Self::new();
        ctx.set("blockSize", block_size.to_string());
        ctx
    }

    /// Set a key to a value, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Get a raw string value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get an integer value; `None` when absent or unparseable.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key)?.parse().ok()
    }

    /// The `blockSize` entry.
    pub fn block_size(&self) -> Option<usize> {
        self.int("blockSize").and_then(|v| usize::try_from(v).ok())
    }

    /// The `codec` entry: name of the downstream entropy coder.
    pub fn codec(&self) -> Option<&str> {
        self.get("codec")
    }

    /// The `bsVersion` entry: bit-stream format version for backward decode.
    pub fn bs_version(&self) -> Option<u32> {
        self.int("bsVersion").and_then(|v| u32::try_from(v).ok())
    }
}
