//! X86 call-target codec.
//!
//! Rewrites the 32-bit relative displacements of near CALL/JMP
//! instructions (opcodes 0xE8/0xE9) into absolute targets, which repeat
//! across a binary and compress far better than relative offsets. Only
//! displacements with a clean sign byte (0x00 or 0xFF) are rewritten; a
//! rewritten site is marked with an escape byte after the opcode, and a
//! payload tag keeps literal escape bytes unambiguous.
//!
//! Adapted from the MCM X86 binary filter lineage.

use zagan_core::{ByteTransform, Error, Result};

const INSTRUCTION_MASK: u8 = 0xFE;
const INSTRUCTION_JUMP: u8 = 0xE8;
const ADDRESS_MASK: u8 = 0xD5;
const ESCAPE: u8 = 0x02;

const TAG_ADDRESS: u8 = 0x00;
const TAG_LITERAL: u8 = 0x01;

/// X86 call-target codec.
#[derive(Debug, Default)]
pub struct X86Codec;

impl X86Codec {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn is_jump(b: u8) -> bool {
        b & INSTRUCTION_MASK == INSTRUCTION_JUMP
    }
}

impl ByteTransform for X86Codec {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        if src.len() < 16 {
            return Err(Error::invalid_argument("block too short for the X86 codec"));
        }

        // Gate on jump density; plain data is not worth the escapes.
        let jumps = src.iter().filter(|&&b| Self::is_jump(b)).count();

        if jumps * 100 < src.len() {
            return Err(Error::invalid_argument(
                "not enough jump instructions for the X86 codec",
            ));
        }

        let mut src_idx = 0;
        let mut dst_idx = 0;

        while src_idx < src.len() {
            if dst_idx >= dst.len() {
                return Err(Error::invalid_argument("data not compressible with X86"));
            }

            let b = src[src_idx];
            dst[dst_idx] = b;
            src_idx += 1;
            dst_idx += 1;

            if !Self::is_jump(b) {
                continue;
            }

            if src_idx + 4 <= src.len() {
                let sgn = src[src_idx + 3];

                if sgn == 0 || sgn == 0xFF {
                    // Relative displacement: rewrite as the absolute
                    // target of the following instruction.
                    let displacement =
                        i32::from_le_bytes(src[src_idx..src_idx + 4].try_into().unwrap());
                    let addr = displacement.wrapping_add(src_idx as i32 + 4) as u32;

                    if dst_idx + 6 > dst.len() {
                        return Err(Error::invalid_argument("data not compressible with X86"));
                    }

                    dst[dst_idx] = ESCAPE;
                    dst[dst_idx + 1] = TAG_ADDRESS;

                    for (k, byte) in addr.to_be_bytes().iter().enumerate() {
                        dst[dst_idx + 2 + k] = byte ^ ADDRESS_MASK;
                    }

                    src_idx += 4;
                    dst_idx += 6;
                    continue;
                }
            }

            // A literal escape byte right after an opcode needs its own tag.
            if src_idx < src.len() && src[src_idx] == ESCAPE {
                if dst_idx + 2 > dst.len() {
                    return Err(Error::invalid_argument("data not compressible with X86"));
                }

                dst[dst_idx] = ESCAPE;
                dst[dst_idx + 1] = TAG_LITERAL;
                src_idx += 1;
                dst_idx += 2;
            }
        }

        Ok((src_idx, dst_idx))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let mut src_idx = 0;
        let mut dst_idx = 0;

        while src_idx < src.len() {
            if dst_idx >= dst.len() {
                return Err(Error::invalid_format_at("output block overflow", src_idx));
            }

            let b = src[src_idx];
            dst[dst_idx] = b;
            src_idx += 1;
            dst_idx += 1;

            if !Self::is_jump(b) {
                continue;
            }

            if src_idx < src.len() && src[src_idx] == ESCAPE {
                if src_idx + 1 >= src.len() {
                    return Err(Error::invalid_format_at("truncated X86 escape", src_idx));
                }

                match src[src_idx + 1] {
                    TAG_LITERAL => {
                        dst[dst_idx] = ESCAPE;
                        src_idx += 2;
                        dst_idx += 1;
                    }
                    TAG_ADDRESS => {
                        if src_idx + 6 > src.len() {
                            return Err(Error::invalid_format_at(
                                "truncated X86 address",
                                src_idx,
                            ));
                        }

                        if dst_idx + 4 > dst.len() {
                            return Err(Error::invalid_format_at(
                                "output block overflow",
                                src_idx,
                            ));
                        }

                        let mut raw = [0u8; 4];

                        for (k, byte) in raw.iter_mut().enumerate() {
                            *byte = src[src_idx + 2 + k] ^ ADDRESS_MASK;
                        }

                        let addr = u32::from_be_bytes(raw) as i32;
                        let displacement = addr.wrapping_sub(dst_idx as i32 + 4);
                        dst[dst_idx..dst_idx + 4].copy_from_slice(&displacement.to_le_bytes());
                        src_idx += 6;
                        dst_idx += 4;
                    }
                    tag => {
                        return Err(Error::invalid_format_at(
                            format!("invalid X86 escape tag {tag}"),
                            src_idx,
                        ));
                    }
                }
            }
        }

        Ok((src_idx, dst_idx))
    }

    fn max_encoded_len(&self, src_len: usize) -> usize {
        // Worst case: a transformable jump every 5 bytes gains 2 bytes.
        src_len + (src_len >> 1) + 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A synthetic code block: jumps with small displacements between
    // filler instruction bytes.
    fn synthetic_code(jumps: usize) -> Vec<u8> {
        let mut data = Vec::new();

        for i in 0..jumps {
            data.push(if i % 2 == 0 { 0xE8 } else { 0xE9 });
            let disp: i32 = ((i as i32) % 1000) - 500;
            data.extend_from_slice(&disp.to_le_bytes());
            data.extend_from_slice(&[0x55, 0x8B, 0xEC]);
        }

        data
    }

    fn roundtrip(data: &[u8]) -> Vec<u8> {
        let mut t = X86Codec::new();
        let mut mid = vec![0u8; t.max_encoded_len(data.len())];
        let (read, written) = t.forward(data, &mut mid).unwrap();
        assert_eq!(read, data.len());
        let mut out = vec![0u8; data.len()];
        let (_, produced) = t.inverse(&mid[..written], &mut out).unwrap();
        assert_eq!(produced, data.len());
        out
    }

    #[test]
    fn code_block_roundtrip() {
        let data = synthetic_code(200);
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn low_jump_density_is_rejected() {
        let data = vec![0x41u8; 4096];
        let mut t = X86Codec::new();
        let mut out = vec![0u8; t.max_encoded_len(data.len())];
        assert!(t.forward(&data, &mut out).is_err());
    }

    #[test]
    fn literal_escape_after_opcode_roundtrips() {
        // 0xE8 followed by the escape byte itself, not a displacement.
        let mut data = synthetic_code(40);
        data.extend_from_slice(&[0xE8, ESCAPE, 0x90, 0x33, 0x17]);
        data.extend_from_slice(&synthetic_code(40));
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn trailing_jump_opcode_roundtrips() {
        let mut data = synthetic_code(40);
        data.push(0xE9);
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn negative_displacements_roundtrip() {
        let mut data = Vec::new();

        for _ in 0..64 {
            data.push(0xE8);
            data.extend_from_slice(&(-42i32).to_le_bytes());
        }

        assert_eq!(roundtrip(&data), data);
    }
}
