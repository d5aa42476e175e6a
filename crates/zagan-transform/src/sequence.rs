//! Composition of transforms into one reversible pipeline stage.

use zagan_core::{ByteTransform, Error, Result};

/// An ordered list of 1 to 8 transforms applied as a single reversible
/// transform: forward runs slots `0..k`, inverse runs the inverses in
/// reverse slot order. A failing stage aborts the whole block and reports
/// its slot index.
pub struct TransformSequence {
    transforms: Vec<Box<dyn ByteTransform + Send>>,
    buffers: [Vec<u8>; 2],
}

impl TransformSequence {
    /// Build a sequence from 1 to 8 transforms.
    pub fn new(transforms: Vec<Box<dyn ByteTransform + Send>>) -> Result<Self> {
        if transforms.is_empty() || transforms.len() > 8 {
            return Err(Error::invalid_argument(format!(
                "invalid number of transforms: {} (must be in [1..8])",
                transforms.len()
            )));
        }

        Ok(Self {
            transforms,
            buffers: [Vec::new(), Vec::new()],
        })
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Always false: a sequence holds at least the null transform.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl ByteTransform for TransformSequence {
    fn forward(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let last = self.transforms.len() - 1;
        let mut cur_len = src.len();
        let mut cur_buf = 0usize;

        for (i, t) in self.transforms.iter_mut().enumerate() {
            let cap = t.max_encoded_len(cur_len);
            let (input_is_src, out_buf) = if i == 0 {
                (true, 0)
            } else {
                (false, 1 - cur_buf)
            };

            // Split the ping-pong pair so input and output can coexist.
            let (a, b) = self.buffers.split_at_mut(1);
            let (input, output): (&[u8], &mut Vec<u8>) = if input_is_src {
                (src, if out_buf == 0 { &mut a[0] } else { &mut b[0] })
            } else if cur_buf == 0 {
                (&a[0], &mut b[0])
            } else {
                (&b[0], &mut a[0])
            };

            if output.len() < cap {
                output.resize(cap, 0);
            }

            let (_, written) = t
                .forward(&input[..cur_len], &mut output[..cap])
                .map_err(|e| Error::stage(i, e))?;

            cur_len = written;
            cur_buf = out_buf;

            if i == last {
                if dst.len() < written {
                    return Err(Error::stage(
                        i,
                        Error::invalid_argument(format!(
                            "output buffer too small: {} < {written}",
                            dst.len()
                        )),
                    ));
                }

                dst[..written].copy_from_slice(&self.buffers[cur_buf][..written]);
            }
        }

        Ok((src.len(), cur_len))
    }

    fn inverse(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize)> {
        let k = self.transforms.len();

        // Intermediate outputs are the forward intermediates; every one of
        // them is bounded by the chained worst-case expansion of the
        // original block.
        let cap = self.max_encoded_len(dst.len()).max(16);
        let mut cur_len = src.len();
        let mut cur_buf = 0usize;

        for (back, t) in self.transforms.iter_mut().rev().enumerate() {
            let slot = k - 1 - back;
            let input_is_src = back == 0;

            if slot == 0 {
                // Final stage lands in the caller's buffer.
                let input: &[u8] = if input_is_src {
                    src
                } else {
                    &self.buffers[cur_buf]
                };

                let (_, written) = t
                    .inverse(&input[..cur_len], dst)
                    .map_err(|e| Error::stage(slot, e))?;

                return Ok((src.len(), written));
            }

            let out_buf = if input_is_src { 0 } else { 1 - cur_buf };
            let (a, b) = self.buffers.split_at_mut(1);
            let (input, output): (&[u8], &mut Vec<u8>) = if input_is_src {
                (src, if out_buf == 0 { &mut a[0] } else { &mut b[0] })
            } else if cur_buf == 0 {
                (&a[0], &mut b[0])
            } else {
                (&b[0], &mut a[0])
            };

            if output.len() < cap {
                output.resize(cap, 0);
            }

            let (_, written) = t
                .inverse(&input[..cur_len], &mut output[..cap])
                .map_err(|e| Error::stage(slot, e))?;

            cur_len = written;
            cur_buf = out_buf;
        }

        unreachable!("sequence has at least one transform")
    }

    fn max_encoded_len(&self, src_len: usize) -> usize {
        self.transforms
            .iter()
            .fold(src_len, |len, t| t.max_encoded_len(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mtft::Mtft;
    use crate::null::NullTransform;
    use crate::rlt::Rlt;
    use crate::zrlt::Zrlt;

    fn sequence(transforms: Vec<Box<dyn ByteTransform + Send>>) -> TransformSequence {
        TransformSequence::new(transforms).unwrap()
    }

    #[test]
    fn size_limits() {
        assert!(TransformSequence::new(Vec::new()).is_err());

        let nine: Vec<Box<dyn ByteTransform + Send>> = (0..9)
            .map(|_| Box::new(NullTransform::new()) as Box<dyn ByteTransform + Send>)
            .collect();
        assert!(TransformSequence::new(nine).is_err());
    }

    #[test]
    fn null_sequence_is_identity() {
        let mut seq = sequence(vec![Box::new(NullTransform::new())]);
        let data = vec![0x5Au8; 1024];
        let mut mid = vec![0u8; seq.max_encoded_len(data.len())];
        let (_, written) = seq.forward(&data, &mut mid).unwrap();
        assert_eq!(&mid[..written], &data[..]);

        let mut out = vec![0u8; data.len()];
        let (_, produced) = seq.inverse(&mid[..written], &mut out).unwrap();
        assert_eq!(produced, data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn chained_transforms_roundtrip() {
        let data = b"bbbbbbaaaaaabbbbbbaaaaaacccccc".repeat(40);
        let mut seq = sequence(vec![
            Box::new(Mtft::new()),
            Box::new(Zrlt::new()),
        ]);

        let mut mid = vec![0u8; seq.max_encoded_len(data.len())];
        let (_, written) = seq.forward(&data, &mut mid).unwrap();
        assert!(written < data.len());

        let mut out = vec![0u8; data.len()];
        let (_, produced) = seq.inverse(&mid[..written], &mut out).unwrap();
        assert_eq!(produced, data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn three_stage_roundtrip() {
        let data = b"deep stacks of transforms still invert cleanly ".repeat(60);
        let mut seq = sequence(vec![
            Box::new(Rlt::new()),
            Box::new(Mtft::new()),
            Box::new(NullTransform::new()),
        ]);

        let mut mid = vec![0u8; seq.max_encoded_len(data.len())];
        let (_, written) = seq.forward(&data, &mut mid).unwrap();
        let mut out = vec![0u8; data.len()];
        let (_, produced) = seq.inverse(&mid[..written], &mut out).unwrap();
        assert_eq!(produced, data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn failing_stage_reports_its_slot() {
        // ZRLT rejects run-free data; it sits at slot 1.
        let data: Vec<u8> = (1..=200u8).collect();
        let mut seq = sequence(vec![
            Box::new(NullTransform::new()),
            Box::new(Zrlt::new()),
        ]);

        let mut out = vec![0u8; seq.max_encoded_len(data.len())];
        let err = seq.forward(&data, &mut out).unwrap_err();

        match err {
            Error::Stage { index, .. } => assert_eq!(index, 1),
            other => panic!("expected a stage error, got {other}"),
        }
    }
}
