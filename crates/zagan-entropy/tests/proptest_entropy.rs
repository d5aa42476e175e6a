//! Property-based round trips for the entropy coders.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use zagan_core::{BitReader, BitWriter};
use zagan_entropy::{
    AnsRangeDecoder, AnsRangeEncoder, BinaryEntropyDecoder, BinaryEntropyEncoder,
    ExpGolombDecoder, ExpGolombEncoder, FpaqPredictor, HuffmanDecoder, HuffmanEncoder,
    RangeDecoder, RangeEncoder, RiceGolombDecoder, RiceGolombEncoder,
};

fn block_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 1..2500),
        prop::collection::vec(0u8..5, 1..2500),
        prop::collection::vec(prop_oneof![Just(b'e'), Just(b't'), Just(b'a'), any::<u8>()], 1..2500),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        ..ProptestConfig::default()
    })]

    #[test]
    fn ans_roundtrip(block in block_strategy(), order in 0u32..2, lr in 8u32..17) {
        let mut encoder = AnsRangeEncoder::new(order, None, lr).unwrap();
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, &block).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut decoder = AnsRangeDecoder::new(order, None).unwrap();
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; block.len()];
        decoder.decode(&mut reader, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }

    #[test]
    fn huffman_roundtrip(block in block_strategy()) {
        let mut encoder = HuffmanEncoder::with_default_chunking();
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, &block).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut decoder = HuffmanDecoder::with_default_chunking();
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; block.len()];
        decoder.decode(&mut reader, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }

    #[test]
    fn range_roundtrip(block in block_strategy(), lr in 8u32..15) {
        let mut encoder = RangeEncoder::new(None, lr).unwrap();
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, &block).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut decoder = RangeDecoder::new(None).unwrap();
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; block.len()];
        decoder.decode(&mut reader, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }

    #[test]
    fn golomb_roundtrip(block in block_strategy(), signed in any::<bool>(), log_base in 1u32..13) {
        let eg = ExpGolombEncoder::new(signed);
        let mut writer = BitWriter::new(Vec::new());
        eg.encode(&mut writer, &block).unwrap();
        let bytes = writer.into_inner().unwrap();
        let egd = ExpGolombDecoder::new(signed);
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; block.len()];
        egd.decode(&mut reader, &mut out).unwrap();
        prop_assert_eq!(&out, &block);

        let rg = RiceGolombEncoder::new(signed, log_base).unwrap();
        let mut writer = BitWriter::new(Vec::new());
        rg.encode(&mut writer, &block).unwrap();
        let bytes = writer.into_inner().unwrap();
        let rgd = RiceGolombDecoder::new(signed, log_base).unwrap();
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; block.len()];
        rgd.decode(&mut reader, &mut out).unwrap();
        prop_assert_eq!(&out, &block);
    }

    #[test]
    fn binary_fpaq_roundtrip(block in block_strategy()) {
        let mut encoder = BinaryEntropyEncoder::new(FpaqPredictor::new());
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, &block).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut decoder = BinaryEntropyDecoder::new(FpaqPredictor::new());
        let mut reader = BitReader::new(bytes.as_slice());
        let mut out = vec![0u8; block.len()];
        decoder.decode(&mut reader, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }
}

// The entropy coders must agree bit-for-bit with themselves run twice:
// the streams are strict functions of their input.
#[test]
fn ans_streams_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(99);
    let block: Vec<u8> = (0..50_000).map(|_| rng.gen_range(0u8..60)).collect();

    let mut first = Vec::new();

    for _ in 0..2 {
        let mut encoder = AnsRangeEncoder::with_order(1).unwrap();
        let mut writer = BitWriter::new(Vec::new());
        encoder.encode(&mut writer, &block).unwrap();
        let bytes = writer.into_inner().unwrap();

        if first.is_empty() {
            first = bytes;
        } else {
            assert_eq!(first, bytes);
        }
    }
}
