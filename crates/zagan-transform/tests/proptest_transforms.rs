//! Property-based round trips for the individual transforms.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use zagan_core::ByteTransform;
use zagan_transform::{Bwt, Bwts, Lz4Codec, Mtft, Sbrt, SbrtMode, SnappyCodec, TransformSequence};

fn block_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..1500),
        prop::collection::vec(0u8..3, 0..1500),
        prop::collection::vec(any::<u8>(), 1..32).prop_map(|seed| {
            seed.iter().cycle().take(seed.len() * 30).copied().collect()
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        ..ProptestConfig::default()
    })]

    #[test]
    fn mtft_roundtrip(block in block_strategy()) {
        let mut t = Mtft::new();
        let mut mid = vec![0u8; block.len()];
        t.forward(&block, &mut mid).unwrap();
        let mut out = vec![0u8; block.len()];
        t.inverse(&mid, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }

    #[test]
    fn sbrt_roundtrip(block in block_strategy(), mode in 0usize..3) {
        let mode = [SbrtMode::Mtf, SbrtMode::Rank, SbrtMode::Timestamp][mode];
        let mut t = Sbrt::new(mode);
        let mut mid = vec![0u8; block.len()];
        t.forward(&block, &mut mid).unwrap();
        let mut out = vec![0u8; block.len()];
        t.inverse(&mid, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }

    #[test]
    fn bwt_roundtrip(block in block_strategy()) {
        let mut t = Bwt::new();
        let mut mid = vec![0u8; block.len()];
        t.forward(&block, &mut mid).unwrap();
        let mut out = vec![0u8; block.len()];
        t.inverse(&mid, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }

    #[test]
    fn bwts_roundtrip(block in block_strategy()) {
        let mut t = Bwts::new();
        let mut mid = vec![0u8; block.len()];
        t.forward(&block, &mut mid).unwrap();
        let mut out = vec![0u8; block.len()];
        t.inverse(&mid, &mut out).unwrap();
        prop_assert_eq!(out, block);
    }

    #[test]
    fn lz_codecs_roundtrip(block in block_strategy()) {
        let mut lz4 = Lz4Codec::new();
        let mut mid = vec![0u8; lz4.max_encoded_len(block.len())];
        let (_, written) = lz4.forward(&block, &mut mid).unwrap();
        let mut out = vec![0u8; block.len()];
        let (_, produced) = lz4.inverse(&mid[..written], &mut out).unwrap();
        prop_assert_eq!(produced, block.len());
        prop_assert_eq!(&out, &block);

        let mut snappy = SnappyCodec::new();
        let mut mid = vec![0u8; snappy.max_encoded_len(block.len())];
        let (_, written) = snappy.forward(&block, &mut mid).unwrap();
        let mut out = vec![0u8; block.len()];
        let (_, produced) = snappy.inverse(&mid[..written], &mut out).unwrap();
        prop_assert_eq!(produced, block.len());
        prop_assert_eq!(&out, &block);
    }
}

#[test]
fn bwt_parallel_inverse_matches_sequential_on_random_data() {
    let mut rng = StdRng::seed_from_u64(71);
    let data: Vec<u8> = (0..(2 << 20) + 999)
        .map(|_| if rng.gen_bool(0.7) { rng.gen_range(b'a'..b'f') } else { rng.gen() })
        .collect();

    let mut enc = Bwt::new();
    let mut mid = vec![0u8; data.len()];
    enc.forward(&data, &mut mid).unwrap();

    let mut sequential = Bwt::new();
    let mut parallel = Bwt::with_jobs(4).unwrap();

    for k in 0..zagan_transform::bwt_chunks(data.len()) {
        sequential.set_primary_index(k, enc.primary_index(k)).unwrap();
        parallel.set_primary_index(k, enc.primary_index(k)).unwrap();
    }

    let mut out_seq = vec![0u8; data.len()];
    sequential.inverse(&mid, &mut out_seq).unwrap();
    let mut out_par = vec![0u8; data.len()];
    parallel.inverse(&mid, &mut out_par).unwrap();

    assert_eq!(out_seq, out_par);
    assert_eq!(out_seq, data);
}

#[test]
fn eight_stage_sequence_roundtrips() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut data = Vec::new();

    for _ in 0..400 {
        let b: u8 = rng.gen_range(b'a'..b'h');
        data.extend(std::iter::repeat(b).take(rng.gen_range(1..20)));
    }

    let transforms: Vec<Box<dyn ByteTransform + Send>> = vec![
        Box::new(Mtft::new()),
        Box::new(Sbrt::new(SbrtMode::Rank)),
        Box::new(Sbrt::new(SbrtMode::Timestamp)),
        Box::new(Mtft::new()),
        Box::new(Sbrt::new(SbrtMode::Mtf)),
        Box::new(Mtft::new()),
        Box::new(Sbrt::new(SbrtMode::Rank)),
        Box::new(Mtft::new()),
    ];
    let mut seq = TransformSequence::new(transforms).unwrap();

    let mut mid = vec![0u8; seq.max_encoded_len(data.len())];
    let (_, written) = seq.forward(&data, &mut mid).unwrap();
    let mut out = vec![0u8; data.len()];
    let (_, produced) = seq.inverse(&mid[..written], &mut out).unwrap();
    assert_eq!(produced, data.len());
    assert_eq!(out, data);
}
