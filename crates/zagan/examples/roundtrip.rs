//! Compress and decompress a block through a chosen pipeline.
//!
//! ```sh
//! cargo run --example roundtrip -- "BWT+MTFT+ZRLT" ANS0
//! ```

use zagan::{compress_block, decompress_block, EntropyCodecType};

fn main() {
    let mut args = std::env::args().skip(1);
    let spec = args.next().unwrap_or_else(|| "BWT+MTFT+ZRLT".to_string());
    let codec_name = args.next().unwrap_or_else(|| "ANS0".to_string());
    let codec = EntropyCodecType::from_name(&codec_name).expect("entropy codec name");

    let data = include_bytes!("roundtrip.rs").repeat(50);

    let packed = compress_block(&data, &spec, codec, 2).expect("compress");
    let restored = decompress_block(&packed).expect("decompress");
    assert_eq!(restored, data);

    println!(
        "{spec} + {codec_name}: {} -> {} bytes ({:.2}x)",
        data.len(),
        packed.len(),
        data.len() as f64 / packed.len() as f64
    );
}
