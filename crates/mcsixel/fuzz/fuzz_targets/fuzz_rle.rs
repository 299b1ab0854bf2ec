#![no_main]

use libfuzzer_sys::fuzz_target;
use mcsixel::{rle_decode, rle_encode};

fuzz_target!(|data: &[u8]| {
    // sixel data characters only: '?' (0x3f) through '~' (0x7e)
    let line: String = data.iter().map(|b| (0x3f + b % 64) as char).collect();

    let encoded = rle_encode(&line);
    assert!(encoded.len() <= line.len());
    assert_eq!(rle_decode(&encoded).expect("decode failed"), line);
});
