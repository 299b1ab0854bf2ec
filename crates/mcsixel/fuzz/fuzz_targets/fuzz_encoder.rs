#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mcsixel::{sixel_encode, DitherMethod, EncodeOptions};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    width: u8,
    height: u8,
    pixels: Vec<u8>,
    max_colors: u16,
    dither: bool,
}

fuzz_target!(|input: FuzzInput| {
    let width = (input.width as usize).min(128);
    let height = (input.height as usize).min(128);

    // Ensure we have enough pixels (RGBA = 4 bytes per pixel)
    let expected_size = width * height * 4;
    if input.pixels.len() < expected_size {
        return;
    }

    let pixels = &input.pixels[..expected_size];
    let opts = EncodeOptions {
        max_colors: input.max_colors.clamp(1, 256),
        dither: if input.dither {
            DitherMethod::FloydSteinberg
        } else {
            DitherMethod::None
        },
    };

    // Valid input must always encode; an internal fault is a bug
    let sixel = sixel_encode(pixels, width, height, &opts).expect("encoding failed");
    assert!(sixel.starts_with("\x1bPq\""));
    assert!(sixel.ends_with("\x1b\\"));
});
