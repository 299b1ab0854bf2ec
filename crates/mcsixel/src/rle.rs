//! SIXEL repeat introducer (`!<count><char>`) compression.

use crate::{Result, SixelError, SIXEL_REPEAT};

/// Runs at or below this length are cheaper written out verbatim.
const MAX_VERBATIM_RUN: usize = 2;

/// Compress runs of identical characters.
///
/// Runs longer than two characters become `!<count><char>`, shorter ones
/// are copied as-is.
pub fn rle_encode(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    let Some(mut current) = chars.next() else {
        return out;
    };
    let mut count = 1;

    for ch in chars {
        if ch == current {
            count += 1;
        } else {
            push_run(&mut out, current, count);
            current = ch;
            count = 1;
        }
    }
    push_run(&mut out, current, count);
    out
}

fn push_run(out: &mut String, ch: char, count: usize) {
    if count > MAX_VERBATIM_RUN {
        out.push(SIXEL_REPEAT);
        out.push_str(&count.to_string());
        out.push(ch);
    } else {
        for _ in 0..count {
            out.push(ch);
        }
    }
}

/// Expand `!<count><char>` repeat introducers back into runs.
///
/// Inverts [`rle_encode`] only for text without `!` or digits, such as sixel
/// data characters (`?` through `~`).
pub fn rle_decode(encoded: &str) -> Result<String> {
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != SIXEL_REPEAT {
            out.push(ch);
            continue;
        }

        let mut count: usize = 0;
        let mut digits = 0;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            count = count
                .checked_mul(10)
                .and_then(|n| n.checked_add(d as usize))
                .ok_or(SixelError::IntegerOverflow)?;
            digits += 1;
            chars.next();
        }
        if digits == 0 {
            return Err(SixelError::InvalidArgument(
                "repeat introducer without a count".into(),
            ));
        }
        let repeated = chars.next().ok_or_else(|| {
            SixelError::InvalidArgument("repeat introducer without a character".into())
        })?;
        for _ in 0..count {
            out.push(repeated);
        }
    }
    Ok(out)
}
