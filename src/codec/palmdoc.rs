//! PalmDOC LZ77 decompression.
//!
//! Control byte ranges:
//!
//! ```text
//! 0x00        literal 0x00
//! 0x01..0x08  copy the next n bytes verbatim
//! 0x09..0x7F  literal byte
//! 0x80..0xBF  back-reference, combined with the next byte:
//!             distance = (combined >> 3) & 0x7FF, length = (combined & 7) + 3
//! 0xC0..0xFF  space followed by (byte ^ 0x80)
//! ```
//!
//! Decoding is best-effort: a step that would read past the input or reach
//! before the start of the output contributes nothing and decoding goes on.

use tracing::trace;

/// Decode a whole PalmDOC-compressed buffer.
pub fn decompress(input: &[u8]) -> Vec<u8> {
    decompress_bounded(input, 0)
}

/// Decode `input`, never interpreting the last `reserved_tail` bytes as
/// control bytes (they may still be consumed as operands of a preceding step).
pub fn decompress_bounded(input: &[u8], reserved_tail: usize) -> Vec<u8> {
    let stop = input.len().saturating_sub(reserved_tail);
    let mut out: Vec<u8> = Vec::with_capacity(input.len() * 2);
    let mut i = 0usize;

    while i < stop {
        let b = input[i];
        i += 1;

        match b {
            0x00 => out.push(0x00),
            0x01..=0x08 => {
                let n = b as usize;
                match input.get(i..i + n) {
                    Some(run) => out.extend_from_slice(run),
                    None => trace!(offset = i - 1, "Literal run past end of input"),
                }
                i += n;
            }
            0x09..=0x7F => out.push(b),
            0x80..=0xBF => {
                let Some(&b2) = input.get(i) else {
                    trace!(offset = i - 1, "Back-reference missing second byte");
                    i += 1;
                    continue;
                };
                i += 1;
                let combined = (u16::from(b) << 8) | u16::from(b2);
                let length = ((combined & 0x0007) + 3) as usize;
                let distance = ((combined >> 3) & 0x07FF) as usize;
                if distance == 0 || distance > out.len() {
                    trace!(offset = i - 2, distance, "Back-reference outside decoded output");
                    continue;
                }
                for _ in 0..length {
                    let byte = out[out.len() - distance];
                    out.push(byte);
                }
            }
            0xC0..=0xFF => {
                out.push(b' ');
                out.push(b ^ 0x80);
            }
        }
    }

    out
}
