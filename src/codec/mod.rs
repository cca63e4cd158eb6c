//! Byte-level primitives: big-endian integers, text decoding, and PalmDOC decompression.

pub mod bytes;
pub mod palmdoc;
