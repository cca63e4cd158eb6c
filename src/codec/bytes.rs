//! Big-endian integer and text primitives shared by every header parser.
//!
//! All multi-byte integers in PDB, MOBI and EXTH structures are big-endian.
//! Reads go through [`read_fixed`] so a short buffer always surfaces as
//! [`MobiError::TruncatedInput`] instead of a silently short slice.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use encoding_rs::Encoding;
use tracing::debug;

use crate::error::{MobiError, Result};

/// Decoder used when no encoding is given or the requested one is unknown.
pub fn default_encoding() -> &'static Encoding {
    encoding_rs::UTF_8
}

/// Read exactly `n` bytes, failing with `TruncatedInput` on a short read.
pub fn read_fixed<R: Read>(reader: &mut R, n: usize, context: &'static str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(n);
    reader.take(n as u64).read_to_end(&mut buf)?;
    if buf.len() < n {
        return Err(MobiError::TruncatedInput {
            context,
            needed: n,
            available: buf.len(),
        });
    }
    Ok(buf)
}

/// Read a big-endian `u16`.
pub fn read_u16<R: Read>(reader: &mut R, context: &'static str) -> Result<u16> {
    Ok(BigEndian::read_u16(&read_fixed(reader, 2, context)?))
}

/// Read a big-endian `u32`.
pub fn read_u32<R: Read>(reader: &mut R, context: &'static str) -> Result<u32> {
    Ok(BigEndian::read_u32(&read_fixed(reader, 4, context)?))
}

/// Big-endian unsigned decode of a 1–8 byte array. Longer inputs keep the
/// low-order 8 bytes.
pub fn be_to_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Big-endian encode of `value` into exactly `width` bytes, truncating high
/// bytes or zero-padding on the left as needed.
pub fn uint_to_be(value: u64, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    let be = value.to_be_bytes();
    let n = width.min(be.len());
    out[width - n..].copy_from_slice(&be[be.len() - n..]);
    out
}

/// Read a big-endian `u16` at `offset`, if the slice is long enough.
pub fn u16_at(bytes: &[u8], offset: usize) -> Option<u16> {
    bytes.get(offset..offset + 2).map(BigEndian::read_u16)
}

/// Read a big-endian `u32` at `offset`, if the slice is long enough.
pub fn u32_at(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes.get(offset..offset + 4).map(BigEndian::read_u32)
}

/// Overwrite a big-endian `u32` at `offset`. Returns `false` when out of range.
pub fn put_u32_at(bytes: &mut [u8], offset: usize, value: u32) -> bool {
    match bytes.get_mut(offset..offset + 4) {
        Some(slot) => {
            BigEndian::write_u32(slot, value);
            true
        }
        None => false,
    }
}

/// Resolve an encoding label, falling back to [`default_encoding`].
pub fn resolve_encoding(label: Option<&str>) -> &'static Encoding {
    match label {
        None => default_encoding(),
        Some(l) => Encoding::for_label(l.trim().as_bytes()).unwrap_or_else(|| {
            debug!(label = l, "Unsupported encoding label, using default");
            default_encoding()
        }),
    }
}

/// Map a MOBI/Windows code page number to an encoding.
pub fn encoding_for_codepage(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        65001 => Some(encoding_rs::UTF_8),
        1252 | 28591 => Some(encoding_rs::WINDOWS_1252),
        1250 | 28592 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        _ => None,
    }
}

/// Bytes up to (not including) the first NUL, or the whole slice.
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Decode fixed-length or NUL-terminated text.
///
/// An unknown `encoding` label falls back to [`default_encoding`]; malformed
/// sequences are replaced rather than reported.
pub fn decode_text(bytes: &[u8], encoding: Option<&str>) -> String {
    decode_with(bytes, resolve_encoding(encoding))
}

/// Decode text with an already-resolved encoding, stopping at the first NUL.
pub fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _had_errors) = encoding.decode_without_bom_handling(until_nul(bytes));
    text.into_owned()
}

/// Encode text with the labelled encoding, or [`default_encoding`].
pub fn encode_text(text: &str, encoding: Option<&str>) -> Vec<u8> {
    encode_with(text, resolve_encoding(encoding))
}

/// Encode text with an already-resolved encoding. Unmappable characters
/// become numeric character references, as `encoding_rs` does.
pub fn encode_with(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let (bytes, _, _) = encoding.encode(text);
    bytes.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_fixed_exact() {
        let mut cur = Cursor::new(vec![1u8, 2, 3, 4]);
        assert_eq!(read_fixed(&mut cur, 3, "test").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_read_fixed_short_read_fails() {
        let mut cur = Cursor::new(vec![1u8, 2]);
        match read_fixed(&mut cur, 4, "test") {
            Err(MobiError::TruncatedInput {
                needed, available, ..
            }) => {
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("expected TruncatedInput, got {other:?}"),
        }
    }

    #[test]
    fn test_be_to_uint_no_sign_extension() {
        assert_eq!(be_to_uint(&[0xFF]), 255);
        assert_eq!(be_to_uint(&[0xFF, 0xFE]), 0xFFFE);
        assert_eq!(be_to_uint(&[0x80, 0, 0, 0]), 0x8000_0000);
        assert_eq!(be_to_uint(&[1, 2, 3, 4, 5, 6, 7, 8]), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_uint_to_be_pads_and_truncates() {
        assert_eq!(uint_to_be(0x0102, 4), vec![0, 0, 1, 2]);
        assert_eq!(uint_to_be(0x0102_0304, 2), vec![3, 4]);
        assert_eq!(uint_to_be(7, 10), vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 7]);
    }

    #[test]
    fn test_decode_text_stops_at_nul() {
        assert_eq!(decode_text(b"Title\0\0garbage", None), "Title");
        assert_eq!(decode_text(b"NoNul", None), "NoNul");
    }

    #[test]
    fn test_decode_text_with_windows_1252() {
        assert_eq!(decode_text(&[0x4D, 0xFC, 0x6C], Some("windows-1252")), "Mül");
    }

    #[test]
    fn test_decode_text_unknown_label_falls_back() {
        assert_eq!(decode_text("héllo".as_bytes(), Some("no-such-charset")), "héllo");
    }

    #[test]
    fn test_encode_text_roundtrip_cp1252() {
        let bytes = encode_text("Müller", Some("cp1252"));
        assert_eq!(bytes, vec![0x4D, 0xFC, 0x6C, 0x6C, 0x65, 0x72]);
        assert_eq!(decode_text(&bytes, Some("cp1252")), "Müller");
    }

    #[test]
    fn test_codepage_lookup() {
        assert_eq!(encoding_for_codepage(65001), Some(encoding_rs::UTF_8));
        assert_eq!(encoding_for_codepage(1252), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(encoding_for_codepage(12345), None);
    }

    #[test]
    fn test_field_access_at_offset() {
        let mut buf = vec![0u8; 8];
        assert!(put_u32_at(&mut buf, 2, 0xDEAD_BEEF));
        assert_eq!(u32_at(&buf, 2), Some(0xDEAD_BEEF));
        assert_eq!(u16_at(&buf, 2), Some(0xDEAD));
        assert_eq!(u32_at(&buf, 6), None);
        assert!(!put_u32_at(&mut buf, 6, 1));
    }
}
