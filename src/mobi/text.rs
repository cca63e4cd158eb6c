//! Text extraction from the content records.

use tracing::{debug, warn};

use crate::codec::{bytes, palmdoc};
use crate::error::{MobiError, Result};
use crate::mobi::container::MobiContainer;
use crate::mobi::header::Compression;

/// Tag opening an index record stored among the text records.
pub const INDX_MAGIC: &[u8; 4] = b"INDX";

/// Bytes never read as control bytes when the trailing entries of a record
/// cannot be determined.
pub const CONSERVATIVE_TAIL: usize = 4;

/// Total size of the trailing entries appended to a text record.
///
/// Every set bit of `flags` above bit 0 announces one entry whose size is
/// stored as a backward varint in its last bytes; bit 0 announces multibyte
/// overlap bytes whose count sits in the low two bits of the byte before.
pub fn trailing_entries_size(record: &[u8], flags: u16) -> usize {
    let mut size = 0usize;
    let mut bits = flags >> 1;
    while bits != 0 {
        if bits & 1 != 0 {
            size += backward_varint(&record[..record.len().saturating_sub(size)]);
        }
        bits >>= 1;
    }
    if flags & 1 != 0 {
        if let Some(&b) = record.len().checked_sub(size + 1).and_then(|i| record.get(i)) {
            size += usize::from(b & 0x3) + 1;
        }
    }
    size.min(record.len())
}

/// Varint read backwards from the end of `data`: 7 bits per byte, the
/// first byte read with the high bit set ends it.
fn backward_varint(data: &[u8]) -> usize {
    let mut value = 0usize;
    let mut shift = 0u32;
    for &b in data.iter().rev() {
        value |= usize::from(b & 0x7F) << shift;
        shift += 7;
        if b & 0x80 != 0 || shift >= 28 {
            break;
        }
    }
    value
}

/// Cut `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

impl MobiContainer {
    /// Indices of the records holding text, in reading order.
    pub fn text_record_range(&self) -> std::ops::Range<usize> {
        let first = self.first_content_index();
        let mut end = match self.last_content_index() {
            Some(last) => last.saturating_sub(1),
            None => usize::from(self.header().text_record_count()) + 1,
        };
        if let Some(image) = self.first_image_index() {
            end = end.min(image);
        }
        end = end.min(self.record_count());
        first..end.max(first)
    }

    /// Decompressed bytes of text record `index`, trailing entries removed.
    pub fn decode_text_record(&self, index: usize) -> Result<Vec<u8>> {
        let raw = self.record_by_index(index)?;
        let compression = self.compression();
        let (body, reserved) = match self.header().extra_data_flags() {
            Some(flags) => (&raw[..raw.len() - trailing_entries_size(&raw, flags)], 0),
            None => (&raw[..], CONSERVATIVE_TAIL),
        };
        match compression {
            Compression::None => Ok(body.to_vec()),
            Compression::PalmDoc => Ok(palmdoc::decompress_bounded(body, reserved)),
            Compression::Huffman | Compression::Unknown(_) => Err(
                MobiError::UnsupportedCompression(self.header().compression_code()),
            ),
        }
    }

    /// The book's text decoded in its declared encoding.
    ///
    /// Index records are skipped and NUL bytes dropped. A record that cannot
    /// be decoded is replaced by a bracketed note and extraction goes on.
    pub fn text_content(&self) -> String {
        let range = self.text_record_range();
        let mut out = Vec::new();

        for index in range.clone() {
            match self.decode_text_record(index) {
                Ok(decoded) => {
                    if decoded.starts_with(INDX_MAGIC) {
                        debug!(record = index, "Skipping index record");
                        continue;
                    }
                    out.extend(decoded.into_iter().filter(|&b| b != 0));
                }
                Err(MobiError::UnsupportedCompression(code)) => {
                    warn!(record = index, code, "Unsupported compression");
                    out.extend_from_slice(
                        format!("[record {index}: unsupported compression {code}]").as_bytes(),
                    );
                }
                Err(e) => {
                    warn!(record = index, error = %e, "Text record unreadable");
                    out.extend_from_slice(format!("[record {index}: {e}]").as_bytes());
                }
            }
        }

        debug!(records = range.len(), bytes = out.len(), "Extracted text");
        bytes::decode_with(&out, self.character_encoding())
    }
}
