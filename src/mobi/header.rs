//! Record 0: the PalmDOC header, the MOBI header, the optional EXTH block
//! and the book's full name.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ PalmDOC header (16 bytes)            │  compression, text length,
//! │                                      │  text record count/size, encryption
//! ├──────────────────────────────────────┤
//! │ MOBI header ("MOBI", length, …)      │  kept as opaque bytes, read
//! │                                      │  through field accessors
//! ├──────────────────────────────────────┤
//! │ EXTH block (if exth_flags & 0x40)    │
//! ├──────────────────────────────────────┤
//! │ remainder (opaque)                   │
//! │ full name (full_name_offset/length)  │
//! │ trailing filler                      │
//! └──────────────────────────────────────┘
//! ```

use std::io::{Cursor, Write};

use encoding_rs::Encoding;
use tracing::debug;

use crate::codec::bytes::{self, put_u32_at, u16_at, u32_at};
use crate::error::{MobiError, Result};
use crate::exth::{ExthHeader, ExthRecord};
use crate::exth::header::padding_size;

/// Size of the PalmDOC header at the start of record 0.
pub const PALMDOC_HEADER_SIZE: usize = 16;

/// Identifier of the MOBI header.
pub const MOBI_MAGIC: &[u8; 4] = b"MOBI";

/// Bit in `exth_flags` announcing an EXTH block.
pub const EXTH_FLAG: u32 = 0x40;

/// "No record" marker used by index fields.
pub const NULL_INDEX: u32 = 0xFFFF_FFFF;

/// Field offsets relative to the start of record 0.
pub mod fields {
    pub const COMPRESSION: usize = 0x00;
    pub const TEXT_LENGTH: usize = 0x04;
    pub const TEXT_RECORD_COUNT: usize = 0x08;
    pub const TEXT_RECORD_SIZE: usize = 0x0A;
    pub const ENCRYPTION_TYPE: usize = 0x0C;
    pub const IDENTIFIER: usize = 0x10;
    pub const HEADER_LENGTH: usize = 0x14;
    pub const MOBI_TYPE: usize = 0x18;
    pub const TEXT_ENCODING: usize = 0x1C;
    pub const UNIQUE_ID: usize = 0x20;
    pub const FILE_VERSION: usize = 0x24;
    pub const FIRST_NON_BOOK_INDEX: usize = 0x50;
    pub const FULL_NAME_OFFSET: usize = 0x54;
    pub const FULL_NAME_LENGTH: usize = 0x58;
    pub const LOCALE: usize = 0x5C;
    pub const INPUT_LANGUAGE: usize = 0x60;
    pub const OUTPUT_LANGUAGE: usize = 0x64;
    pub const MIN_VERSION: usize = 0x68;
    pub const FIRST_IMAGE_INDEX: usize = 0x6C;
    pub const HUFFMAN_RECORD_OFFSET: usize = 0x70;
    pub const HUFFMAN_RECORD_COUNT: usize = 0x74;
    pub const EXTH_FLAGS: usize = 0x80;
    pub const FIRST_CONTENT_INDEX: usize = 0xC0;
    pub const LAST_CONTENT_INDEX: usize = 0xC2;
    pub const EXTRA_DATA_FLAGS: usize = 0xF2;
}

/// Text record compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    PalmDoc,
    Huffman,
    Unknown(u16),
}

impl Compression {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::None,
            2 => Self::PalmDoc,
            17480 => Self::Huffman,
            n => Self::Unknown(n),
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::PalmDoc => "PalmDOC".to_string(),
            Self::Huffman => "HUFF/CDIC".to_string(),
            Self::Unknown(n) => format!("unknown ({n})"),
        }
    }
}

/// The embedded header held in record 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobiHeader {
    fixed: Vec<u8>,
    exth: Option<ExthHeader>,
    remainder: Vec<u8>,
    full_name: Vec<u8>,
    trailing: Vec<u8>,
}

impl MobiHeader {
    /// Parse the whole of record 0.
    pub fn parse(record0: &[u8]) -> Result<Self> {
        if record0.len() < PALMDOC_HEADER_SIZE {
            return Err(MobiError::TruncatedInput {
                context: "PalmDOC header",
                needed: PALMDOC_HEADER_SIZE,
                available: record0.len(),
            });
        }

        let has_mobi = record0.get(fields::IDENTIFIER..fields::IDENTIFIER + 4) == Some(&MOBI_MAGIC[..]);
        let fixed_len = if has_mobi {
            let declared = u32_at(record0, fields::HEADER_LENGTH).ok_or(MobiError::TruncatedInput {
                context: "MOBI header length",
                needed: fields::HEADER_LENGTH + 4,
                available: record0.len(),
            })?;
            PALMDOC_HEADER_SIZE + declared as usize
        } else {
            PALMDOC_HEADER_SIZE
        };
        if fixed_len > record0.len() {
            return Err(MobiError::TruncatedInput {
                context: "MOBI header",
                needed: fixed_len,
                available: record0.len(),
            });
        }
        let fixed = record0[..fixed_len].to_vec();

        let exth_flags = u32_at(&fixed, fields::EXTH_FLAGS).unwrap_or(0);
        let mut cursor = Cursor::new(&record0[fixed_len..]);
        let exth = if has_mobi && exth_flags & EXTH_FLAG != 0 {
            Some(ExthHeader::parse(&mut cursor)?)
        } else {
            None
        };
        let pos = fixed_len + cursor.position() as usize;

        let name_offset = u32_at(&fixed, fields::FULL_NAME_OFFSET).unwrap_or(0) as usize;
        let name_length = u32_at(&fixed, fields::FULL_NAME_LENGTH).unwrap_or(0) as usize;

        let (remainder, full_name, trailing) = if has_mobi && name_length > 0 {
            let name_end = name_offset + name_length;
            if name_offset < pos || name_end > record0.len() {
                return Err(MobiError::MalformedRecord(format!(
                    "full name at {name_offset}..{name_end} outside {pos}..{}",
                    record0.len()
                )));
            }
            (
                record0[pos..name_offset].to_vec(),
                record0[name_offset..name_end].to_vec(),
                record0[name_end..].to_vec(),
            )
        } else {
            (record0[pos..].to_vec(), Vec::new(), Vec::new())
        };

        Ok(Self {
            fixed,
            exth,
            remainder,
            full_name,
            trailing,
        })
    }

    fn u16_field(&self, offset: usize) -> Option<u16> {
        u16_at(&self.fixed, offset)
    }

    fn u32_field(&self, offset: usize) -> Option<u32> {
        u32_at(&self.fixed, offset)
    }

    /// Whether record 0 carries a MOBI header (and not just PalmDOC).
    pub fn has_mobi_header(&self) -> bool {
        self.fixed.len() > PALMDOC_HEADER_SIZE
    }

    pub fn compression_code(&self) -> u16 {
        self.u16_field(fields::COMPRESSION).unwrap_or(1)
    }

    pub fn compression(&self) -> Compression {
        Compression::from_code(self.compression_code())
    }

    pub fn text_length(&self) -> u32 {
        self.u32_field(fields::TEXT_LENGTH).unwrap_or(0)
    }

    pub fn text_record_count(&self) -> u16 {
        self.u16_field(fields::TEXT_RECORD_COUNT).unwrap_or(0)
    }

    pub fn text_record_size(&self) -> u16 {
        self.u16_field(fields::TEXT_RECORD_SIZE).unwrap_or(0)
    }

    pub fn encryption_type(&self) -> u16 {
        self.u16_field(fields::ENCRYPTION_TYPE).unwrap_or(0)
    }

    /// Declared MOBI header length (includes the identifier).
    pub fn mobi_header_length(&self) -> Option<u32> {
        self.has_mobi_header()
            .then(|| self.u32_field(fields::HEADER_LENGTH))
            .flatten()
    }

    pub fn mobi_type(&self) -> Option<u32> {
        self.u32_field(fields::MOBI_TYPE)
    }

    /// Code page of the text (1252 when no MOBI header is present).
    pub fn text_encoding(&self) -> u32 {
        self.u32_field(fields::TEXT_ENCODING).unwrap_or(1252)
    }

    pub fn unique_id(&self) -> Option<u32> {
        self.u32_field(fields::UNIQUE_ID)
    }

    pub fn file_version(&self) -> Option<u32> {
        self.u32_field(fields::FILE_VERSION)
    }

    pub fn first_non_book_index(&self) -> Option<u32> {
        self.u32_field(fields::FIRST_NON_BOOK_INDEX)
            .filter(|&v| v != NULL_INDEX)
    }

    pub fn full_name_offset(&self) -> u32 {
        self.u32_field(fields::FULL_NAME_OFFSET).unwrap_or(0)
    }

    pub fn full_name_length(&self) -> u32 {
        self.u32_field(fields::FULL_NAME_LENGTH).unwrap_or(0)
    }

    pub fn locale(&self) -> u32 {
        self.u32_field(fields::LOCALE).unwrap_or(0)
    }

    pub fn input_language(&self) -> u32 {
        self.u32_field(fields::INPUT_LANGUAGE).unwrap_or(0)
    }

    pub fn output_language(&self) -> u32 {
        self.u32_field(fields::OUTPUT_LANGUAGE).unwrap_or(0)
    }

    pub fn min_version(&self) -> Option<u32> {
        self.u32_field(fields::MIN_VERSION)
    }

    pub fn first_image_index(&self) -> Option<u32> {
        self.u32_field(fields::FIRST_IMAGE_INDEX)
            .filter(|&v| v != NULL_INDEX)
    }

    pub fn huffman_record_offset(&self) -> Option<u32> {
        self.u32_field(fields::HUFFMAN_RECORD_OFFSET)
            .filter(|&v| v != NULL_INDEX)
    }

    pub fn huffman_record_count(&self) -> u32 {
        self.u32_field(fields::HUFFMAN_RECORD_COUNT).unwrap_or(0)
    }

    pub fn exth_flags(&self) -> u32 {
        self.u32_field(fields::EXTH_FLAGS).unwrap_or(0)
    }

    /// First text record; 0 is read as 1 since record 0 is this header.
    pub fn first_content_index(&self) -> u32 {
        match self.u16_field(fields::FIRST_CONTENT_INDEX) {
            Some(0) | None => 1,
            Some(v) => u32::from(v),
        }
    }

    /// Last content record, or `None` when the header lacks the field or
    /// holds the 0xFFFF sentinel.
    pub fn last_content_index(&self) -> Option<u32> {
        match self.u16_field(fields::LAST_CONTENT_INDEX) {
            Some(0xFFFF) | None => None,
            Some(v) => Some(u32::from(v)),
        }
    }

    /// Flags describing trailing entries appended to text records, when
    /// the header is long enough to carry them.
    pub fn extra_data_flags(&self) -> Option<u16> {
        if self.fixed.len() >= fields::EXTRA_DATA_FLAGS + 2 {
            self.u16_field(fields::EXTRA_DATA_FLAGS)
        } else {
            None
        }
    }

    /// Encoding declared for the text, or the default decoder for
    /// unsupported code pages.
    pub fn character_encoding(&self) -> &'static Encoding {
        let codepage = self.text_encoding();
        bytes::encoding_for_codepage(codepage).unwrap_or_else(|| {
            debug!(codepage, "Unsupported text encoding, using default");
            bytes::default_encoding()
        })
    }

    pub fn full_name(&self) -> String {
        bytes::decode_with(&self.full_name, self.character_encoding())
    }

    pub fn full_name_bytes(&self) -> &[u8] {
        &self.full_name
    }

    /// Replace the full name, encoded in the book's character encoding.
    pub fn set_full_name(&mut self, name: &str) -> Result<()> {
        if !self.has_mobi_header() {
            return Err(MobiError::MalformedRecord(
                "record 0 has no MOBI header to hold a full name".into(),
            ));
        }
        self.full_name = bytes::encode_with(name, self.character_encoding());
        self.sync_fields();
        Ok(())
    }

    /// Overwrite locale, dictionary input and output language codes.
    pub fn set_languages(&mut self, locale: u32, input: u32, output: u32) -> Result<()> {
        if self.fixed.len() < fields::OUTPUT_LANGUAGE + 4 {
            return Err(MobiError::MalformedRecord(
                "MOBI header too short for language fields".into(),
            ));
        }
        put_u32_at(&mut self.fixed, fields::LOCALE, locale);
        put_u32_at(&mut self.fixed, fields::INPUT_LANGUAGE, input);
        put_u32_at(&mut self.fixed, fields::OUTPUT_LANGUAGE, output);
        Ok(())
    }

    pub fn exth(&self) -> Option<&ExthHeader> {
        self.exth.as_ref()
    }

    /// Mutable EXTH block, created (and flagged) when absent.
    /// Call [`MobiHeader::sync_fields`] after structural edits.
    pub fn exth_mut(&mut self) -> Result<&mut ExthHeader> {
        if self.fixed.len() < fields::EXTH_FLAGS + 4 {
            return Err(MobiError::MalformedRecord(
                "MOBI header too short to announce an EXTH block".into(),
            ));
        }
        if self.exth.is_none() {
            self.exth = Some(ExthHeader::new());
            self.sync_fields();
        }
        Ok(self.exth.get_or_insert_with(ExthHeader::new))
    }

    /// Replace every EXTH record with copies of `records`.
    pub fn set_exth_records(&mut self, records: &[ExthRecord]) -> Result<()> {
        self.exth_mut()?.set_record_list(records);
        self.sync_fields();
        Ok(())
    }

    /// Bytes before the trailing filler.
    pub fn content_size(&self) -> usize {
        self.fixed.len()
            + self.exth.as_ref().map_or(0, ExthHeader::size)
            + self.remainder.len()
            + self.full_name.len()
    }

    /// Exact serialized size.
    pub fn size(&self) -> usize {
        self.content_size() + self.trailing.len()
    }

    /// Re-derive the full-name offset/length and the EXTH flag from the
    /// current parts.
    pub fn sync_fields(&mut self) {
        if !self.has_mobi_header() {
            return;
        }
        let name_offset = self.content_size() - self.full_name.len();
        put_u32_at(&mut self.fixed, fields::FULL_NAME_OFFSET, name_offset as u32);
        put_u32_at(
            &mut self.fixed,
            fields::FULL_NAME_LENGTH,
            self.full_name.len() as u32,
        );
        if let Some(flags) = u32_at(&self.fixed, fields::EXTH_FLAGS) {
            let flags = if self.exth.is_some() {
                flags | EXTH_FLAG
            } else {
                flags & !EXTH_FLAG
            };
            put_u32_at(&mut self.fixed, fields::EXTH_FLAGS, flags);
        }
    }

    /// Shrink the trailing filler to two NUL bytes plus padding to a
    /// 4-byte boundary.
    pub fn pack(&mut self) {
        let content = self.content_size() + 2;
        self.trailing = vec![0u8; 2 + padding_size(content)];
        self.sync_fields();
    }

    /// Pad or trim the trailing filler so the header occupies exactly
    /// `slot` bytes. Returns `false` (and changes nothing) when the content
    /// alone is larger than `slot`.
    pub fn fit_to(&mut self, slot: usize) -> bool {
        let content = self.content_size();
        if content > slot {
            return false;
        }
        self.trailing.resize(slot - content, 0);
        self.sync_fields();
        true
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.fixed)?;
        if let Some(exth) = &self.exth {
            exth.write(out)?;
        }
        out.write_all(&self.remainder)?;
        out.write_all(&self.full_name)?;
        out.write_all(&self.trailing)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.write(&mut out).expect("writing into a Vec cannot fail");
        out
    }
}
