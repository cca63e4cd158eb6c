//! EXTH block: `"EXTH"`, header length, record count, records, zero padding.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ identifier: [u8; 4] = b"EXTH"        │
//! │ header_length: u32  (whole block)    │
//! │ record_count: u32                    │
//! ├──────────────────────────────────────┤
//! │ records (type u32, length u32, data) │
//! ├──────────────────────────────────────┤
//! │ 0–3 zero bytes up to a 4-byte bound  │
//! └──────────────────────────────────────┘
//! ```

use std::io::{Read, Write};

use byteorder::{BigEndian, WriteBytesExt};
use encoding_rs::Encoding;
use tracing::debug;

use crate::codec::bytes::{read_fixed, read_u32};
use crate::error::{MobiError, Result};
use crate::exth::record::ExthRecord;

/// Identifier at the start of every EXTH block.
pub const EXTH_MAGIC: &[u8; 4] = b"EXTH";

/// Identifier + header length + record count.
pub const EXTH_PREFIX_SIZE: usize = 12;

/// Ordered EXTH records. `header_length` and `record_count` are always
/// derived from the records, never stored independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExthHeader {
    records: Vec<ExthRecord>,
}

impl ExthHeader {
    /// An empty block (12 bytes on disk).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a block, consuming the trailing padding.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = read_fixed(reader, 4, "EXTH identifier")?;
        if magic.as_slice() != EXTH_MAGIC {
            return Err(MobiError::BadMagic {
                expected: "EXTH",
                found: String::from_utf8_lossy(&magic).into_owned(),
            });
        }
        let declared_length = read_u32(reader, "EXTH header length")?;
        let record_count = read_u32(reader, "EXTH record count")?;

        let mut records = Vec::with_capacity(record_count.min(1024) as usize);
        for _ in 0..record_count {
            records.push(ExthRecord::parse(reader)?);
        }

        let header = Self { records };
        let padding = padding_size(header.data_size());
        read_fixed(reader, padding, "EXTH padding")?;

        if declared_length as usize != header.size() {
            debug!(
                declared = declared_length,
                computed = header.size(),
                "EXTH header length differs from computed size"
            );
        }
        Ok(header)
    }

    /// Deep copies of all records in on-disk order.
    pub fn record_list(&self) -> Vec<ExthRecord> {
        self.records.iter().map(ExthRecord::copy).collect()
    }

    /// Borrowing view over the records.
    pub fn records(&self) -> &[ExthRecord] {
        &self.records
    }

    /// Replace every record with copies of `records`, keeping their order.
    pub fn set_record_list(&mut self, records: &[ExthRecord]) {
        self.records = records.iter().map(ExthRecord::copy).collect();
    }

    /// Remove every record of `record_type`. Returns how many were removed.
    pub fn remove_records_with_type(&mut self, record_type: u32) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.record_type() != record_type);
        before - self.records.len()
    }

    pub fn records_with_type_exist(&self, record_type: u32) -> bool {
        self.records.iter().any(|r| r.record_type() == record_type)
    }

    /// All records of `record_type`, in order.
    pub fn records_with_type(&self, record_type: u32) -> impl Iterator<Item = &ExthRecord> {
        self.records
            .iter()
            .filter(move |r| r.record_type() == record_type)
    }

    /// First record of `record_type`.
    pub fn first_with_type(&self, record_type: u32) -> Option<&ExthRecord> {
        self.records_with_type(record_type).next()
    }

    /// Rewrite the payload of every record of `record_type`. Returns how
    /// many records changed.
    pub fn set_all_records_with_type_to_string(
        &mut self,
        record_type: u32,
        text: &str,
        encoding: Option<&'static Encoding>,
    ) -> usize {
        let mut changed = 0;
        for rec in self
            .records
            .iter_mut()
            .filter(|r| r.record_type() == record_type)
        {
            rec.set_string(text, encoding);
            changed += 1;
        }
        changed
    }

    /// Append a text record.
    pub fn add_string_record(
        &mut self,
        record_type: u32,
        text: &str,
        encoding: Option<&'static Encoding>,
    ) {
        self.records
            .push(ExthRecord::from_string(record_type, text, encoding));
    }

    /// Append a raw record.
    pub fn add_bytes_record(&mut self, record_type: u32, data: impl Into<Vec<u8>>) {
        self.records.push(ExthRecord::from_bytes(record_type, data));
    }

    /// Append an already-built record.
    pub fn add_record(&mut self, record: ExthRecord) {
        self.records.push(record);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Sum of the serialized sizes of all records.
    pub fn data_size(&self) -> usize {
        self.records.iter().map(ExthRecord::size).sum()
    }

    /// Total serialized size, always a multiple of 4.
    pub fn size(&self) -> usize {
        let data = self.data_size();
        EXTH_PREFIX_SIZE + data + padding_size(data)
    }

    /// Value written in the header length field.
    pub fn header_length(&self) -> u32 {
        self.size() as u32
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(EXTH_MAGIC)?;
        out.write_u32::<BigEndian>(self.header_length())?;
        out.write_u32::<BigEndian>(self.records.len() as u32)?;
        for rec in &self.records {
            rec.write(out)?;
        }
        let padding = padding_size(self.data_size());
        out.write_all(&[0u8; 4][..padding])?;
        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.write(&mut out).expect("writing into a Vec cannot fail");
        out
    }
}

/// Zero bytes needed after `n` bytes to reach a 4-byte boundary.
pub fn padding_size(n: usize) -> usize {
    (4 - n % 4) % 4
}
