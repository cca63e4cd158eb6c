//! A single EXTH metadata record: 4-byte type, 4-byte length, payload.

use std::io::{Read, Write};

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use encoding_rs::Encoding;
use serde::Serialize;

use crate::codec::bytes::{self, read_fixed, read_u32};
use crate::error::{MobiError, Result};
use crate::exth::registry::{self, ValueKind};

/// Size of the type + length prefix of every record.
pub const RECORD_HEADER_SIZE: usize = 8;

/// One EXTH record. The on-disk length is always `data.len() + 8`, so it
/// is derived rather than stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExthRecord {
    record_type: u32,
    data: Vec<u8>,
}

impl ExthRecord {
    /// Parse one record from the stream.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let record_type = read_u32(reader, "EXTH record type")?;
        let length = read_u32(reader, "EXTH record length")? as usize;
        if length < RECORD_HEADER_SIZE {
            return Err(MobiError::MalformedRecord(format!(
                "EXTH record type {record_type} declares length {length} (< {RECORD_HEADER_SIZE})"
            )));
        }
        let data = read_fixed(reader, length - RECORD_HEADER_SIZE, "EXTH record payload")?;
        Ok(Self { record_type, data })
    }

    /// Build a record holding raw bytes.
    pub fn from_bytes(record_type: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            record_type,
            data: data.into(),
        }
    }

    /// Build a text record, encoded with `encoding` (or the default encoding).
    pub fn from_string(record_type: u32, text: &str, encoding: Option<&'static Encoding>) -> Self {
        let enc = encoding.unwrap_or_else(bytes::default_encoding);
        Self::from_bytes(record_type, bytes::encode_with(text, enc))
    }

    /// Build a one-byte boolean flag record.
    pub fn from_bool(record_type: u32, value: bool) -> Self {
        Self::from_bytes(record_type, vec![u8::from(value)])
    }

    /// Build a 4-byte big-endian integer record.
    pub fn from_u32(record_type: u32, value: u32) -> Self {
        Self::from_bytes(record_type, value.to_be_bytes().to_vec())
    }

    pub fn record_type(&self) -> u32 {
        self.record_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Serialized size: payload plus the 8-byte prefix.
    pub fn size(&self) -> usize {
        self.data.len() + RECORD_HEADER_SIZE
    }

    /// Replace the payload.
    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.data = data.into();
    }

    /// Replace the payload with encoded text.
    pub fn set_string(&mut self, text: &str, encoding: Option<&'static Encoding>) {
        let enc = encoding.unwrap_or_else(bytes::default_encoding);
        self.data = bytes::encode_with(text, enc);
    }

    /// Deep copy.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u32::<BigEndian>(self.record_type)?;
        out.write_u32::<BigEndian>(self.size() as u32)?;
        out.write_all(&self.data)?;
        Ok(())
    }

    pub fn is_known_type(&self) -> bool {
        registry::is_known_type(self.record_type)
    }

    pub fn type_description(&self) -> Option<&'static str> {
        registry::description_for_type(self.record_type)
    }

    pub fn is_boolean_type(&self) -> bool {
        registry::is_boolean_type(self.record_type)
    }

    pub fn is_date_type(&self) -> bool {
        registry::is_date_type(self.record_type)
    }

    /// Payload as a big-endian integer; `None` for empty or over-long payloads.
    pub fn as_u32(&self) -> Option<u32> {
        match self.data.len() {
            1..=4 => Some(bytes::be_to_uint(&self.data) as u32),
            _ => None,
        }
    }

    /// Payload as a flag: any non-zero byte is `true`.
    pub fn as_bool(&self) -> bool {
        self.data.iter().any(|&b| b != 0)
    }

    /// Payload decoded as text.
    pub fn as_string(&self, encoding: Option<&'static Encoding>) -> String {
        let enc = encoding.unwrap_or_else(bytes::default_encoding);
        bytes::decode_with(&self.data, enc)
    }

    /// Payload parsed as a date; accepts RFC 3339 and plain `YYYY-MM-DD`
    /// (optionally followed by a time).
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        let text = self.as_string(None);
        parse_exth_date(text.trim())
    }

    /// Human-readable value according to the registry's interpretation.
    pub fn display_value(&self, encoding: Option<&'static Encoding>) -> String {
        match registry::value_kind(self.record_type) {
            Some(ValueKind::Boolean) => self.as_bool().to_string(),
            Some(ValueKind::Integer) => match self.as_u32() {
                Some(v) => v.to_string(),
                None => hex_preview(&self.data),
            },
            Some(ValueKind::Date) => match self.as_date() {
                Some(d) => d.format("%Y-%m-%d").to_string(),
                None => self.as_string(encoding),
            },
            Some(ValueKind::Binary) => hex_preview(&self.data),
            Some(ValueKind::Text) | None => self.as_string(encoding),
        }
    }
}

/// Parse the date formats found in EXTH 106 / 502 payloads.
pub fn parse_exth_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn hex_preview(data: &[u8]) -> String {
    const MAX: usize = 16;
    let mut s: String = data
        .iter()
        .take(MAX)
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    if data.len() > MAX {
        s.push_str(&format!(" … ({} bytes)", data.len()));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_record() {
        let raw = [0, 0, 0, 100, 0, 0, 0, 11, b'B', b'o', b'b'];
        let rec = ExthRecord::parse(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(rec.record_type(), 100);
        assert_eq!(rec.data(), b"Bob");
        assert_eq!(rec.size(), 11);
    }

    #[test]
    fn test_parse_rejects_short_length() {
        let raw = [0, 0, 0, 100, 0, 0, 0, 7];
        let err = ExthRecord::parse(&mut Cursor::new(&raw[..])).unwrap_err();
        assert!(matches!(err, MobiError::MalformedRecord(_)));
    }

    #[test]
    fn test_parse_truncated_payload() {
        let raw = [0, 0, 0, 100, 0, 0, 0, 20, b'x'];
        let err = ExthRecord::parse(&mut Cursor::new(&raw[..])).unwrap_err();
        assert!(matches!(err, MobiError::TruncatedInput { .. }));
    }

    #[test]
    fn test_write_emits_type_length_payload() {
        let rec = ExthRecord::from_string(100, "Ann", None);
        let mut out = Vec::new();
        rec.write(&mut out).unwrap();
        assert_eq!(out, vec![0, 0, 0, 100, 0, 0, 0, 11, b'A', b'n', b'n']);
    }

    #[test]
    fn test_set_data_recomputes_size() {
        let mut rec = ExthRecord::from_bytes(300, vec![1, 2, 3]);
        assert_eq!(rec.size(), 11);
        rec.set_data(vec![0u8; 10]);
        assert_eq!(rec.size(), 18);
    }

    #[test]
    fn test_copy_is_independent() {
        let rec = ExthRecord::from_string(100, "Original", None);
        let mut copy = rec.copy();
        copy.set_string("Changed", None);
        assert_eq!(rec.as_string(None), "Original");
        assert_eq!(copy.as_string(None), "Changed");
    }

    #[test]
    fn test_bool_and_integer_values() {
        assert!(ExthRecord::from_bool(404, true).as_bool());
        assert!(!ExthRecord::from_bool(404, false).as_bool());
        assert_eq!(ExthRecord::from_u32(201, 3).as_u32(), Some(3));
        assert_eq!(ExthRecord::from_bytes(201, vec![]).as_u32(), None);
    }

    #[test]
    fn test_string_in_windows_1252() {
        let rec = ExthRecord::from_string(100, "Müller", Some(encoding_rs::WINDOWS_1252));
        assert_eq!(rec.data().len(), 6);
        assert_eq!(rec.as_string(Some(encoding_rs::WINDOWS_1252)), "Müller");
    }

    #[test]
    fn test_date_value() {
        let rec = ExthRecord::from_string(106, "2011-04-03", None);
        let date = rec.as_date().unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2011-04-03");
        assert_eq!(rec.display_value(None), "2011-04-03");

        let rfc = ExthRecord::from_string(106, "2011-04-03T10:00:00+02:00", None);
        assert_eq!(rfc.as_date().unwrap().format("%H").to_string(), "08");
    }

    #[test]
    fn test_display_value_by_kind() {
        assert_eq!(ExthRecord::from_u32(201, 7).display_value(None), "7");
        assert_eq!(ExthRecord::from_bool(404, true).display_value(None), "true");
        assert_eq!(ExthRecord::from_bytes(209, vec![0xAB, 0x01]).display_value(None), "ab 01");
        assert_eq!(ExthRecord::from_string(100, "Ann", None).display_value(None), "Ann");
        assert_eq!(ExthRecord::from_string(9999, "raw", None).display_value(None), "raw");
    }

    #[test]
    fn test_registry_accessors() {
        let rec = ExthRecord::from_string(100, "x", None);
        assert!(rec.is_known_type());
        assert_eq!(rec.type_description(), Some("author"));
        assert!(!rec.is_boolean_type());
        assert!(ExthRecord::from_string(106, "x", None).is_date_type());
    }
}
