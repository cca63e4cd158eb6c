//! In-memory MOBI file builder shared by the integration tests and benches.
//!
//! The layout is written by hand (not through the library) so the tests
//! exercise the parser against independently produced bytes.

#![allow(dead_code)]

pub const NULL: u32 = 0xFFFF_FFFF;

/// End-of-file marker record found at the end of real MOBI files.
pub const EOF_RECORD: [u8; 4] = [0xE9, 0x8E, 0x0D, 0x0A];

/// Description of a book to build.
///
/// Record layout: 0 header, text records, image records, `FLIS`, `FCIS`,
/// end-of-file marker.
#[derive(Debug, Clone)]
pub struct MobiBuilder {
    pub pdb_name: String,
    pub full_name: Vec<u8>,
    pub compression: u16,
    pub encoding: u32,
    pub locale: u32,
    /// MOBI header length (includes the "MOBI" identifier); 0 = PalmDOC only.
    pub header_length: u32,
    /// `None` writes no EXTH block and clears the flag.
    pub exth: Option<Vec<(u32, Vec<u8>)>>,
    pub extra_data_flags: u16,
    pub text_records: Vec<Vec<u8>>,
    pub image_records: Vec<Vec<u8>>,
    /// Zero bytes after the full name in record 0.
    pub trailing: usize,
    /// Overrides the computed last content index.
    pub last_content_index: Option<u16>,
    pub creation_date: u32,
}

impl Default for MobiBuilder {
    fn default() -> Self {
        Self {
            pdb_name: "Test_Book".to_string(),
            full_name: b"Test Book".to_vec(),
            compression: 1,
            encoding: 65001,
            locale: 1033,
            header_length: 0xE8,
            exth: Some(vec![(100, b"Jane Doe".to_vec()), (101, b"ACME".to_vec())]),
            extra_data_flags: 0,
            text_records: vec![b"Hello, ".to_vec(), b"world!".to_vec()],
            image_records: Vec::new(),
            trailing: 2048,
            last_content_index: None,
            creation_date: 1_300_000_000,
        }
    }
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// EXTH block bytes, padded to a 4-byte multiple.
pub fn exth_bytes(records: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let data: usize = records.iter().map(|(_, d)| d.len() + 8).sum();
    let padding = (4 - data % 4) % 4;
    let mut out = Vec::new();
    out.extend_from_slice(b"EXTH");
    out.extend_from_slice(&((12 + data + padding) as u32).to_be_bytes());
    out.extend_from_slice(&(records.len() as u32).to_be_bytes());
    for (t, d) in records {
        out.extend_from_slice(&t.to_be_bytes());
        out.extend_from_slice(&((d.len() + 8) as u32).to_be_bytes());
        out.extend_from_slice(d);
    }
    out.extend(std::iter::repeat(0u8).take(padding));
    out
}

/// PalmDOC encoding without back-references: bytes outside the literal
/// range are emitted as one-byte runs.
pub fn palmdoc_literal(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for &b in text {
        if (0x09..=0x7F).contains(&b) {
            out.push(b);
        } else {
            out.push(0x01);
            out.push(b);
        }
    }
    out
}

/// A tiny JPEG-looking image record.
pub fn jpeg(tag: u8) -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, tag, tag, tag, 0xFF, 0xD9]
}

impl MobiBuilder {
    pub fn first_image_index(&self) -> Option<usize> {
        (!self.image_records.is_empty()).then(|| 1 + self.text_records.len())
    }

    pub fn record_count(&self) -> usize {
        1 + self.text_records.len() + self.image_records.len() + 3
    }

    /// Record 0 bytes.
    pub fn record0(&self) -> Vec<u8> {
        let n = self.text_records.len();
        let mut fixed = vec![0u8; 16 + self.header_length as usize];
        put_u16(&mut fixed, 0, self.compression);
        let text_len: usize = self.text_records.iter().map(Vec::len).sum();
        put_u32(&mut fixed, 4, text_len as u32);
        put_u16(&mut fixed, 8, n as u16);
        put_u16(&mut fixed, 10, 4096);

        if self.header_length == 0 {
            return fixed;
        }

        let exth = self.exth.as_deref().map(exth_bytes).unwrap_or_default();
        let last_content = self
            .last_content_index
            .unwrap_or((n + self.image_records.len() + 2) as u16);

        fixed[16..20].copy_from_slice(b"MOBI");
        put_u32(&mut fixed, 0x14, self.header_length);
        put_u32(&mut fixed, 0x18, 2);
        put_u32(&mut fixed, 0x1C, self.encoding);
        put_u32(&mut fixed, 0x20, 0xABCD);
        put_u32(&mut fixed, 0x24, 6);
        put_u32(&mut fixed, 0x50, (n + 1) as u32);
        let name_offset = fixed.len() + exth.len();
        put_u32(&mut fixed, 0x54, name_offset as u32);
        put_u32(&mut fixed, 0x58, self.full_name.len() as u32);
        put_u32(&mut fixed, 0x5C, self.locale);
        put_u32(&mut fixed, 0x68, 6);
        put_u32(
            &mut fixed,
            0x6C,
            self.first_image_index().map_or(NULL, |i| i as u32),
        );
        put_u32(&mut fixed, 0x70, NULL);
        put_u32(&mut fixed, 0x80, if self.exth.is_some() { 0x50 } else { 0x10 });
        put_u16(&mut fixed, 0xC0, 1);
        put_u16(&mut fixed, 0xC2, last_content);
        if fixed.len() >= 0xF4 {
            put_u16(&mut fixed, 0xF2, self.extra_data_flags);
        }

        let mut out = fixed;
        out.extend_from_slice(&exth);
        out.extend_from_slice(&self.full_name);
        out.extend(std::iter::repeat(0u8).take(self.trailing));
        out
    }

    /// All records, record 0 first.
    pub fn records(&self) -> Vec<Vec<u8>> {
        let mut records = vec![self.record0()];
        records.extend(self.text_records.iter().cloned());
        records.extend(self.image_records.iter().cloned());
        records.push(b"FLIS\0\0\0\x08".to_vec());
        records.push(b"FCIS\0\0\0\x14".to_vec());
        records.push(EOF_RECORD.to_vec());
        records
    }

    /// Complete file bytes.
    pub fn build(&self) -> Vec<u8> {
        let records = self.records();
        let table_end = 78 + records.len() * 8 + 2;

        let mut out = Vec::new();
        let mut name = [0u8; 32];
        let n = self.pdb_name.len().min(31);
        name[..n].copy_from_slice(&self.pdb_name.as_bytes()[..n]);
        out.extend_from_slice(&name);
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        for v in [self.creation_date, self.creation_date, 0, 0, 0, 0] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.extend_from_slice(b"BOOKMOBI");
        out.extend_from_slice(&(2 * records.len() as u32).to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(records.len() as u16).to_be_bytes());

        let mut offset = table_end;
        for (i, rec) in records.iter().enumerate() {
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(2 * i as u32).to_be_bytes());
            offset += rec.len();
        }
        out.extend_from_slice(&[0, 0]);
        for rec in &records {
            out.extend_from_slice(rec);
        }
        out
    }
}

/// Record offsets read straight from a file image.
pub fn record_offsets(file: &[u8]) -> Vec<u32> {
    let count = u16::from_be_bytes([file[76], file[77]]) as usize;
    (0..count)
        .map(|i| {
            let p = 78 + i * 8;
            u32::from_be_bytes([file[p], file[p + 1], file[p + 2], file[p + 3]])
        })
        .collect()
}

/// Raw bytes of record `index` in a file image.
pub fn raw_record(file: &[u8], index: usize) -> Vec<u8> {
    let offsets = record_offsets(file);
    let start = offsets[index] as usize;
    let end = offsets.get(index + 1).map_or(file.len(), |&o| o as usize);
    file[start..end].to_vec()
}
