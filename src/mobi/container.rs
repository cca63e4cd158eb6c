//! A whole MOBI file held in memory: PDB header, record 0, and the
//! untouched bytes of every following record.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::error::{MobiError, Result};
use crate::exth::{types, ExthHeader, ExthRecord};
use crate::mobi::header::{Compression, MobiHeader, NULL_INDEX};
use crate::pdb::PdbHeader;

/// JPEG start-of-image marker.
pub const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// An opened MOBI book.
///
/// Record bytes after record 0 are kept verbatim in `tail` and are never
/// re-encoded: saving only rewrites the PDB header and record 0, then
/// copies `tail` through unchanged.
#[derive(Debug, Clone)]
pub struct MobiContainer {
    path: Option<PathBuf>,
    pdb: PdbHeader,
    /// Bytes between the record table and record 0, if any.
    filler: Vec<u8>,
    header: MobiHeader,
    /// Everything from the original offset of record 1 to end of file.
    tail: Vec<u8>,
}

impl MobiContainer {
    /// Parse a complete file image.
    pub fn read_meta_data(bytes: &[u8]) -> Result<Self> {
        Self::parse(bytes).map_err(|e| MobiError::invalid_file("<memory>", &e))
    }

    /// Read and parse a file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MobiError::FileNotFound(path.to_path_buf())
            } else {
                MobiError::io(path, e)
            }
        })?;
        let mut container = Self::parse(&bytes).map_err(|e| MobiError::invalid_file(path, &e))?;
        container.path = Some(path.to_path_buf());
        info!(path = %path.display(), records = container.record_count(), "Opened MOBI file");
        Ok(container)
    }

    fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let pdb = PdbHeader::parse(&mut cursor)?;
        let table_end = pdb.size();

        let infos = pdb.record_infos();
        let Some(first) = infos.first() else {
            return Err(MobiError::MalformedRecord("record table is empty".into()));
        };
        let start0 = first.data_offset as usize;
        if start0 < table_end {
            return Err(MobiError::MalformedRecord(format!(
                "record 0 at offset {start0} overlaps the record table ending at {table_end}"
            )));
        }
        if let Some(last) = infos.last() {
            if last.data_offset as usize > bytes.len() {
                return Err(MobiError::TruncatedInput {
                    context: "record data",
                    needed: last.data_offset as usize,
                    available: bytes.len(),
                });
            }
        }

        let end0 = match pdb.offset_after_embedded_header() {
            0 => bytes.len(),
            offset => offset,
        };
        let header = MobiHeader::parse(&bytes[start0..end0])?;
        let tail = bytes[end0..].to_vec();

        debug!(
            records = pdb.num_records(),
            header_size = end0 - start0,
            tail_size = tail.len(),
            "Parsed MOBI container"
        );

        Ok(Self {
            path: None,
            filler: bytes[table_end..start0].to_vec(),
            pdb,
            header,
            tail,
        })
    }

    /// Path the container was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn pdb(&self) -> &PdbHeader {
        &self.pdb
    }

    pub fn header(&self) -> &MobiHeader {
        &self.header
    }

    pub fn record_count(&self) -> usize {
        self.pdb.num_records()
    }

    /// Size of the file [`MobiContainer::save_to_new_file`] would write with the
    /// header as it currently stands.
    pub fn file_size(&self) -> usize {
        self.pdb.size() + self.filler.len() + self.header.size() + self.tail.len()
    }

    pub fn character_encoding(&self) -> &'static Encoding {
        self.header.character_encoding()
    }

    pub fn compression(&self) -> Compression {
        self.header.compression()
    }

    pub fn first_image_index(&self) -> Option<usize> {
        self.header.first_image_index().map(|v| v as usize)
    }

    pub fn first_content_index(&self) -> usize {
        self.header.first_content_index() as usize
    }

    pub fn last_content_index(&self) -> Option<usize> {
        self.header.last_content_index().map(|v| v as usize)
    }

    // ── Metadata ────────────────────────────────────────────────────

    pub fn full_name(&self) -> String {
        self.header.full_name()
    }

    pub fn set_full_name(&mut self, name: &str) -> Result<()> {
        self.header.set_full_name(name)
    }

    pub fn locale(&self) -> u32 {
        self.header.locale()
    }

    pub fn input_language(&self) -> u32 {
        self.header.input_language()
    }

    pub fn output_language(&self) -> u32 {
        self.header.output_language()
    }

    pub fn set_languages(&mut self, locale: u32, input: u32, output: u32) -> Result<()> {
        self.header.set_languages(locale, input, output)
    }

    pub fn exth(&self) -> Option<&ExthHeader> {
        self.header.exth()
    }

    /// Copies of the EXTH records (empty when the book has no EXTH block).
    pub fn exth_records(&self) -> Vec<ExthRecord> {
        self.header
            .exth()
            .map(ExthHeader::record_list)
            .unwrap_or_default()
    }

    pub fn set_exth_records(&mut self, records: &[ExthRecord]) -> Result<()> {
        self.header.set_exth_records(records)
    }

    /// Apply an edit to the EXTH block (created when missing).
    pub fn edit_exth<T>(&mut self, edit: impl FnOnce(&mut ExthHeader) -> T) -> Result<T> {
        let result = edit(self.header.exth_mut()?);
        self.header.sync_fields();
        Ok(result)
    }

    /// Text of every EXTH record of `record_type`, decoded in the book's encoding.
    pub fn exth_strings(&self, record_type: u32) -> Vec<String> {
        let enc = self.character_encoding();
        self.header
            .exth()
            .map(|exth| {
                exth.records_with_type(record_type)
                    .map(|r| r.as_string(Some(enc)))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── Records ─────────────────────────────────────────────────────

    /// Raw bytes of record `index`. Record 0 is the current (possibly
    /// edited) header; every other record comes from the original file.
    pub fn record_by_index(&self, index: usize) -> Result<Cow<'_, [u8]>> {
        let infos = self.pdb.record_infos();
        let count = infos.len();
        if index >= count {
            return Err(MobiError::IndexOutOfRange { index, count });
        }
        if index == 0 {
            return Ok(Cow::Owned(self.header.to_bytes()));
        }
        let base = infos[1].data_offset as usize;
        let start = infos[index].data_offset as usize - base;
        let end = match infos.get(index + 1) {
            Some(next) => next.data_offset as usize - base,
            None => self.tail.len(),
        };
        self.tail
            .get(start..end)
            .map(Cow::Borrowed)
            .ok_or_else(|| {
                MobiError::MalformedRecord(format!(
                    "record {index} spans {start}..{end} beyond {} tail bytes",
                    self.tail.len()
                ))
            })
    }

    /// Cover image, else thumbnail, else the first JPEG among the image
    /// records. Lookup failures degrade to `None`.
    pub fn cover_or_thumb(&self) -> Option<Vec<u8>> {
        let first_image = self.first_image_index()?;

        let pointer = self.header.exth().and_then(|exth| {
            exth.first_with_type(types::COVER_OFFSET)
                .or_else(|| exth.first_with_type(types::THUMB_OFFSET))
        });
        if let Some(rec) = pointer {
            let offset = match rec.as_u32() {
                Some(v) if v != NULL_INDEX => v as usize,
                _ => {
                    warn!(record_type = rec.record_type(), "Cover pointer is not a valid index");
                    return None;
                }
            };
            return match self.record_by_index(first_image + offset) {
                Ok(bytes) => Some(bytes.into_owned()),
                Err(e) => {
                    warn!(error = %e, "Cover record unavailable");
                    None
                }
            };
        }

        let last_record = self.record_count().saturating_sub(1);
        let last = self.last_content_index().map_or(last_record, |v| v.min(last_record));
        (first_image..=last)
            .filter_map(|i| self.record_by_index(i).ok())
            .find(|bytes| bytes.starts_with(&JPEG_MAGIC))
            .map(Cow::into_owned)
    }

    // ── Saving ──────────────────────────────────────────────────────

    /// Serialize to `out`.
    ///
    /// With `pack`, record 0 is shrunk to its minimal size and every
    /// following offset shifts by the difference. Without it, record 0
    /// keeps its slot when the edited header still fits; otherwise it is
    /// packed anyway so the offsets stay consistent.
    pub fn save_to_new_file<W: Write>(&mut self, out: &mut W, pack: bool) -> Result<()> {
        let slot = self.pdb.embedded_header_size();
        let has_following = self.record_count() >= 2;

        if pack {
            self.header.pack();
        } else if has_following && !self.header.fit_to(slot) {
            warn!(
                slot,
                needed = self.header.content_size(),
                "Edited header no longer fits its record; packing"
            );
            self.header.pack();
        } else {
            self.header.sync_fields();
        }
        self.pdb.adjust_offsets_after_header_resize(self.header.size());

        self.pdb.write(out)?;
        out.write_all(&self.filler)?;
        self.header.write(out)?;
        out.write_all(&self.tail)?;
        Ok(())
    }

    /// Serialize to a new file at `path`.
    pub fn save_to_path(&mut self, path: impl AsRef<Path>, pack: bool) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| MobiError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.save_to_new_file(&mut writer, pack).map_err(|e| match e {
            MobiError::Io { source, .. } => MobiError::io(path, source),
            other => other,
        })?;
        writer.flush().map_err(|e| MobiError::io(path, e))?;
        info!(path = %path.display(), pack, "Saved MOBI file");
        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&mut self, pack: bool) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.file_size());
        self.save_to_new_file(&mut out, pack)?;
        Ok(out)
    }
}
