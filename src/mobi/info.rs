//! Serializable metadata summary of a book.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::mobi::container::MobiContainer;
use crate::mobi::locale;

/// Everything `mobimeta info` reports about a file.
#[derive(Debug, Clone, Serialize)]
pub struct MetaInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub file_size: usize,
    pub pdb: PdbInfo,
    pub mobi: MobiInfo,
    pub exth: Vec<ExthEntry>,
    pub has_cover: bool,
}

/// PDB envelope fields.
#[derive(Debug, Clone, Serialize)]
pub struct PdbInfo {
    pub name: String,
    pub type_creator: String,
    pub attributes: Vec<&'static str>,
    pub version: u16,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub last_backup: Option<DateTime<Utc>>,
    pub modification_number: u32,
    pub unique_id_seed: u32,
    pub record_count: usize,
}

/// Embedded header fields.
#[derive(Debug, Clone, Serialize)]
pub struct MobiInfo {
    pub full_name: String,
    pub has_mobi_header: bool,
    pub header_length: Option<u32>,
    pub mobi_type: Option<u32>,
    pub file_version: Option<u32>,
    pub compression: String,
    pub encryption_type: u16,
    pub text_encoding: u32,
    pub encoding_name: &'static str,
    pub text_length: u32,
    pub text_record_count: u16,
    pub locale: u32,
    pub locale_name: Option<String>,
    pub input_language: u32,
    pub output_language: u32,
    pub first_content_index: usize,
    pub last_content_index: Option<usize>,
    pub first_image_index: Option<usize>,
}

/// One EXTH record, labelled and decoded.
#[derive(Debug, Clone, Serialize)]
pub struct ExthEntry {
    pub record_type: u32,
    pub label: Option<&'static str>,
    pub size: usize,
    pub value: String,
}

impl MetaInfo {
    pub fn from_container(container: &MobiContainer) -> Self {
        let pdb = container.pdb();
        let header = container.header();
        let enc = container.character_encoding();

        let exth = container
            .exth()
            .map(|exth| {
                exth.records()
                    .iter()
                    .map(|r| ExthEntry {
                        record_type: r.record_type(),
                        label: r.type_description(),
                        size: r.size(),
                        value: r.display_value(Some(enc)),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            path: container.path().map(|p| p.display().to_string()),
            file_size: container.file_size(),
            pdb: PdbInfo {
                name: pdb.name(),
                type_creator: pdb.type_creator(),
                attributes: pdb.attribute_names(),
                version: pdb.version(),
                created: pdb.creation_time(),
                modified: pdb.modification_time(),
                last_backup: pdb.last_backup_time(),
                modification_number: pdb.modification_number(),
                unique_id_seed: pdb.unique_id_seed(),
                record_count: pdb.num_records(),
            },
            mobi: MobiInfo {
                full_name: header.full_name(),
                has_mobi_header: header.has_mobi_header(),
                header_length: header.mobi_header_length(),
                mobi_type: header.mobi_type(),
                file_version: header.file_version(),
                compression: header.compression().label(),
                encryption_type: header.encryption_type(),
                text_encoding: header.text_encoding(),
                encoding_name: enc.name(),
                text_length: header.text_length(),
                text_record_count: header.text_record_count(),
                locale: header.locale(),
                locale_name: locale::locale_name(header.locale()),
                input_language: header.input_language(),
                output_language: header.output_language(),
                first_content_index: container.first_content_index(),
                last_content_index: container.last_content_index(),
                first_image_index: container.first_image_index(),
            },
            exth,
            has_cover: container.cover_or_thumb().is_some(),
        }
    }

    /// Book title: EXTH "updated title" when present, else the full name.
    pub fn title(&self) -> &str {
        self.exth
            .iter()
            .find(|e| e.record_type == crate::exth::types::UPDATED_TITLE)
            .map(|e| e.value.as_str())
            .unwrap_or(self.mobi.full_name.as_str())
    }

    /// Values of every author record.
    pub fn authors(&self) -> Vec<&str> {
        self.exth
            .iter()
            .filter(|e| e.record_type == crate::exth::types::AUTHOR)
            .map(|e| e.value.as_str())
            .collect()
    }
}
