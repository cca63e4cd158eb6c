//! PDB preamble and record table.

use std::io::{Read, Write};

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::codec::bytes::{self, read_fixed, read_u16, read_u32};
use crate::error::{MobiError, Result};
use crate::pdb::format::{self, GAP_SIZE, NAME_SIZE, PREAMBLE_SIZE, RECORD_INFO_SIZE};

/// One entry of the record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RecordInfo {
    /// Absolute byte offset of the record's data in the file.
    pub data_offset: u32,
    /// Attribute byte followed by a 24-bit unique id.
    pub attributes_and_unique_id: u32,
}

impl RecordInfo {
    pub fn attributes(&self) -> u8 {
        (self.attributes_and_unique_id >> 24) as u8
    }

    pub fn unique_id(&self) -> u32 {
        self.attributes_and_unique_id & 0x00FF_FFFF
    }
}

/// The outer PDB envelope. Immutable once parsed except for
/// [`PdbHeader::adjust_offsets_after_header_resize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbHeader {
    name: [u8; NAME_SIZE],
    attributes: u16,
    version: u16,
    creation_date: u32,
    modification_date: u32,
    last_backup_date: u32,
    modification_number: u32,
    app_info_id: u32,
    sort_info_id: u32,
    type_id: u32,
    creator: u32,
    unique_id_seed: u32,
    next_record_list_id: u32,
    records: Vec<RecordInfo>,
    gap_to_data: [u8; GAP_SIZE],
}

impl PdbHeader {
    /// Parse the preamble, the record table and the gap bytes.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut name = [0u8; NAME_SIZE];
        name.copy_from_slice(&read_fixed(reader, NAME_SIZE, "PDB name")?);

        let attributes = read_u16(reader, "PDB attributes")?;
        let version = read_u16(reader, "PDB version")?;
        let creation_date = read_u32(reader, "PDB creation date")?;
        let modification_date = read_u32(reader, "PDB modification date")?;
        let last_backup_date = read_u32(reader, "PDB last backup date")?;
        let modification_number = read_u32(reader, "PDB modification number")?;
        let app_info_id = read_u32(reader, "PDB app info id")?;
        let sort_info_id = read_u32(reader, "PDB sort info id")?;
        let type_id = read_u32(reader, "PDB type")?;
        let creator = read_u32(reader, "PDB creator")?;
        let unique_id_seed = read_u32(reader, "PDB unique id seed")?;
        let next_record_list_id = read_u32(reader, "PDB next record list id")?;
        let num_records = read_u16(reader, "PDB record count")?;

        let mut records = Vec::with_capacity(num_records as usize);
        for _ in 0..num_records {
            records.push(RecordInfo {
                data_offset: read_u32(reader, "PDB record offset")?,
                attributes_and_unique_id: read_u32(reader, "PDB record attributes")?,
            });
        }

        let mut gap_to_data = [0u8; GAP_SIZE];
        gap_to_data.copy_from_slice(&read_fixed(reader, GAP_SIZE, "PDB gap")?);

        if let Some(i) = records
            .windows(2)
            .position(|w| w[1].data_offset < w[0].data_offset)
        {
            return Err(MobiError::MalformedRecord(format!(
                "record {} offset {} precedes record {} offset {}",
                i + 1,
                records[i + 1].data_offset,
                i,
                records[i].data_offset
            )));
        }

        debug!(records = num_records, "Parsed PDB header");

        Ok(Self {
            name,
            attributes,
            version,
            creation_date,
            modification_date,
            last_backup_date,
            modification_number,
            app_info_id,
            sort_info_id,
            type_id,
            creator,
            unique_id_seed,
            next_record_list_id,
            records,
            gap_to_data,
        })
    }

    /// Database name, decoded up to the first NUL.
    pub fn name(&self) -> String {
        bytes::decode_with(&self.name, encoding_rs::WINDOWS_1252)
    }

    pub fn attributes(&self) -> u16 {
        self.attributes
    }

    /// Labels of the attribute bits that are set.
    pub fn attribute_names(&self) -> Vec<&'static str> {
        format::attributes::names(self.attributes)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn creation_date(&self) -> u32 {
        self.creation_date
    }

    pub fn modification_date(&self) -> u32 {
        self.modification_date
    }

    pub fn last_backup_date(&self) -> u32 {
        self.last_backup_date
    }

    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        format::palm_date_to_utc(self.creation_date)
    }

    pub fn modification_time(&self) -> Option<DateTime<Utc>> {
        format::palm_date_to_utc(self.modification_date)
    }

    pub fn last_backup_time(&self) -> Option<DateTime<Utc>> {
        format::palm_date_to_utc(self.last_backup_date)
    }

    pub fn modification_number(&self) -> u32 {
        self.modification_number
    }

    pub fn app_info_id(&self) -> u32 {
        self.app_info_id
    }

    pub fn sort_info_id(&self) -> u32 {
        self.sort_info_id
    }

    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    pub fn creator(&self) -> u32 {
        self.creator
    }

    /// Type and creator as the usual 8-character tag, e.g. `BOOKMOBI`.
    pub fn type_creator(&self) -> String {
        format!(
            "{}{}",
            format::four_cc(self.type_id),
            format::four_cc(self.creator)
        )
    }

    pub fn unique_id_seed(&self) -> u32 {
        self.unique_id_seed
    }

    pub fn next_record_list_id(&self) -> u32 {
        self.next_record_list_id
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    pub fn record_infos(&self) -> &[RecordInfo] {
        &self.records
    }

    pub fn gap_to_data(&self) -> [u8; GAP_SIZE] {
        self.gap_to_data
    }

    /// Serialized size of preamble, table and gap.
    pub fn size(&self) -> usize {
        PREAMBLE_SIZE + self.records.len() * RECORD_INFO_SIZE + GAP_SIZE
    }

    /// Size of record 0 (the embedded header), or 0 with fewer than 2 records.
    pub fn embedded_header_size(&self) -> usize {
        match self.records.as_slice() {
            [first, second, ..] => (second.data_offset - first.data_offset) as usize,
            _ => 0,
        }
    }

    /// Offset of record 1, or 0 with fewer than 2 records.
    pub fn offset_after_embedded_header(&self) -> usize {
        match self.records.get(1) {
            Some(info) => info.data_offset as usize,
            None => 0,
        }
    }

    /// Shift every record from index 1 onward so that record 0 becomes
    /// `new_size` bytes long. Record 0 itself never moves.
    pub fn adjust_offsets_after_header_resize(&mut self, new_size: usize) {
        if self.records.len() < 2 {
            return;
        }
        let delta = new_size as i64 - self.embedded_header_size() as i64;
        if delta == 0 {
            return;
        }
        for info in self.records.iter_mut().skip(1) {
            info.data_offset = (i64::from(info.data_offset) + delta) as u32;
        }
        debug!(delta, new_size, "Shifted record offsets after header resize");
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.name)?;
        out.write_u16::<BigEndian>(self.attributes)?;
        out.write_u16::<BigEndian>(self.version)?;
        out.write_u32::<BigEndian>(self.creation_date)?;
        out.write_u32::<BigEndian>(self.modification_date)?;
        out.write_u32::<BigEndian>(self.last_backup_date)?;
        out.write_u32::<BigEndian>(self.modification_number)?;
        out.write_u32::<BigEndian>(self.app_info_id)?;
        out.write_u32::<BigEndian>(self.sort_info_id)?;
        out.write_u32::<BigEndian>(self.type_id)?;
        out.write_u32::<BigEndian>(self.creator)?;
        out.write_u32::<BigEndian>(self.unique_id_seed)?;
        out.write_u32::<BigEndian>(self.next_record_list_id)?;
        out.write_u16::<BigEndian>(self.records.len() as u16)?;
        for info in &self.records {
            out.write_u32::<BigEndian>(info.data_offset)?;
            out.write_u32::<BigEndian>(info.attributes_and_unique_id)?;
        }
        out.write_all(&self.gap_to_data)?;
        Ok(())
    }
}
