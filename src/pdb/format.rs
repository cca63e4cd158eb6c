//! Palm Database (PDB) container layout.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ PREAMBLE (78 bytes, fixed)           │
//! │  name: [u8; 32] (NUL padded)         │
//! │  attributes: u16, version: u16       │
//! │  creation / modification /           │
//! │  last backup dates: u32 ×3           │
//! │  modification_number: u32           │
//! │  app_info_id, sort_info_id: u32      │
//! │  type, creator: u32 (FourCC)         │
//! │  unique_id_seed: u32                 │
//! │  next_record_list_id: u32            │
//! │  num_records: u16                    │
//! ├──────────────────────────────────────┤
//! │ RECORD TABLE (8 bytes × num_records) │
//! │  data_offset: u32                    │
//! │  attributes_and_unique_id: u32       │
//! ├──────────────────────────────────────┤
//! │ GAP (2 bytes, preserved verbatim)    │
//! ├──────────────────────────────────────┤
//! │ RECORD DATA (absolute offsets)       │
//! └──────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeZone, Utc};

/// Size of the fixed preamble.
pub const PREAMBLE_SIZE: usize = 78;

/// Size of the NUL-padded database name.
pub const NAME_SIZE: usize = 32;

/// Size of one record descriptor.
pub const RECORD_INFO_SIZE: usize = 8;

/// Reserved bytes between the record table and the first record.
pub const GAP_SIZE: usize = 2;

/// Type/creator pair identifying a MOBI book.
pub const BOOKMOBI: &[u8; 8] = b"BOOKMOBI";

/// Type/creator pair identifying a plain PalmDOC text.
pub const TEXTREAD: &[u8; 8] = b"TEXtREAd";

/// Database attribute bits.
pub mod attributes {
    pub const READ_ONLY: u16 = 0x0002;
    pub const DIRTY_APP_INFO: u16 = 0x0004;
    pub const BACKUP: u16 = 0x0008;
    pub const INSTALL_NEWER_OK: u16 = 0x0010;
    pub const RESET_AFTER_INSTALL: u16 = 0x0020;
    pub const NO_BEAM_COPY: u16 = 0x0040;

    /// Bit / label pairs, in bit order.
    pub const NAMED: &[(u16, &str)] = &[
        (READ_ONLY, "read-only"),
        (DIRTY_APP_INFO, "dirty-app-info"),
        (BACKUP, "backup"),
        (INSTALL_NEWER_OK, "install-newer-ok"),
        (RESET_AFTER_INSTALL, "reset-after-install"),
        (NO_BEAM_COPY, "no-beam-copy"),
    ];

    /// Labels of every bit set in `value`.
    pub fn names(value: u16) -> Vec<&'static str> {
        NAMED
            .iter()
            .filter(|(bit, _)| value & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Seconds between 1904-01-01 (Palm epoch) and 1970-01-01.
const PALM_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Convert a PDB timestamp.
///
/// Values with the high bit set count seconds from 1904-01-01 (original
/// Palm OS convention); others are Unix seconds. Zero means "never".
pub fn palm_date_to_utc(value: u32) -> Option<DateTime<Utc>> {
    if value == 0 {
        return None;
    }
    let seconds = if value & 0x8000_0000 != 0 {
        i64::from(value) - PALM_EPOCH_OFFSET
    } else {
        i64::from(value)
    };
    Utc.timestamp_opt(seconds, 0).single()
}

/// Four-character code (type or creator) as text.
pub fn four_cc(value: u32) -> String {
    value
        .to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}
