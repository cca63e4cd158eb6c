//! EXTH metadata: typed records, the block that holds them, and the type registry.

pub mod header;
pub mod record;
pub mod registry;

pub use header::ExthHeader;
pub use record::ExthRecord;

/// Well-known record types used by the container and CLI.
pub mod types {
    pub const AUTHOR: u32 = 100;
    pub const PUBLISHER: u32 = 101;
    pub const DESCRIPTION: u32 = 103;
    pub const ISBN: u32 = 104;
    pub const SUBJECT: u32 = 105;
    pub const PUBLISHING_DATE: u32 = 106;
    pub const RIGHTS: u32 = 109;
    pub const ASIN: u32 = 113;
    pub const COVER_OFFSET: u32 = 201;
    pub const THUMB_OFFSET: u32 = 202;
    pub const UPDATED_TITLE: u32 = 503;
    pub const LANGUAGE: u32 = 524;
}
