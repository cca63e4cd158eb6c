//! Palm Database container: preamble, record table, and record addressing.

pub mod format;
pub mod header;

pub use header::{PdbHeader, RecordInfo};
