//! `mobimeta`: read and edit the metadata of MOBI e-books.
//!
//! This crate provides the PDB container codec, the EXTH metadata block,
//! the embedded MOBI header, PalmDOC text decompression, and the helpers
//! the `mobimeta` binary builds on.

pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod exth;
pub mod mobi;
pub mod pdb;

pub use error::{MobiError, Result};
pub use exth::{ExthHeader, ExthRecord};
pub use mobi::{MetaInfo, MobiContainer};
