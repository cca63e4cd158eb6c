//! The MOBI layer: record 0, the container around it, and what can be
//! derived from both.

pub mod container;
pub mod header;
pub mod info;
pub mod locale;
pub mod text;

pub use container::MobiContainer;
pub use header::{Compression, MobiHeader};
pub use info::MetaInfo;
