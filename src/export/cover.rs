//! Cover image export.

use std::path::{Path, PathBuf};

use crate::mobi::container::JPEG_MAGIC;
use crate::mobi::MobiContainer;

/// Image formats found in MOBI image records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Gif,
    Png,
    Bmp,
    Unknown,
}

impl ImageKind {
    /// Identify an image by its leading magic bytes.
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(&JPEG_MAGIC) {
            Self::Jpeg
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Self::Gif
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Self::Png
        } else if data.starts_with(b"BM") {
            Self::Bmp
        } else {
            Self::Unknown
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Unknown => "bin",
        }
    }
}

/// Write the cover (or thumbnail) of `container` to `output`.
///
/// A directory output receives `<full name>.<ext>`; a path without an
/// extension gets the sniffed one.
pub fn export_cover(container: &MobiContainer, output: &Path) -> anyhow::Result<PathBuf> {
    let data = container
        .cover_or_thumb()
        .ok_or_else(|| anyhow::anyhow!("No cover or thumbnail image found"))?;
    let kind = ImageKind::sniff(&data);
    if kind == ImageKind::Unknown {
        tracing::warn!(size = data.len(), "Cover record has an unrecognized image format");
    }

    let path = super::resolve_output(output, &container.full_name(), kind.extension());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &data)?;
    tracing::info!(path = %path.display(), bytes = data.len(), "Exported cover");
    Ok(path)
}
