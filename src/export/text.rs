//! Export a book's text as a plain text file.

use std::path::{Path, PathBuf};

use crate::exth::types;
use crate::mobi::MobiContainer;

/// Write a short header (title, authors) followed by the decoded text.
pub fn export_text(container: &MobiContainer, output: &Path) -> anyhow::Result<PathBuf> {
    let title = container.full_name();
    let path = super::resolve_output(output, &title, "txt");

    let mut content = String::new();
    content.push_str(&format!("Title:   {title}\n"));
    let authors = container.exth_strings(types::AUTHOR);
    if !authors.is_empty() {
        content.push_str(&format!("Author:  {}\n", authors.join(", ")));
    }
    content.push_str(&format!("\n{}\n\n", "-".repeat(72)));
    content.push_str(&container.text_content());
    content.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "Exported text");
    Ok(path)
}
