//! Writing things out of a book: edited copies, cover images, plain text.

pub mod book;
pub mod cover;
pub mod text;

use std::path::{Path, PathBuf};

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "book".to_string()
    } else {
        sanitized
    }
}

/// Resolve `output`: a directory gets `<default_stem>.<ext>` inside it, a path
/// without an extension gets `ext` appended, anything else is used as is.
pub fn resolve_output(output: &Path, default_stem: &str, ext: &str) -> PathBuf {
    if output.is_dir() {
        output.join(format!("{}.{ext}", sanitize_filename_part(default_stem, 120)))
    } else if output.extension().is_none() {
        output.with_extension(ext)
    } else {
        output.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_filename_part("A Tale: Part 2/3", 50), "A_Tale__Part_2_3");
        assert_eq!(sanitize_filename_part("   ", 50), "book");
        assert_eq!(sanitize_filename_part("abcdef", 3), "abc");
    }

    #[test]
    fn test_resolve_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            resolve_output(dir.path(), "My Book", "jpg"),
            dir.path().join("My_Book.jpg")
        );
        assert_eq!(
            resolve_output(Path::new("/nonexistent/cover"), "x", "png"),
            PathBuf::from("/nonexistent/cover.png")
        );
        assert_eq!(
            resolve_output(Path::new("/nonexistent/c.img"), "x", "png"),
            PathBuf::from("/nonexistent/c.img")
        );
    }
}
