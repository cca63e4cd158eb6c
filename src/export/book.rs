//! Saving an edited book to a new file.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::mobi::MobiContainer;

/// Save `container` to `output`, refusing to replace the file it was read
/// from and, unless `overwrite` is set, any other existing file.
pub fn save_book(
    container: &mut MobiContainer,
    output: &Path,
    pack: bool,
    overwrite: bool,
) -> anyhow::Result<PathBuf> {
    if let Some(source) = container.path() {
        if same_file(source, output) {
            anyhow::bail!(
                "Refusing to overwrite the input file {}; choose another output",
                output.display()
            );
        }
    }
    if output.exists() && !overwrite {
        anyhow::bail!(
            "{} already exists (set save.overwrite = true to replace it)",
            output.display()
        );
    }

    container
        .save_to_path(output, pack)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    Ok(output.to_path_buf())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
