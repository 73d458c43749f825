//! Stored-value path handling.
//!
//! Magento stores image references as catalog-relative values like
//! `/a/b/photo.png`. This module maps those values to absolute files under
//! the product media root, and rewrites them to point at a converted file.
//! Rewriting works on the stored *string* (always `/`-separated, regardless
//! of host OS) so the database value and the file written by the transcoder
//! stay in lockstep.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Product media directory, relative to the Magento project root.
pub const PRODUCT_MEDIA_ROOT: &str = "media/catalog/product";

/// A stored image value resolved to a path that does not exist on disk.
#[derive(Error, Debug)]
#[error("image file {} not found", .0.display())]
pub struct FileNotFound(pub PathBuf);

/// Resolve a database-stored image value to an absolute path under the
/// product media root, verifying that the file exists.
///
/// Stored values begin with `/`; the leading separator is stripped before
/// joining so the value cannot escape or replace `base_path`.
pub fn resolve_image_path(base_path: &Path, stored_value: &str) -> Result<PathBuf, FileNotFound> {
    let path = base_path
        .join(PRODUCT_MEDIA_ROOT)
        .join(stored_value.trim_start_matches('/'));

    if !path.is_file() {
        return Err(FileNotFound(path));
    }

    Ok(path)
}

/// Rewrite a stored value to reference the converted file: the directory part
/// is kept verbatim, and the extension of the final segment is replaced.
///
/// Only the extension is touched — a format string occurring elsewhere in the
/// value (directory names, file stems) is never substituted. The semantics
/// match [`Path::with_extension`] on the final segment, which is how the
/// transcoder names its output file.
pub fn rewrite_stored_value(stored_value: &str, target_format: &str) -> String {
    let (dir, name) = match stored_value.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, stored_value),
    };

    // Dotfiles ('.htaccess') have no extension; append rather than replace.
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };

    match dir {
        Some(dir) => format!("{dir}/{stem}.{target_format}"),
        None => format!("{stem}.{target_format}"),
    }
}
