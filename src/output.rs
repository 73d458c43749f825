//! CLI output formatting.
//!
//! Format functions are pure — no I/O, no side effects — and return strings
//! for `main` to print, which keeps them unit-testable. The layout follows
//! the migration's original report:
//!
//! ```text
//! 1 - photo.png (2.00 MB) => photo.jpg (800.00 KB) - Saved: 1.20 MB (60%)
//! ...
//! Total 2 images converted: 2.93 KB => 1.37 KB - Saved: 1.56 KB (53%)
//! Average file size: 1.46 KB - Average save per file: 800 B (55%)
//! ```

use crate::stats::{ItemSavings, Summary};
use std::path::Path;

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte size with binary (1024) unit breakpoints.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Signed variant for savings figures, which can be negative when a
/// conversion grew the file.
pub fn format_bytes_signed(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_bytes(bytes.unsigned_abs()))
    } else {
        format_bytes(bytes as u64)
    }
}

/// One numbered progress line per converted image.
pub fn format_item_line(
    index: usize,
    old_path: &Path,
    new_path: &Path,
    item: &ItemSavings,
) -> String {
    format!(
        "{index} - {} ({}) => {} ({}) - Saved: {} ({}%)",
        file_name(old_path),
        format_bytes(item.original_bytes),
        file_name(new_path),
        format_bytes(item.new_bytes),
        format_bytes_signed(item.saved_bytes),
        item.saved_pct,
    )
}

/// The two-line aggregate summary printed after a run that converted at
/// least one image.
pub fn format_summary(summary: &Summary) -> Vec<String> {
    vec![
        format!(
            "Total {} images converted: {} => {} - Saved: {} ({}%)",
            summary.count,
            format_bytes(summary.old_total),
            format_bytes(summary.new_total),
            format_bytes_signed(summary.saved_bytes),
            summary.saved_pct,
        ),
        format!(
            "Average file size: {} - Average save per file: {} ({}%)",
            format_bytes(summary.avg_original),
            format_bytes_signed(summary.avg_saved),
            summary.avg_pct,
        ),
    ]
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
