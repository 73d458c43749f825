//! Before/after size accounting.
//!
//! The conversion pipeline reports each converted image through the observer
//! callback; the CLI feeds those paths into a [`StatsAggregator`], which
//! accumulates running totals and per-item savings for the end-of-run
//! summary. Derived data only — nothing here is persisted.

use std::io;
use std::path::Path;

/// Savings for one converted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSavings {
    pub original_bytes: u64,
    pub new_bytes: u64,
    /// `original - new`; negative when the conversion grew the file.
    pub saved_bytes: i64,
    /// `round(100 - new/original*100)`.
    pub saved_pct: i64,
}

/// Aggregate figures for a completed run with at least one converted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub count: usize,
    pub old_total: u64,
    pub new_total: u64,
    pub saved_bytes: i64,
    pub saved_pct: i64,
    /// Mean original file size, rounded.
    pub avg_original: u64,
    /// Mean per-file saving in bytes, rounded.
    pub avg_saved: i64,
    /// Mean per-file saving percentage, rounded.
    pub avg_pct: i64,
}

/// Accumulates per-item savings across one run.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    old_total: u64,
    new_total: u64,
    items: Vec<ItemSavings>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one conversion from raw byte counts.
    pub fn record(&mut self, original_bytes: u64, new_bytes: u64) -> ItemSavings {
        let item = ItemSavings {
            original_bytes,
            new_bytes,
            saved_bytes: original_bytes as i64 - new_bytes as i64,
            saved_pct: saved_pct(original_bytes, new_bytes),
        };

        self.old_total += original_bytes;
        self.new_total += new_bytes;
        self.items.push(item);
        item
    }

    /// Record one conversion by stat'ing both files.
    pub fn record_files(&mut self, original: &Path, converted: &Path) -> io::Result<ItemSavings> {
        let original_bytes = std::fs::metadata(original)?.len();
        let new_bytes = std::fs::metadata(converted)?.len();
        Ok(self.record(original_bytes, new_bytes))
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Aggregate totals and per-item averages, or `None` when nothing was
    /// converted (guards the division by zero).
    pub fn summary(&self) -> Option<Summary> {
        if self.items.is_empty() {
            return None;
        }
        let count = self.items.len();

        let mean = |total: f64| (total / count as f64).round();
        let saved_sum: i64 = self.items.iter().map(|i| i.saved_bytes).sum();
        let pct_sum: i64 = self.items.iter().map(|i| i.saved_pct).sum();

        Some(Summary {
            count,
            old_total: self.old_total,
            new_total: self.new_total,
            saved_bytes: self.old_total as i64 - self.new_total as i64,
            saved_pct: saved_pct(self.old_total, self.new_total),
            avg_original: mean(self.old_total as f64) as u64,
            avg_saved: mean(saved_sum as f64) as i64,
            avg_pct: mean(pct_sum as f64) as i64,
        })
    }
}

/// Percentage saved, rounded to the nearest integer. Zero-byte originals
/// yield 0 rather than dividing by zero.
fn saved_pct(original_bytes: u64, new_bytes: u64) -> i64 {
    if original_bytes == 0 {
        return 0;
    }
    (100.0 - (new_bytes as f64 / original_bytes as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saved_pct_for_1000_to_400_is_60() {
        assert_eq!(saved_pct(1000, 400), 60);
    }

    #[test]
    fn saved_pct_guards_zero_original() {
        assert_eq!(saved_pct(0, 400), 0);
    }

    #[test]
    fn record_tracks_item_savings() {
        let mut stats = StatsAggregator::new();
        let item = stats.record(1000, 400);

        assert_eq!(item.original_bytes, 1000);
        assert_eq!(item.new_bytes, 400);
        assert_eq!(item.saved_bytes, 600);
        assert_eq!(item.saved_pct, 60);
    }

    #[test]
    fn record_grown_file_yields_negative_savings() {
        let mut stats = StatsAggregator::new();
        let item = stats.record(400, 1000);

        assert_eq!(item.saved_bytes, -600);
        assert_eq!(item.saved_pct, -150);
    }

    #[test]
    fn summary_aggregates_two_items() {
        let mut stats = StatsAggregator::new();
        stats.record(1000, 400);
        stats.record(2000, 1000);

        let summary = stats.summary().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.old_total, 3000);
        assert_eq!(summary.new_total, 1400);
        assert_eq!(summary.saved_bytes, 1600);
        assert_eq!(summary.saved_pct, 53);
        assert_eq!(summary.avg_original, 1500);
        assert_eq!(summary.avg_saved, 800);
        // Item percentages are 60 and 50; their mean rounds to 55.
        assert_eq!(summary.avg_pct, 55);
    }

    #[test]
    fn summary_empty_run_is_none() {
        let stats = StatsAggregator::new();
        assert!(stats.summary().is_none());
    }

    #[test]
    fn record_files_stats_both_paths() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("old.png");
        let new = tmp.path().join("new.jpg");
        std::fs::write(&old, vec![0u8; 1000]).unwrap();
        std::fs::write(&new, vec![0u8; 400]).unwrap();

        let mut stats = StatsAggregator::new();
        let item = stats.record_files(&old, &new).unwrap();

        assert_eq!(item.original_bytes, 1000);
        assert_eq!(item.saved_pct, 60);
        assert_eq!(stats.count(), 1);
    }

    #[test]
    fn record_files_missing_path_errors() {
        let tmp = TempDir::new().unwrap();
        let mut stats = StatsAggregator::new();

        let result = stats.record_files(&tmp.path().join("gone.png"), &tmp.path().join("gone.jpg"));
        assert!(result.is_err());
        assert_eq!(stats.count(), 0);
    }
}
