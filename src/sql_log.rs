//! The SQL replay log.
//!
//! Every row rewrite performed (or that would be performed) during a run is
//! recorded as one idempotent `UPDATE … LIMIT 1` statement inside a
//! `START TRANSACTION;` / `COMMIT;` bracket. The resulting script is written
//! to `output.sql` at the end of a successful run and can be replayed
//! standalone — whether or not the live database was updated in the same run.

use std::fmt::Write;

/// Accumulates the transactional replay script for one conversion run.
///
/// Append-only; [`finalize`](Self::finalize) consumes the builder so no
/// statements can be added after the commit marker.
#[derive(Debug)]
pub struct SqlLogBuilder {
    script: String,
}

impl SqlLogBuilder {
    pub fn new() -> Self {
        Self {
            script: String::from("START TRANSACTION;\n"),
        }
    }

    /// Append one single-row update. `LIMIT 1` caps the statement at one row
    /// even if `value_id` were ever non-unique in a damaged catalog.
    pub fn append(&mut self, table: &str, value_id: u64, new_value: &str) {
        // Writing to a String cannot fail.
        let _ = writeln!(
            self.script,
            "UPDATE {table} SET value = '{}' WHERE value_id = {value_id} LIMIT 1;",
            escape(new_value)
        );
    }

    /// Close the transaction bracket and return the full script.
    pub fn finalize(mut self) -> String {
        self.script.push_str("COMMIT;\n");
        self.script
    }
}

impl Default for SqlLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// MySQL single-quoted string escaping: backslashes first, then quotes.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_is_a_bare_transaction() {
        let log = SqlLogBuilder::new();
        assert_eq!(log.finalize(), "START TRANSACTION;\nCOMMIT;\n");
    }

    #[test]
    fn append_emits_single_row_update() {
        let mut log = SqlLogBuilder::new();
        log.append("catalog_product_entity_media_gallery", 7, "/a/b/photo.jpg");

        let script = log.finalize();
        assert!(script.contains(
            "UPDATE catalog_product_entity_media_gallery \
             SET value = '/a/b/photo.jpg' WHERE value_id = 7 LIMIT 1;"
        ));
    }

    #[test]
    fn statements_keep_insertion_order() {
        let mut log = SqlLogBuilder::new();
        log.append("t", 1, "/first.jpg");
        log.append("t", 2, "/second.jpg");

        let script = log.finalize();
        assert_eq!(script.matches("UPDATE ").count(), 2);
        let first = script.find("value_id = 1").unwrap();
        let second = script.find("value_id = 2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn script_brackets_updates_with_transaction_markers() {
        let mut log = SqlLogBuilder::new();
        log.append("t", 1, "/a.jpg");

        let script = log.finalize();
        assert!(script.starts_with("START TRANSACTION;\n"));
        assert!(script.ends_with("COMMIT;\n"));
        assert_eq!(script.matches("COMMIT;").count(), 1);
        assert_eq!(script.matches("UPDATE ").count(), 1);
    }

    #[test]
    fn values_are_escaped_for_mysql() {
        let mut log = SqlLogBuilder::new();
        log.append("t", 3, "/a/it's a back\\slash.jpg");

        let script = log.finalize();
        assert!(script.contains("SET value = '/a/it\\'s a back\\\\slash.jpg'"));
    }
}
