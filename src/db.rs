//! MySQL access: streaming row sources and row updates.
//!
//! Two connections are opened per run. The *read* connection serves the
//! streaming cursors; the *write* connection owns the optional transaction
//! and applies row updates. Keeping them separate means an update never has
//! to wait for (or interleave with) an open result set on the same session.
//!
//! ## Row sources
//!
//! Both sources are forward-only cursors over `value_id`-keyed tables,
//! fetched in fixed-size batches with keyset pagination
//! (`WHERE value_id > last ORDER BY value_id LIMIT n`). Memory use is
//! bounded by [`FETCH_BATCH`] regardless of catalog size, and each call to
//! [`RecordReader::gallery`] / [`RecordReader::attributes`] starts a fresh
//! cursor.

use crate::config::DbConfig;
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder};
use std::collections::VecDeque;

/// Rows fetched per round-trip by the streaming cursors.
pub const FETCH_BATCH: usize = 256;

/// The two Magento tables that store image references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTable {
    /// `catalog_product_entity_media_gallery` — multiple images per product.
    MediaGallery,
    /// `catalog_product_entity_varchar` — single-valued image attributes
    /// (thumbnail, image, small_image).
    AttributeVarchar,
}

impl SourceTable {
    pub fn base_name(self) -> &'static str {
        match self {
            Self::MediaGallery => "catalog_product_entity_media_gallery",
            Self::AttributeVarchar => "catalog_product_entity_varchar",
        }
    }

    /// Table name with the configured Magento prefix applied.
    pub fn qualified(self, prefix: &str) -> String {
        format!("{prefix}{}", self.base_name())
    }
}

/// One candidate row: an image reference that is not yet in the target
/// format. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub value_id: u64,
    /// The stored catalog-relative value, e.g. `/a/b/photo.png`.
    pub value: String,
    pub table: SourceTable,
}

/// Open the read and write connections for one run.
pub fn connect(
    config: &DbConfig,
    database: &str,
) -> Result<(RecordReader, DbWriter), mysql::Error> {
    let opts: Opts = OptsBuilder::new()
        .ip_or_hostname(Some(config.host.as_str()))
        .tcp_port(config.port)
        .user(Some(config.username.as_str()))
        .pass(Some(config.password.as_str()))
        .db_name(Some(database))
        .into();

    let reader = RecordReader {
        conn: Conn::new(opts.clone())?,
        prefix: config.prefix.clone(),
    };
    let writer = DbWriter {
        conn: Conn::new(opts)?,
    };

    Ok((reader, writer))
}

/// Read side: produces the streaming row cursors.
pub struct RecordReader {
    conn: Conn,
    prefix: String,
}

impl RecordReader {
    /// Stream all gallery rows whose value is not already in the target
    /// format.
    pub fn gallery<'a>(&'a mut self, target_format: &str) -> RowStream<'a> {
        RowStream::new(
            &mut self.conn,
            gallery_query(&self.prefix),
            not_like_pattern(target_format),
            SourceTable::MediaGallery,
        )
    }

    /// Stream all varchar rows belonging to an image-typed attribute whose
    /// value is not already in the target format.
    ///
    /// The attribute set is resolved first: labels exactly `thumbnail`,
    /// `image`, or `small_image`, or ending in `small_image`. This matching
    /// is carried over from the original migration verbatim; widening or
    /// narrowing it changes which rows are selected.
    pub fn attributes<'a>(&'a mut self, target_format: &str) -> Result<RowStream<'a>, mysql::Error> {
        let attribute_ids: Vec<u64> = self.conn.query(attribute_ids_query(&self.prefix))?;

        let mut stream = RowStream::new(
            &mut self.conn,
            varchar_query(&self.prefix, &attribute_ids),
            not_like_pattern(target_format),
            SourceTable::AttributeVarchar,
        );
        // No image attributes defined: nothing can match, skip querying.
        if attribute_ids.is_empty() {
            stream.done = true;
        }
        Ok(stream)
    }
}

/// A forward-only, keyset-paginated cursor over one row source.
pub struct RowStream<'a> {
    conn: &'a mut Conn,
    query: String,
    pattern: String,
    table: SourceTable,
    buffer: VecDeque<(u64, String)>,
    last_id: u64,
    done: bool,
}

impl<'a> RowStream<'a> {
    fn new(conn: &'a mut Conn, query: String, pattern: String, table: SourceTable) -> Self {
        Self {
            conn,
            query,
            pattern,
            table,
            buffer: VecDeque::new(),
            last_id: 0,
            done: false,
        }
    }

    fn refill(&mut self) -> Result<(), mysql::Error> {
        let rows: Vec<(u64, String)> = self.conn.exec(
            self.query.as_str(),
            (self.last_id, self.pattern.as_str(), FETCH_BATCH as u64),
        )?;

        if rows.len() < FETCH_BATCH {
            self.done = true;
        }
        if let Some((id, _)) = rows.last() {
            self.last_id = *id;
        }
        self.buffer.extend(rows);
        Ok(())
    }
}

impl Iterator for RowStream<'_> {
    type Item = Result<ImageReference, mysql::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            if self.done {
                return None;
            }
            if let Err(e) = self.refill() {
                self.done = true;
                return Some(Err(e));
            }
        }

        self.buffer.pop_front().map(|(value_id, value)| {
            Ok(ImageReference {
                value_id,
                value,
                table: self.table,
            })
        })
    }
}

/// Write side: row updates and transaction control for execute mode.
pub struct DbWriter {
    conn: Conn,
}

impl DbWriter {
    pub fn begin(&mut self) -> Result<(), mysql::Error> {
        self.conn.query_drop("START TRANSACTION")
    }

    pub fn commit(&mut self) -> Result<(), mysql::Error> {
        self.conn.query_drop("COMMIT")
    }

    pub fn rollback(&mut self) -> Result<(), mysql::Error> {
        self.conn.query_drop("ROLLBACK")
    }

    /// Rewrite one row's stored value. `LIMIT 1` mirrors the replay log:
    /// at most one row is touched per statement.
    pub fn update_value(
        &mut self,
        table: &str,
        value_id: u64,
        new_value: &str,
    ) -> Result<(), mysql::Error> {
        let statement = format!("UPDATE {table} SET value = ? WHERE value_id = ? LIMIT 1");
        self.conn.exec_drop(statement, (new_value, value_id))
    }
}

fn not_like_pattern(target_format: &str) -> String {
    format!("%.{target_format}")
}

fn gallery_query(prefix: &str) -> String {
    format!(
        "SELECT value_id, value FROM {prefix}catalog_product_entity_media_gallery \
         WHERE value_id > ? AND value NOT LIKE ? \
         ORDER BY value_id LIMIT ?"
    )
}

fn attribute_ids_query(prefix: &str) -> String {
    format!(
        "SELECT attribute_id FROM {prefix}eav_attribute \
         WHERE frontend_label IN ('thumbnail', 'image', 'small_image') \
         OR frontend_label LIKE '%small_image'"
    )
}

/// Attribute ids come from our own query against `eav_attribute`, so they are
/// inlined rather than bound — the id list length varies per catalog.
fn varchar_query(prefix: &str, attribute_ids: &[u64]) -> String {
    let ids = attribute_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT value_id, value FROM {prefix}catalog_product_entity_varchar \
         WHERE value_id > ? AND attribute_id IN ({ids}) \
         AND value IS NOT NULL AND value NOT LIKE ? \
         ORDER BY value_id LIMIT ?"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_table_names_carry_prefix() {
        assert_eq!(
            SourceTable::MediaGallery.qualified("mg_"),
            "mg_catalog_product_entity_media_gallery"
        );
        assert_eq!(
            SourceTable::AttributeVarchar.qualified(""),
            "catalog_product_entity_varchar"
        );
    }

    #[test]
    fn not_like_pattern_targets_extension() {
        assert_eq!(not_like_pattern("jpg"), "%.jpg");
        assert_eq!(not_like_pattern("webp"), "%.webp");
    }

    #[test]
    fn gallery_query_filters_and_paginates() {
        let query = gallery_query("mg_");
        assert!(query.contains("FROM mg_catalog_product_entity_media_gallery"));
        assert!(query.contains("value_id > ?"));
        assert!(query.contains("value NOT LIKE ?"));
        assert!(query.contains("ORDER BY value_id LIMIT ?"));
    }

    #[test]
    fn attribute_ids_query_matches_exact_and_suffix_labels() {
        let query = attribute_ids_query("");
        assert!(query.contains("FROM eav_attribute"));
        assert!(query.contains("IN ('thumbnail', 'image', 'small_image')"));
        assert!(query.contains("LIKE '%small_image'"));
    }

    #[test]
    fn varchar_query_inlines_attribute_ids_and_requires_value() {
        let query = varchar_query("mg_", &[12, 34, 56]);
        assert!(query.contains("FROM mg_catalog_product_entity_varchar"));
        assert!(query.contains("attribute_id IN (12, 34, 56)"));
        assert!(query.contains("value IS NOT NULL"));
        assert!(query.contains("value NOT LIKE ?"));
    }
}
