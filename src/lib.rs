//! # Magento Image Convert
//!
//! Batch-converts the product images referenced by a Magento database to a
//! target format (JPEG by default), optionally rewriting the database rows to
//! point at the converted files, and always emitting a replayable SQL log of
//! every row change.
//!
//! # Architecture: One Directed Pass
//!
//! The tool makes a single pass over the two Magento tables that hold image
//! references:
//!
//! ```text
//! 1. Stream    catalog_product_entity_media_gallery  (all gallery images)
//! 2. Stream    catalog_product_entity_varchar        (image-typed attributes)
//! ```
//!
//! For every row whose stored value is not already in the target format:
//!
//! ```text
//! stored value → absolute file path → converted file → rewritten row value
//!                                                    → UPDATE in output.sql
//!                                                    → live UPDATE (--execute)
//! ```
//!
//! A caller-supplied observer is invoked once per converted image so the CLI
//! can print per-file savings as the run progresses.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Database connection settings sourced from the environment |
//! | [`db`] | MySQL connections, streaming row cursors, row updates |
//! | [`paths`] | Stored value → file path resolution and value rewriting |
//! | [`imaging`] | Decode, bounded downscale, re-encode at fixed quality |
//! | [`sql_log`] | The transactional replay script (`output.sql`) |
//! | [`convert`] | The conversion pipeline — orchestration and fault policy |
//! | [`stats`] | Before/after size accounting for the run summary |
//! | [`output`] | CLI output formatting — per-item lines and the summary |
//!
//! # Design Decisions
//!
//! ## The SQL Log Is Unconditional
//!
//! `output.sql` is generated whether or not `--execute` is passed. A dry run
//! therefore produces a complete, auditable script that a DBA can review and
//! replay later — the live-update flag only controls whether the same
//! statements are also applied to the running database inside a transaction.
//!
//! ## All-or-Nothing Failure
//!
//! Any fatal error (missing gallery file, transcode failure, database error)
//! rolls back the open transaction and aborts the run *without* writing
//! `output.sql`. A partial replay script is worse than none: replaying it
//! would leave the catalog referencing a mix of converted and unconverted
//! files. Converted image files already written before the abort are left on
//! disk; they are harmless because no surviving row references them.
//!
//! ## Two Fault Policies, One Code Path
//!
//! Gallery rows are authoritative — a missing file there means the catalog
//! and the filesystem disagree, and the run aborts. Attribute varchar rows
//! are less reliably image paths, so a missing file only skips that row.
//! Both streams run through the same per-item sequence, parameterized by a
//! missing-file policy rather than duplicated code.
//!
//! ## Streaming Cursors, Bounded Memory
//!
//! Product media tables can hold hundreds of thousands of rows. Both sources
//! are read through keyset-paginated cursors (`value_id > last … LIMIT n`) on
//! a dedicated read connection, so memory use is bounded by the fetch batch
//! size and row updates never share a session with an open result set.

pub mod config;
pub mod convert;
pub mod db;
pub mod imaging;
pub mod output;
pub mod paths;
pub mod sql_log;
pub mod stats;
