//! The conversion pipeline.
//!
//! Drives the full pass: stream candidate rows → resolve the file on disk →
//! transcode → rewrite the row value (replay log always, live database only
//! in execute mode) → notify the observer. The pipeline exclusively owns the
//! SQL log and the optional database transaction for the duration of the run.
//!
//! ## Run shape
//!
//! ```text
//! connect ─→ [execute: START TRANSACTION]
//!         ─→ gallery stream     (missing file: fatal)
//!         ─→ attribute stream   (missing file: skip row)
//!         ─→ [execute: COMMIT]
//!         ─→ write output.sql
//! ```
//!
//! Any fatal error — including a failed commit — rolls back the open
//! transaction and propagates to the caller; `output.sql` is written only
//! after a fully successful pass, so a partial script can never be replayed.
//! Converted files already on disk when a run aborts are acceptable debris —
//! nothing in the database references them.
//!
//! The row loop ([`convert_rows`]) is generic over the row iterator and the
//! write side ([`LiveUpdates`]), so the fault-policy and log-persistence
//! behavior is unit-tested against in-memory rows and a recording writer;
//! only the real connections live at the edge.

use crate::config::DbConfig;
use crate::db::{self, DbWriter, ImageReference, RecordReader, SourceTable};
use crate::imaging::{self, TranscodeError};
use crate::paths::{self, FileNotFound};
use crate::sql_log::SqlLogBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the replay script written in the working directory.
pub const SQL_LOG_FILE: &str = "output.sql";

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("database error: {0}")]
    Database(#[from] mysql::Error),
    #[error(transparent)]
    MissingImage(#[from] FileNotFound),
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-item notification: `(old_absolute_path, new_absolute_path)`, invoked
/// synchronously once per converted image, after its row update is applied.
/// Must not panic — errors inside the observer are the caller's to handle.
pub type Observer<'a> = dyn FnMut(&Path, &Path) + 'a;

/// Write-side operations used in execute mode.
///
/// The production implementation is [`DbWriter`]; tests substitute a
/// recording double so transaction sequencing and row updates are covered
/// without a live server.
pub trait LiveUpdates {
    fn begin(&mut self) -> Result<(), ConvertError>;
    fn commit(&mut self) -> Result<(), ConvertError>;
    fn rollback(&mut self) -> Result<(), ConvertError>;
    fn update_value(
        &mut self,
        table: &str,
        value_id: u64,
        new_value: &str,
    ) -> Result<(), ConvertError>;
}

impl LiveUpdates for DbWriter {
    fn begin(&mut self) -> Result<(), ConvertError> {
        Ok(DbWriter::begin(self)?)
    }

    fn commit(&mut self) -> Result<(), ConvertError> {
        Ok(DbWriter::commit(self)?)
    }

    fn rollback(&mut self) -> Result<(), ConvertError> {
        Ok(DbWriter::rollback(self)?)
    }

    fn update_value(
        &mut self,
        table: &str,
        value_id: u64,
        new_value: &str,
    ) -> Result<(), ConvertError> {
        Ok(DbWriter::update_value(self, table, value_id, new_value)?)
    }
}

/// What to do when a stored value resolves to a file that is not on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingFilePolicy {
    /// The catalog and filesystem disagree on authoritative data: abort.
    Fatal,
    /// The value may not be an image path at all: log and move on.
    SkipRow,
}

/// Parameters for one row source passing through the shared item sequence.
struct StreamConfig<'a> {
    table_name: String,
    policy: MissingFilePolicy,
    base_path: &'a Path,
    target_format: &'a str,
}

/// One conversion run over both row sources.
pub struct Converter {
    reader: RecordReader,
    writer: DbWriter,
    log: SqlLogBuilder,
    base_path: PathBuf,
    target_format: String,
    table_prefix: String,
    execute: bool,
}

impl Converter {
    /// Open the database connections and prepare a run.
    ///
    /// `base_path` is canonicalized so the observer always receives absolute
    /// paths, matching what gets printed and stat'ed by the CLI.
    pub fn connect(
        base_path: &Path,
        database: &str,
        target_format: &str,
        execute: bool,
        db_config: &DbConfig,
    ) -> Result<Self, ConvertError> {
        let (reader, writer) = db::connect(db_config, database)?;

        Ok(Self {
            reader,
            writer,
            log: SqlLogBuilder::new(),
            base_path: base_path.canonicalize()?,
            target_format: target_format.to_string(),
            table_prefix: db_config.prefix.clone(),
            execute,
        })
    }

    /// Execute the full conversion pass.
    ///
    /// On success the live transaction (if any) is committed and the replay
    /// log is persisted to [`SQL_LOG_FILE`]. On failure the transaction is
    /// rolled back, no log file is written, and the error propagates.
    pub fn run(self, observer: &mut Observer) -> Result<(), ConvertError> {
        let Self {
            mut reader,
            mut writer,
            log,
            base_path,
            target_format,
            table_prefix,
            execute,
        } = self;

        run_pass(
            execute,
            &mut writer,
            log,
            Path::new(SQL_LOG_FILE),
            |writer, log| {
                let gallery = StreamConfig {
                    table_name: SourceTable::MediaGallery.qualified(&table_prefix),
                    policy: MissingFilePolicy::Fatal,
                    base_path: &base_path,
                    target_format: &target_format,
                };
                let live = if execute { Some(&mut *writer) } else { None };
                convert_rows(
                    reader.gallery(&target_format),
                    &gallery,
                    log,
                    live,
                    &mut *observer,
                )?;

                let attributes = StreamConfig {
                    table_name: SourceTable::AttributeVarchar.qualified(&table_prefix),
                    policy: MissingFilePolicy::SkipRow,
                    base_path: &base_path,
                    target_format: &target_format,
                };
                let live = if execute { Some(&mut *writer) } else { None };
                convert_rows(
                    reader.attributes(&target_format)?,
                    &attributes,
                    log,
                    live,
                    &mut *observer,
                )
            },
        )
    }
}

/// Transaction bracketing and log persistence around the row pass.
///
/// The replay script reaches disk only when the pass — and, in execute mode,
/// the commit — succeeded; every failure path rolls back first and leaves no
/// log artifact behind.
fn run_pass<W: LiveUpdates>(
    execute: bool,
    writer: &mut W,
    mut log: SqlLogBuilder,
    log_path: &Path,
    pass: impl FnOnce(&mut W, &mut SqlLogBuilder) -> Result<(), ConvertError>,
) -> Result<(), ConvertError> {
    if execute {
        writer.begin()?;
    }

    // A failed COMMIT is a database error like any other: the transaction
    // state is unknown, so roll back and abort without persisting the log.
    let result = pass(&mut *writer, &mut log).and_then(|()| {
        if execute {
            writer.commit()
        } else {
            Ok(())
        }
    });

    match result {
        Ok(()) => {
            std::fs::write(log_path, log.finalize())?;
            Ok(())
        }
        Err(err) => {
            if execute {
                if let Err(rollback_err) = writer.rollback() {
                    log::error!("rollback failed: {rollback_err}");
                }
            }
            Err(err)
        }
    }
}

/// Run one row source through the shared per-item sequence. The two sources
/// differ only in their missing-file policy.
fn convert_rows<W: LiveUpdates>(
    rows: impl Iterator<Item = Result<ImageReference, mysql::Error>>,
    config: &StreamConfig<'_>,
    log: &mut SqlLogBuilder,
    mut live: Option<&mut W>,
    observer: &mut Observer,
) -> Result<(), ConvertError> {
    for reference in rows {
        let reference = reference?;

        let source = match paths::resolve_image_path(config.base_path, &reference.value) {
            Ok(path) => path,
            Err(err) => match config.policy {
                MissingFilePolicy::Fatal => return Err(err.into()),
                MissingFilePolicy::SkipRow => {
                    log::warn!(
                        "skipping {} row {}: {err}",
                        config.table_name,
                        reference.value_id
                    );
                    continue;
                }
            },
        };

        let converted = imaging::transcode(&source, config.target_format)?;
        let new_value = paths::rewrite_stored_value(&reference.value, config.target_format);

        log.append(&config.table_name, reference.value_id, &new_value);
        if let Some(writer) = live.as_mut() {
            writer.update_value(&config.table_name, reference.value_id, &new_value)?;
        }

        observer(&source, &converted);
    }

    Ok(())
}
