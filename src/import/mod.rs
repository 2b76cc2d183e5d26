// ABOUTME: Import side of the pipeline
// ABOUTME: Streams a dump file through the translator into one FreeFeed table

pub mod translate;
pub mod writer;

use crate::dump::read_dump_file;
use crate::error::Result;
use crate::tables::FfTable;
use std::path::Path;
use tokio_postgres::GenericClient;

pub use translate::translate;
pub use writer::{insert_row, insert_statement};

/// Row counts for one imported table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableImportStats {
    pub rows_read: usize,
    pub rows_inserted: u64,
}

impl TableImportStats {
    /// Rows skipped because they already existed in FreeFeed
    pub fn rows_skipped(&self) -> u64 {
        self.rows_read as u64 - self.rows_inserted
    }
}

/// Import `table` from the dump at `dump_path`
///
/// Rows are parsed, translated and inserted one at a time. The first bad row
/// stops the table; the caller decides whether the surrounding transaction
/// commits.
pub async fn import_table<C: GenericClient>(
    client: &C,
    table: FfTable,
    dump_path: &Path,
) -> Result<TableImportStats> {
    tracing::info!(
        "Importing '{}' from {}",
        table,
        dump_path.display()
    );

    let mut stats = TableImportStats::default();
    for (index, row) in read_dump_file(dump_path)?.enumerate() {
        let translated = translate(table, &row?, index)?;
        stats.rows_inserted += insert_row(client, table, translated, index).await?;
        stats.rows_read += 1;

        if stats.rows_read % 1000 == 0 {
            tracing::debug!("  {} rows processed for '{}'", stats.rows_read, table);
        }
    }

    tracing::info!(
        "✓ Imported '{}': {} rows read, {} inserted, {} skipped",
        table,
        stats.rows_read,
        stats.rows_inserted,
        stats.rows_skipped()
    );

    Ok(stats)
}
