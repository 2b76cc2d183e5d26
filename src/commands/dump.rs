// ABOUTME: dump-ls-db command - export LibertySoil tables to JSON dump files
// ABOUTME: Reads each table in fixed order and stops at the first failure

use crate::commands::CommandSummary;
use crate::config::MigratorConfig;
use crate::dump::write_table;
use crate::error::Result;
use crate::export::{read_table, PageSource, PostgresTable};
use crate::postgres::{connect_endpoint, Endpoint};
use crate::tables::LsTable;
use anyhow::Context;
use std::future::Future;
use std::path::Path;

/// Export every LibertySoil table to `<dump_dir>/<table>.json`
///
/// Opens one source connection, dumps `users`, `posts`, `comments`,
/// `followers` and `likes` in that order, then closes the connection. The
/// first failing table aborts the rest; dump files already written stay on
/// disk.
pub async fn dump_ls_db(config: &MigratorConfig) -> anyhow::Result<CommandSummary> {
    tracing::info!(
        "Dumping LibertySoil database to {}",
        config.dump_dir.display()
    );

    let client = connect_endpoint(Endpoint::Source, config.ls_conn.as_deref())
        .await
        .context("Failed to connect to LibertySoil database")?;

    let result = dump_tables(
        &LsTable::ALL,
        |table| PostgresTable::open(&client, table.name()),
        &config.dump_dir,
        config.batch_size,
    )
    .await;

    drop(client);
    tracing::debug!("Closed LibertySoil connection");

    let summary = result.context("LibertySoil dump failed")?;
    tracing::info!(
        "✓ Dumped {} tables ({} rows)",
        summary.tables.len(),
        summary.total_rows()
    );

    Ok(summary)
}

/// Dump `tables` in order, opening each through `open`
pub async fn dump_tables<S, F, Fut>(
    tables: &[LsTable],
    mut open: F,
    dump_dir: &Path,
    batch_size: usize,
) -> Result<CommandSummary>
where
    S: PageSource,
    F: FnMut(LsTable) -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let mut summary = CommandSummary::default();

    for &table in tables {
        let source = open(table).await?;
        let rows = dump_table(&source, &dump_dir.join(table.dump_file_name()), batch_size).await?;
        summary.record(table.name(), rows as u64);
    }

    Ok(summary)
}

/// Stream one table into a dump file; returns the number of rows written
pub async fn dump_table<S: PageSource>(
    source: &S,
    path: &Path,
    batch_size: usize,
) -> Result<usize> {
    tracing::info!(
        "Dumping table '{}' to {}",
        source.table_name(),
        path.display()
    );

    let rows = write_table(read_table(source, batch_size), path).await?;

    tracing::info!("✓ Dumped {} rows from '{}'", rows, source.table_name());
    Ok(rows)
}
