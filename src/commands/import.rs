// ABOUTME: import command - load FreeFeed tables from LibertySoil dump files
// ABOUTME: Validates the table list up front, then imports each table in its own transaction

use crate::commands::CommandSummary;
use crate::config::MigratorConfig;
use crate::error::MigratorError;
use crate::import::import_table;
use crate::postgres::{connect_endpoint, Endpoint};
use crate::tables::{resolve_import_tables, FfTable};
use anyhow::Context;
use std::path::PathBuf;

/// Import the named FreeFeed tables (all of them when `tables` is empty)
///
/// Every name is resolved and every dump file is checked before the
/// destination connection is opened, so an unknown table or a missing dump
/// aborts the command without touching FreeFeed. Tables are then imported in
/// the resolved order, each inside its own transaction; the first failure
/// stops the run and earlier tables stay committed.
pub async fn import<S: AsRef<str>>(
    config: &MigratorConfig,
    tables: &[S],
) -> anyhow::Result<CommandSummary> {
    let plan = plan_import(config, tables)?;

    tracing::info!(
        "Importing {} table(s) into FreeFeed: {}",
        plan.len(),
        plan.iter()
            .map(|(table, _)| table.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut client = connect_endpoint(Endpoint::Destination, config.ff_conn.as_deref())
        .await
        .context("Failed to connect to FreeFeed database")?;

    let mut summary = CommandSummary::default();
    for (table, dump_path) in &plan {
        let transaction = client
            .transaction()
            .await
            .map_err(|e| MigratorError::query(table.name(), e))
            .with_context(|| format!("Failed to start transaction for '{}'", table))?;

        let stats = import_table(&transaction, *table, dump_path)
            .await
            .with_context(|| format!("Import of '{}' failed", table))?;

        transaction
            .commit()
            .await
            .map_err(|e| MigratorError::query(table.name(), e))
            .with_context(|| format!("Failed to commit import of '{}'", table))?;

        summary.record(table.name(), stats.rows_inserted);
    }

    tracing::info!(
        "✓ Imported {} table(s) ({} rows inserted)",
        summary.tables.len(),
        summary.total_rows()
    );

    Ok(summary)
}

/// Resolve table names and locate their dump files without any database I/O
pub fn plan_import<S: AsRef<str>>(
    config: &MigratorConfig,
    tables: &[S],
) -> anyhow::Result<Vec<(FfTable, PathBuf)>> {
    let resolved = resolve_import_tables(tables).context("Import aborted")?;

    let mut plan = Vec::with_capacity(resolved.len());
    for table in resolved {
        let dump_path = config.dump_path(&table.source_table().dump_file_name());
        if !dump_path.is_file() {
            let missing = MigratorError::file_io(
                &dump_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "dump file not found"),
            );
            return Err(anyhow::Error::new(missing).context(format!("Cannot import '{}'", table)));
        }
        plan.push((table, dump_path));
    }

    Ok(plan)
}
