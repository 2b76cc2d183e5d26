// ABOUTME: Command implementations for the migrator CLI
// ABOUTME: Exports dump-ls-db and import handlers and their run summaries

pub mod dump;
pub mod import;

pub use dump::dump_ls_db;
pub use import::import;

/// Outcome of one table within a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    pub table: String,
    pub rows: u64,
}

/// Tables completed by a command, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSummary {
    pub tables: Vec<TableOutcome>,
}

impl CommandSummary {
    pub fn record(&mut self, table: impl Into<String>, rows: u64) {
        self.tables.push(TableOutcome {
            table: table.into(),
            rows,
        });
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}
