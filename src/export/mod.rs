// ABOUTME: Export side of the pipeline
// ABOUTME: Paginated table reads from the LibertySoil database

pub mod reader;

pub use reader::{page_query, read_table, PageSource, PostgresTable};
