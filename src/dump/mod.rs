// ABOUTME: Dump file format: one JSON array of row objects per table
// ABOUTME: Streaming writer for export and incremental reader for import

pub mod reader;
pub mod writer;

pub use reader::{read_dump_file, DumpReader};
pub use writer::{write_table, DumpFileWriter, JsonArrayWriter};
