// ABOUTME: Streaming JSON array writer for table dump files
// ABOUTME: Appends rows one at a time and atomically publishes the finished file

use crate::error::{MigratorError, Result};
use crate::Row;
use futures::{pin_mut, Stream, TryStreamExt};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes a JSON array element by element
///
/// Layout is `[`, one compact object per line separated by `,`, then `]` and
/// a trailing newline. An empty array is written as `[]`.
pub struct JsonArrayWriter<W: Write> {
    inner: W,
    count: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(mut inner: W) -> io::Result<Self> {
        inner.write_all(b"[")?;
        Ok(Self { inner, count: 0 })
    }

    pub fn write_row(&mut self, row: &Row) -> io::Result<()> {
        let separator: &[u8] = if self.count == 0 { b"\n" } else { b",\n" };
        self.inner.write_all(separator)?;
        serde_json::to_writer(&mut self.inner, row)?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Close the array and flush; returns the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        let closing: &[u8] = if self.count == 0 { b"]\n" } else { b"\n]\n" };
        self.inner.write_all(closing)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// A dump file being written
///
/// Rows go to a temporary file next to the destination. [`finish`] syncs it
/// and renames it over `<table>.json`; dropping the writer early discards the
/// temporary file and leaves any previous dump untouched.
///
/// [`finish`]: DumpFileWriter::finish
pub struct DumpFileWriter {
    path: PathBuf,
    writer: JsonArrayWriter<BufWriter<NamedTempFile>>,
}

impl DumpFileWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let tmp = NamedTempFile::new_in(&parent).map_err(|e| MigratorError::file_io(&path, e))?;
        let writer = JsonArrayWriter::new(BufWriter::new(tmp))
            .map_err(|e| MigratorError::file_io(&path, e))?;

        Ok(Self { path, writer })
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        self.writer
            .write_row(row)
            .map_err(|e| MigratorError::file_io(&self.path, e))
    }

    /// Flush, fsync and publish the file; returns the number of rows written
    pub fn finish(self) -> Result<usize> {
        let Self { path, writer } = self;
        let count = writer.count();

        let buffered = writer
            .finish()
            .map_err(|e| MigratorError::file_io(&path, e))?;
        let tmp = buffered
            .into_inner()
            .map_err(|e| MigratorError::file_io(&path, e.into_error()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| MigratorError::file_io(&path, e))?;
        tmp.persist(&path)
            .map_err(|e| MigratorError::file_io(&path, e.error))?;

        Ok(count)
    }
}

/// Drain `rows` into a JSON array at `path`
///
/// Resolves only after the file is fully written, synced and in place. The
/// first failing row, whether from the stream or from the disk, aborts the
/// write and is returned.
pub async fn write_table<S>(rows: S, path: &Path) -> Result<usize>
where
    S: Stream<Item = Result<Row>>,
{
    pin_mut!(rows);

    let mut writer = DumpFileWriter::create(path)?;
    while let Some(row) = rows.try_next().await? {
        writer.write_row(&row)?;
    }

    writer.finish()
}
