// ABOUTME: Incremental JSON array reader for table dump files
// ABOUTME: Yields one row object at a time without loading the whole file

use crate::error::{MigratorError, Result};
use crate::Row;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the opening bracket
    Start,
    /// After `[`: an element or `]`
    First,
    /// After an element: `,` or `]`
    Separator,
    /// After `,`: an element is required
    Element,
    Done,
}

/// Iterator over the rows of a dump file
///
/// Only the element being parsed is held in memory. Elements must be JSON
/// objects. After the first error the iterator is exhausted.
pub struct DumpReader<R> {
    reader: R,
    path: PathBuf,
    state: State,
    index: usize,
}

/// Open `path` for incremental reading
pub fn read_dump_file(path: &Path) -> Result<DumpReader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| MigratorError::file_io(path, e))?;
    Ok(DumpReader::new(BufReader::new(file), path))
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            state: State::Start,
            index: 0,
        }
    }

    fn parse_error(&self, reason: impl Into<String>) -> MigratorError {
        MigratorError::Parse {
            path: self.path.clone(),
            index: self.index,
            reason: reason.into(),
        }
    }

    /// Skip JSON whitespace and return the next byte without consuming it
    fn peek(&mut self) -> Result<Option<u8>> {
        loop {
            let (skipped, next) = {
                let buf = self
                    .reader
                    .fill_buf()
                    .map_err(|e| MigratorError::file_io(&self.path, e))?;
                if buf.is_empty() {
                    return Ok(None);
                }
                let skipped = buf
                    .iter()
                    .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                    .count();
                (skipped, buf.get(skipped).copied())
            };
            self.reader.consume(skipped);
            if next.is_some() {
                return Ok(next);
            }
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        self.reader.consume(1);
        match self.peek()? {
            None => Ok(()),
            Some(b) => Err(self.parse_error(format!(
                "unexpected trailing data '{}' after closing bracket",
                b.escape_ascii()
            ))),
        }
    }

    fn parse_element(&mut self) -> Result<Row> {
        match self.peek()? {
            Some(b'{') => {}
            Some(b) => {
                return Err(self.parse_error(format!(
                    "expected a JSON object, found '{}'",
                    b.escape_ascii()
                )))
            }
            None => return Err(self.parse_error("unexpected end of file")),
        }

        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        match Row::deserialize(&mut de) {
            Ok(row) => {
                self.index += 1;
                Ok(row)
            }
            Err(e) if e.is_io() => Err(MigratorError::file_io(&self.path, e.into())),
            Err(e) => Err(self.parse_error(e.to_string())),
        }
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            match self.state {
                State::Done => return Ok(None),
                State::Start => match self.peek()? {
                    Some(b'[') => {
                        self.reader.consume(1);
                        self.state = State::First;
                    }
                    Some(b) => {
                        return Err(self.parse_error(format!(
                            "expected '[' at start of dump, found '{}'",
                            b.escape_ascii()
                        )))
                    }
                    None => return Err(self.parse_error("dump file is empty")),
                },
                State::First => {
                    if self.peek()? == Some(b']') {
                        self.expect_end()?;
                        self.state = State::Done;
                        return Ok(None);
                    }
                    let row = self.parse_element()?;
                    self.state = State::Separator;
                    return Ok(Some(row));
                }
                State::Separator => match self.peek()? {
                    Some(b',') => {
                        self.reader.consume(1);
                        self.state = State::Element;
                    }
                    Some(b']') => {
                        self.expect_end()?;
                        self.state = State::Done;
                        return Ok(None);
                    }
                    Some(b) => {
                        return Err(self.parse_error(format!(
                            "expected ',' or ']' between elements, found '{}'",
                            b.escape_ascii()
                        )))
                    }
                    None => return Err(self.parse_error("unexpected end of file inside array")),
                },
                State::Element => {
                    if self.peek()? == Some(b']') {
                        return Err(self.parse_error("trailing comma before ']'"));
                    }
                    let row = self.parse_element()?;
                    self.state = State::Separator;
                    return Ok(Some(row));
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}
