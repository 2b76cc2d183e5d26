// ABOUTME: Error taxonomy for dump and import pipelines
// ABOUTME: Structured errors for connection, query, file, parse and mapping failures

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the library layers.
///
/// Commands wrap these with `anyhow` context; the original variant stays
/// reachable through `anyhow::Error::downcast_ref`.
#[derive(Error, Debug)]
pub enum MigratorError {
    /// Authentication or network setup failed
    #[error("Connection to {endpoint} database failed: {reason}")]
    Connection { endpoint: String, reason: String },

    /// Count or page query failed
    #[error("Query on table '{table}' failed: {source}")]
    Query {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Reading or writing a dump file failed
    #[error("I/O error on dump file {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Caller named a table outside the recognized set
    #[error("Unknown table: '{0}'")]
    UnknownTable(String),

    /// Malformed JSON in a dump file
    #[error("Malformed dump file {} at element {index}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        index: usize,
        reason: String,
    },

    /// A dump row cannot be mapped to the destination schema
    #[error("Cannot translate row {index} of '{table}': {reason}")]
    Translate {
        table: String,
        index: usize,
        reason: String,
    },

    /// Table name is not a safe SQL identifier
    #[error("Invalid table name '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// Configuration file or option is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MigratorError>;

impl MigratorError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    pub fn query(
        table: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Query {
            table: table.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_table_message_names_table() {
        let err = MigratorError::UnknownTable("not_a_real_table".to_string());
        assert_eq!(err.to_string(), "Unknown table: 'not_a_real_table'");
    }

    #[test]
    fn test_file_io_message_includes_path() {
        let err = MigratorError::file_io(
            "/tmp/dumps/users.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/dumps/users.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_downcast_through_anyhow_context() {
        let err = anyhow::Error::new(MigratorError::UnknownTable("x".to_string()))
            .context("Import aborted");
        assert!(matches!(
            err.downcast_ref::<MigratorError>(),
            Some(MigratorError::UnknownTable(_))
        ));
    }
}
