// ABOUTME: Table catalogs for the LibertySoil source and FreeFeed destination schemas
// ABOUTME: Canonical table order, name parsing, and SQL identifier validation

use crate::error::{MigratorError, Result};
use std::fmt;
use std::str::FromStr;

/// LibertySoil tables exported by `dump-ls-db`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LsTable {
    Users,
    Posts,
    Comments,
    Followers,
    Likes,
}

impl LsTable {
    /// Export order. Referenced tables come before the tables pointing at them.
    pub const ALL: [LsTable; 5] = [
        LsTable::Users,
        LsTable::Posts,
        LsTable::Comments,
        LsTable::Followers,
        LsTable::Likes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LsTable::Users => "users",
            LsTable::Posts => "posts",
            LsTable::Comments => "comments",
            LsTable::Followers => "followers",
            LsTable::Likes => "likes",
        }
    }

    /// File name of this table's dump inside the dump directory
    pub fn dump_file_name(self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for LsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// FreeFeed tables populated by `import`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfTable {
    Users,
    Posts,
    Comments,
    Subscriptions,
    Likes,
}

impl FfTable {
    /// Import order used when the caller names no tables
    pub const ALL: [FfTable; 5] = [
        FfTable::Users,
        FfTable::Posts,
        FfTable::Comments,
        FfTable::Subscriptions,
        FfTable::Likes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FfTable::Users => "users",
            FfTable::Posts => "posts",
            FfTable::Comments => "comments",
            FfTable::Subscriptions => "subscriptions",
            FfTable::Likes => "likes",
        }
    }

    /// The LibertySoil dump this table is built from
    pub fn source_table(self) -> LsTable {
        match self {
            FfTable::Users => LsTable::Users,
            FfTable::Posts => LsTable::Posts,
            FfTable::Comments => LsTable::Comments,
            FfTable::Subscriptions => LsTable::Followers,
            FfTable::Likes => LsTable::Likes,
        }
    }
}

impl fmt::Display for FfTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FfTable {
    type Err = MigratorError;

    fn from_str(s: &str) -> Result<Self> {
        FfTable::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| MigratorError::UnknownTable(s.to_string()))
    }
}

/// Resolve the tables an `import` run should process.
///
/// An empty list means every FreeFeed table in canonical order; otherwise the
/// caller's order is kept. Every name is checked before anything is returned,
/// so a bad name never lets earlier tables start.
pub fn resolve_import_tables<S: AsRef<str>>(names: &[S]) -> Result<Vec<FfTable>> {
    if names.is_empty() {
        return Ok(FfTable::ALL.to_vec());
    }

    names.iter().map(|name| name.as_ref().parse()).collect()
}

/// Validate a table name before it is interpolated into SQL
///
/// Accepts ASCII letters, digits and underscores, starting with a letter or
/// underscore, up to PostgreSQL's 63-byte identifier limit.
///
/// # Examples
///
/// ```
/// # use ls_ff_migrator::tables::validate_table_name;
/// assert!(validate_table_name("users").is_ok());
/// assert!(validate_table_name("users; DROP TABLE users;").is_err());
/// ```
pub fn validate_table_name(table_name: &str) -> Result<()> {
    let invalid = |reason: String| MigratorError::InvalidIdentifier {
        name: table_name.chars().filter(|c| !c.is_control()).take(100).collect(),
        reason,
    };

    if table_name.is_empty() {
        return Err(invalid("table name cannot be empty".to_string()));
    }

    if table_name.len() > 63 {
        return Err(invalid(format!(
            "longer than 63 characters ({})",
            table_name.len()
        )));
    }

    let mut chars = table_name.chars();
    if let Some(first) = chars.next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(invalid(format!(
                "must start with a letter or underscore, not '{}'",
                first
            )));
        }
    }

    if let Some(bad) = table_name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
    {
        return Err(invalid(format!(
            "contains invalid character '{}'",
            bad.escape_default()
        )));
    }

    Ok(())
}

/// Double-quote an identifier for use in SQL
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
