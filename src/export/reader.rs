// ABOUTME: Chunked table reader that streams rows page by page
// ABOUTME: Snapshots the row count once, then walks LIMIT/OFFSET pages lazily

use crate::error::{MigratorError, Result};
use crate::postgres::primary_key_columns;
use crate::tables::{quote_ident, validate_table_name};
use crate::Row;
use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;
use tokio_postgres::Client;

/// A table that can be counted and read one page at a time
pub trait PageSource {
    /// Table name, for logs and errors
    fn table_name(&self) -> &str;

    /// Current number of rows in the table
    fn count_rows(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Up to `limit` rows starting at `offset`
    fn fetch_page(&self, limit: usize, offset: u64)
        -> impl Future<Output = Result<Vec<Row>>> + Send;
}

/// A PostgreSQL table read through `row_to_json`
///
/// Rows come back in PostgreSQL's own JSON rendering, so the dump carries
/// whatever the server stores without a per-type conversion layer.
pub struct PostgresTable<'a> {
    client: &'a Client,
    name: String,
    page_sql: String,
}

impl<'a> PostgresTable<'a> {
    /// Prepare paginated reads of `table`
    ///
    /// Pages are ordered by the primary key when the table has one, which
    /// keeps page boundaries stable between queries. Tables without a primary
    /// key fall back to the server's default order, where concurrent writes
    /// can shift rows across pages.
    pub async fn open(client: &'a Client, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        let order_columns = primary_key_columns(client, table).await?;
        if order_columns.is_empty() {
            tracing::warn!(
                "Table '{}' has no primary key; page order is not guaranteed",
                table
            );
        }
        let page_sql = page_query(table, &order_columns);

        Ok(Self {
            client,
            name: table.to_string(),
            page_sql,
        })
    }
}

/// SQL for one page of `table`, ordered by `order_columns` when any are given
///
/// Binds `$1` as the page size and `$2` as the offset. Callers validate the
/// table name; every identifier is quoted.
pub fn page_query(table: &str, order_columns: &[String]) -> String {
    let order_by = if order_columns.is_empty() {
        String::new()
    } else {
        let quoted: Vec<String> = order_columns.iter().map(|c| quote_ident(c)).collect();
        format!(" ORDER BY {}", quoted.join(", "))
    };

    format!(
        "SELECT row_to_json(t) FROM (SELECT * FROM {}{} LIMIT $1 OFFSET $2) AS t",
        quote_ident(table),
        order_by
    )
}

impl PageSource for PostgresTable<'_> {
    fn table_name(&self) -> &str {
        &self.name
    }

    async fn count_rows(&self) -> Result<u64> {
        let count_sql = format!("SELECT count(*) FROM {}", quote_ident(&self.name));
        let row = self
            .client
            .query_one(&count_sql, &[])
            .await
            .map_err(|e| MigratorError::query(&self.name, e))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| MigratorError::query(&self.name, e))?;

        Ok(count.max(0) as u64)
    }

    async fn fetch_page(&self, limit: usize, offset: u64) -> Result<Vec<Row>> {
        let rows = self
            .client
            .query(&self.page_sql, &[&(limit as i64), &(offset as i64)])
            .await
            .map_err(|e| MigratorError::query(&self.name, e))?;

        rows.iter()
            .map(|row| {
                let value: serde_json::Value = row
                    .try_get(0)
                    .map_err(|e| MigratorError::query(&self.name, e))?;
                match value {
                    serde_json::Value::Object(map) => Ok(map),
                    other => Err(MigratorError::query(
                        &self.name,
                        format!("row_to_json returned a non-object value: {}", other),
                    )),
                }
            })
            .collect()
    }
}

struct Cursor {
    offset: u64,
    total: Option<u64>,
}

/// Stream every row of `source` in pages of `batch_size`
///
/// The row count is taken once, before the first page, and paging stops when
/// the offset reaches it. Rows inserted after that snapshot are not read;
/// rows deleted during the read can shift later pages. Only one page is held
/// in memory at a time, and the next page is fetched only after the consumer
/// has pulled every row of the current one.
///
/// The stream is not restartable; call again to re-read from offset 0. Any
/// failed query ends the stream with that error.
pub fn read_table<S: PageSource>(
    source: &S,
    batch_size: usize,
) -> impl Stream<Item = Result<Row>> + '_ {
    let cursor = Cursor {
        offset: 0,
        total: None,
    };

    stream::try_unfold(cursor, move |mut cursor| async move {
        if batch_size == 0 {
            return Err(MigratorError::Config(
                "batch size must be greater than zero".to_string(),
            ));
        }

        let total = match cursor.total {
            Some(total) => total,
            None => {
                let total = source.count_rows().await?;
                tracing::debug!("Table '{}' has {} rows", source.table_name(), total);
                cursor.total = Some(total);
                total
            }
        };

        if cursor.offset >= total {
            return Ok(None);
        }

        let page = source.fetch_page(batch_size, cursor.offset).await?;
        tracing::debug!(
            "Fetched {} rows from '{}' at offset {}",
            page.len(),
            source.table_name(),
            cursor.offset
        );
        cursor.offset += batch_size as u64;

        Ok(Some((page, cursor)))
    })
    .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
    .try_flatten()
}
