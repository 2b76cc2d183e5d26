// ABOUTME: Catalog queries used to plan paginated reads
// ABOUTME: Discovers primary key columns so pages can be read in a stable order

use crate::error::{MigratorError, Result};
use crate::tables::quote_ident;
use tokio_postgres::Client;

/// Primary key columns of `table` in key order, empty if it has none
///
/// Looks the table up on the connection's `search_path`. The name is quoted
/// the same way the page query quotes it, so mixed-case names resolve to the
/// same relation.
pub async fn primary_key_columns(client: &Client, table: &str) -> Result<Vec<String>> {
    let relation = quote_ident(table);
    let rows = client
        .query(
            "SELECT a.attname
             FROM pg_catalog.pg_index i
             JOIN pg_catalog.pg_attribute a
               ON a.attrelid = i.indrelid
              AND a.attnum = ANY(i.indkey)
             WHERE i.indrelid = to_regclass($1::text)
               AND i.indisprimary
             ORDER BY array_position(i.indkey::int2[], a.attnum)",
            &[&relation],
        )
        .await
        .map_err(|e| MigratorError::query(table, e))?;

    let columns: Vec<String> = rows.iter().map(|row| row.get(0)).collect();

    tracing::debug!("Table '{}' primary key: {:?}", table, columns);

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres::{connect_endpoint, Endpoint};

    #[tokio::test]
    #[ignore]
    async fn test_primary_key_of_users() {
        let url = std::env::var("TEST_SOURCE_URL").unwrap();
        let client = connect_endpoint(Endpoint::Source, Some(&url)).await.unwrap();

        client
            .batch_execute(
                "CREATE TEMP TABLE pk_layout (a INT, b INT, c TEXT, PRIMARY KEY (b, a))",
            )
            .await
            .unwrap();

        let columns = primary_key_columns(&client, "pk_layout").await.unwrap();
        assert_eq!(columns, vec!["b", "a"]);
    }

    #[tokio::test]
    #[ignore]
    async fn test_mixed_case_table_resolves_to_quoted_relation() {
        let url = std::env::var("TEST_SOURCE_URL").unwrap();
        let client = connect_endpoint(Endpoint::Source, Some(&url)).await.unwrap();

        client
            .batch_execute(
                "CREATE TEMP TABLE \"CaseSensitive\" (upper_id INT PRIMARY KEY);
                 CREATE TEMP TABLE casesensitive (lower_id INT PRIMARY KEY);",
            )
            .await
            .unwrap();

        let columns = primary_key_columns(&client, "CaseSensitive").await.unwrap();
        assert_eq!(columns, vec!["upper_id"]);
    }
}
