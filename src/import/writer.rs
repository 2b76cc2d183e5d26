// ABOUTME: Writes translated rows into FreeFeed tables
// ABOUTME: Parameterized JSON inserts that skip rows already present

use crate::error::{MigratorError, Result};
use crate::tables::{quote_ident, validate_table_name, FfTable};
use crate::Row;
use tokio_postgres::GenericClient;

/// Resolves the followed user's `Posts` feed and inserts the subscription in
/// one round trip. Returns how many feeds matched and how many rows were
/// inserted, so a missing feed is told apart from an existing subscription.
const SUBSCRIPTION_SQL: &str = "\
WITH r AS (
    SELECT * FROM json_to_record($1::json)
        AS r(user_id uuid, feed_owner_id uuid, created_at timestamptz)
), posts_feed AS (
    SELECT fd.\"uid\" FROM \"feeds\" fd
    JOIN r ON fd.\"user_id\" = r.feed_owner_id AND fd.\"name\" = 'Posts'
), inserted AS (
    INSERT INTO \"subscriptions\" (\"feed_id\", \"user_id\", \"created_at\")
    SELECT posts_feed.\"uid\", r.user_id, COALESCE(r.created_at, now())
    FROM posts_feed, r
    ON CONFLICT DO NOTHING
    RETURNING 1
)
SELECT (SELECT count(*) FROM posts_feed), (SELECT count(*) FROM inserted)";

/// Gives an imported user the `Posts` feed subscriptions point at, unless
/// one already exists.
pub const POSTS_FEED_SQL: &str = "\
INSERT INTO \"feeds\" (\"user_id\", \"name\")
SELECT r.uid, 'Posts' FROM json_to_record($1::json) AS r(uid uuid)
WHERE NOT EXISTS (
    SELECT 1 FROM \"feeds\" fd WHERE fd.\"user_id\" = r.uid AND fd.\"name\" = 'Posts'
)";

/// Build the INSERT for one translated row
///
/// The row travels as a single `$1::json` parameter. Generic tables expand it
/// with `json_populate_record`, so PostgreSQL casts each value to the
/// destination column type. Subscriptions join against `feeds` to turn the
/// followed user into that user's `Posts` feed. Conflicts are skipped, which
/// makes a repeated import a no-op for rows already copied.
///
/// `index` is the row's position in the dump and only feeds error messages.
pub fn insert_statement(table: FfTable, row: &Row, index: usize) -> Result<String> {
    if table == FfTable::Subscriptions {
        return Ok(SUBSCRIPTION_SQL.to_string());
    }

    let mut columns = Vec::with_capacity(row.len());
    for column in row.keys() {
        validate_table_name(column)?;
        columns.push(quote_ident(column));
    }
    if columns.is_empty() {
        return Err(MigratorError::Translate {
            table: table.name().to_string(),
            index,
            reason: "translated row has no columns".to_string(),
        });
    }

    let column_list = columns.join(", ");
    let target = quote_ident(table.name());
    Ok(format!(
        "INSERT INTO {target} ({column_list}) \
         SELECT {column_list} FROM json_populate_record(NULL::{target}, $1::json) \
         ON CONFLICT DO NOTHING"
    ))
}

/// Insert one translated row; returns how many rows were written (0 or 1)
///
/// Users also get their `Posts` feed. A subscription whose followed user has
/// no `Posts` feed is a [`MigratorError::Translate`] error rather than a skip.
pub async fn insert_row<C: GenericClient>(
    client: &C,
    table: FfTable,
    row: Row,
    index: usize,
) -> Result<u64> {
    let sql = insert_statement(table, &row, index)?;
    let feed_owner = row.get("feed_owner_id").cloned();
    let value = serde_json::Value::Object(row);
    let query_error = |e: tokio_postgres::Error| MigratorError::query(table.name(), e);

    match table {
        FfTable::Subscriptions => {
            let counts = client
                .query_one(sql.as_str(), &[&value])
                .await
                .map_err(query_error)?;
            let feeds: i64 = counts.try_get(0).map_err(query_error)?;
            let inserted: i64 = counts.try_get(1).map_err(query_error)?;

            if feeds == 0 {
                return Err(MigratorError::Translate {
                    table: table.name().to_string(),
                    index,
                    reason: format!(
                        "followed user {} has no 'Posts' feed; import users first",
                        feed_owner.unwrap_or(serde_json::Value::Null)
                    ),
                });
            }
            Ok(inserted.max(0) as u64)
        }
        FfTable::Users => {
            let inserted = client
                .execute(sql.as_str(), &[&value])
                .await
                .map_err(query_error)?;
            client
                .execute(POSTS_FEED_SQL, &[&value])
                .await
                .map_err(query_error)?;
            Ok(inserted)
        }
        _ => client
            .execute(sql.as_str(), &[&value])
            .await
            .map_err(query_error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_generic_insert_lists_translated_columns() {
        let sql = insert_statement(
            FfTable::Comments,
            &row(json!({"uid": "c1", "post_id": "p1", "user_id": "u1", "body": "hi"})),
            0,
        )
        .unwrap();

        assert!(sql.starts_with("INSERT INTO \"comments\" ("));
        assert!(sql.contains("json_populate_record(NULL::\"comments\", $1::json)"));
        for column in ["\"uid\"", "\"post_id\"", "\"user_id\"", "\"body\""] {
            assert_eq!(sql.matches(column).count(), 2, "{} listed twice", column);
        }
        assert!(sql.ends_with("ON CONFLICT DO NOTHING"));
    }

    #[test]
    fn test_subscription_insert_reports_matched_feeds() {
        let sql = insert_statement(
            FfTable::Subscriptions,
            &row(json!({"user_id": "u1", "feed_owner_id": "u2"})),
            0,
        )
        .unwrap();

        assert!(sql.contains("fd.\"user_id\" = r.feed_owner_id AND fd.\"name\" = 'Posts'"));
        assert!(sql.contains("COALESCE(r.created_at, now())"));
        // feed count and insert count are returned separately
        assert!(sql.ends_with(
            "SELECT (SELECT count(*) FROM posts_feed), (SELECT count(*) FROM inserted)"
        ));
    }

    #[test]
    fn test_posts_feed_created_once_per_user() {
        assert!(POSTS_FEED_SQL.starts_with("INSERT INTO \"feeds\" (\"user_id\", \"name\")"));
        assert!(POSTS_FEED_SQL.contains("json_to_record($1::json) AS r(uid uuid)"));
        assert!(POSTS_FEED_SQL.contains("WHERE NOT EXISTS"));
    }

    #[test]
    fn test_empty_row_error_carries_row_index() {
        let result = insert_statement(FfTable::Posts, &Row::new(), 41);
        match result {
            Err(MigratorError::Translate { table, index, .. }) => {
                assert_eq!(table, "posts");
                assert_eq!(index, 41);
            }
            other => panic!("expected Translate error, got {:?}", other),
        }
    }

    #[test]
    fn test_unsafe_column_name_rejected() {
        let result = insert_statement(
            FfTable::Likes,
            &row(json!({"user_id\"; DROP TABLE likes; --": 1})),
            0,
        );
        assert!(matches!(
            result,
            Err(MigratorError::InvalidIdentifier { .. })
        ));
    }
}
