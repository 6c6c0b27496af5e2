//! Read-only query gateway: classification, row limiting, execution.
//!
//! The classifier and the row-limit rewriter are deliberately textual
//! heuristics, not a SQL parser. The classifier trades precision for safety:
//! a column named `inserted_at` trips the `INSERT` check and gets rejected,
//! but no statement containing a denylisted keyword ever slips through. The
//! rewriter assumes the last `SELECT` of a CTE is the outer query, which can
//! misfire on nested subqueries. Both behaviors are documented and asserted
//! by the tests below; treat them as defense-in-depth behind database-level
//! permissions, not as a substitute for them.

use lazy_regex::{Lazy, Regex, regex};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::error::{ExplorerError, Result};
use crate::executor::Executor;
use crate::models::QueryExecutionResult;

/// Tokens that mark a statement as a write or procedural operation.
/// Matched as substrings of the uppercased query text.
const WRITE_OPERATIONS: [&str; 11] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "EXEC", "EXECUTE",
    "SP_", "XP_",
];

static SELECT_KEYWORD: &Lazy<Regex> = regex!(r"(?i)SELECT");

/// Outcome of the read-only check. Recomputed on every call; carries no
/// state beyond the rejection reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryClassification {
    ReadOnly,
    Forbidden(String),
}

/// Classify a raw query as read-only or forbidden.
pub fn classify(query: &str) -> QueryClassification {
    let normalized = query.trim().to_uppercase();

    for op in WRITE_OPERATIONS {
        if normalized.contains(op) {
            return QueryClassification::Forbidden(format!(
                "query contains forbidden keyword {op}"
            ));
        }
    }

    if normalized.starts_with("SELECT") || normalized.starts_with("WITH") {
        QueryClassification::ReadOnly
    } else {
        QueryClassification::Forbidden(
            "only SELECT queries (including CTEs) are allowed".to_string(),
        )
    }
}

/// Cap the result cardinality of a query by injecting a `TOP` clause,
/// leaving the query untouched when it already carries one.
///
/// Plain `SELECT` queries get the limit after the first `SELECT` keyword;
/// CTE queries (`WITH ...`) get it at the last `SELECT`, on the assumption
/// that the final one is the outer query. Only the anchored occurrence is
/// rewritten. Any other statement shape passes through unmodified — the
/// classifier upstream is then the only defense.
pub fn bound_rows(query: &str, max_rows: u32) -> String {
    let normalized = query.trim().to_uppercase();

    if normalized.contains("TOP ") {
        return query.to_string();
    }

    let limit = format!("SELECT TOP {max_rows}");

    if normalized.starts_with("SELECT") {
        return SELECT_KEYWORD.replace(query, limit.as_str()).into_owned();
    }

    if normalized.starts_with("WITH")
        && let Some(last) = SELECT_KEYWORD.find_iter(query).last()
    {
        let mut bounded = String::with_capacity(query.len() + limit.len());
        bounded.push_str(&query[..last.start()]);
        bounded.push_str(&limit);
        bounded.push_str(&query[last.end()..]);
        return bounded;
    }

    query.to_string()
}

/// Orchestrates policy, rewriting, execution, and timing for ad-hoc
/// queries.
pub struct QueryGateway {
    executor: Arc<dyn Executor>,
    config: Arc<ServerConfig>,
}

impl QueryGateway {
    pub fn new(executor: Arc<dyn Executor>, config: Arc<ServerConfig>) -> Self {
        Self { executor, config }
    }

    /// Execute a query under the read-only policy against `database`.
    ///
    /// With write operations disabled (the default), anything the classifier
    /// rejects fails with [`ExplorerError::PolicyViolation`] before reaching
    /// the server. The row limit is applied in both modes. Column names come
    /// back exactly as the server reported them, duplicates included.
    pub async fn execute_read_only(
        &self,
        database: &str,
        query: &str,
    ) -> Result<QueryExecutionResult> {
        if !self.config.enable_write_operations
            && let QueryClassification::Forbidden(reason) = classify(query)
        {
            return Err(ExplorerError::PolicyViolation(reason));
        }

        let started = Instant::now();
        let limited = bound_rows(query, self.config.max_result_rows);

        let (columns, rows) = self
            .executor
            .query_with_columns(Some(database), &limited, &[])
            .await?;

        Ok(QueryExecutionResult {
            row_count: rows.len(),
            columns,
            rows,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_read_only(query: &str) {
        assert_eq!(
            classify(query),
            QueryClassification::ReadOnly,
            "expected read-only: {query}"
        );
    }

    fn assert_forbidden(query: &str) {
        assert!(
            matches!(classify(query), QueryClassification::Forbidden(_)),
            "expected forbidden: {query}"
        );
    }

    #[test]
    fn accepts_select_and_cte_queries() {
        assert_read_only("SELECT * FROM T");
        assert_read_only("  select id from t");
        assert_read_only("WITH c AS (SELECT 1 AS n) SELECT n FROM c");
    }

    #[test]
    fn rejects_write_statements() {
        assert_forbidden("DROP TABLE T");
        assert_forbidden("INSERT INTO T VALUES (1)");
        assert_forbidden("update t set x = 1");
        assert_forbidden("TRUNCATE TABLE T");
        assert_forbidden("EXEC sp_help");
    }

    #[test]
    fn rejects_denylisted_keywords_anywhere_in_the_text() {
        // Intentional false positive: DELETE appears inside an identifier.
        assert_forbidden("SELECT * FROM deleted_items");
        // Even inside a string literal.
        assert_forbidden("SELECT 'DROP' AS word");
        assert_forbidden("SELECT * FROM t WHERE name = 'sp_who'");
    }

    #[test]
    fn rejects_non_select_starting_tokens() {
        assert_forbidden("GRANT SELECT ON t TO public");
        assert_forbidden("USE master");
    }

    #[test]
    fn injects_top_after_first_select() {
        assert_eq!(
            bound_rows("SELECT * FROM T", 500),
            "SELECT TOP 500 * FROM T"
        );
        assert_eq!(
            bound_rows("select id from t", 10),
            "SELECT TOP 10 id from t"
        );
    }

    #[test]
    fn leaves_existing_top_clause_alone() {
        assert_eq!(
            bound_rows("SELECT TOP 10 * FROM T", 500),
            "SELECT TOP 10 * FROM T"
        );
        assert_eq!(
            bound_rows("select top 10 * from t", 500),
            "select top 10 * from t"
        );
    }

    #[test]
    fn cte_limit_lands_on_the_last_select_only() {
        let bounded = bound_rows("WITH c AS (SELECT 1 AS n) SELECT * FROM c", 10);
        assert_eq!(bounded, "WITH c AS (SELECT 1 AS n) SELECT TOP 10 * FROM c");
    }

    #[test]
    fn subquery_selects_keep_their_shape() {
        // Only the first SELECT is rewritten; the inner one is untouched.
        let bounded = bound_rows("SELECT * FROM (SELECT id FROM t) AS s", 25);
        assert_eq!(bounded, "SELECT TOP 25 * FROM (SELECT id FROM t) AS s");
    }

    #[test]
    fn non_select_shapes_pass_through_unmodified() {
        assert_eq!(bound_rows("VALUES (1)", 10), "VALUES (1)");
    }
}
