// Integration tests for tool dispatch, the query gateway, and cache
// behavior, driven through a recording stub executor. No database needed.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mssql_explorer::{
    Executor, ExplorerError, ExplorerServer, JsonRow, SchemaCache, ServerConfig, ToolFailure,
};

type Responder =
    Box<dyn Fn(&str) -> Result<(Vec<String>, Vec<JsonRow>), ExplorerError> + Send + Sync>;

/// Records every call and answers from a configurable responder.
struct StubExecutor {
    calls: Mutex<Vec<(Option<String>, String)>>,
    responder: Responder,
}

impl StubExecutor {
    fn new(responder: Responder) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder,
        })
    }

    /// Stub that answers every query with an empty result set.
    fn empty() -> Arc<Self> {
        Self::new(Box::new(|_| Ok((Vec::new(), Vec::new()))))
    }

    fn calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Executor for StubExecutor {
    async fn query_with_columns(
        &self,
        database: Option<&str>,
        sql: &str,
        _params: &[&str],
    ) -> Result<(Vec<String>, Vec<JsonRow>), ExplorerError> {
        self.calls
            .lock()
            .unwrap()
            .push((database.map(str::to_string), sql.to_string()));
        (self.responder)(sql)
    }
}

fn row(value: Value) -> JsonRow {
    value.as_object().expect("row literal must be an object").clone()
}

fn table_rows() -> Vec<JsonRow> {
    vec![
        row(json!({
            "tableName": "Orders",
            "schemaName": "dbo",
            "rowCount": 42,
            "tableType": "USER_TABLE"
        })),
        row(json!({
            "tableName": "Customers",
            "schemaName": "dbo",
            "rowCount": null,
            "tableType": "USER_TABLE"
        })),
    ]
}

fn server_with(
    config: ServerConfig,
    cache: &Arc<SchemaCache>,
    executor: &Arc<StubExecutor>,
) -> ExplorerServer {
    let executor: Arc<dyn Executor> = executor.clone();
    ExplorerServer::new(Arc::new(config), Arc::clone(cache), executor)
}

fn fresh_cache() -> Arc<SchemaCache> {
    Arc::new(SchemaCache::new(Duration::from_secs(60), true))
}

#[tokio::test]
async fn allow_list_rejects_before_any_executor_call() {
    let executor = StubExecutor::empty();
    let cache = fresh_cache();
    let config = ServerConfig {
        allowed_databases: Some(vec!["Sales".to_string()]),
        ..ServerConfig::default()
    };
    let server = server_with(config, &cache, &executor);

    let result = server
        .handle_tool("list_tables", json!({"database": "Payroll"}))
        .await;

    assert!(
        matches!(
            result,
            Err(ToolFailure::Operation(ExplorerError::AccessDenied { .. }))
        ),
        "expected AccessDenied, got {result:?}"
    );
    assert_eq!(
        executor.call_count(),
        0,
        "a denied database must never reach the executor"
    );
}

#[tokio::test]
async fn write_query_is_rejected_without_touching_the_executor() {
    let executor = StubExecutor::empty();
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    let result = server
        .handle_tool(
            "execute_query",
            json!({"database": "Sales", "query": "DROP TABLE Orders"}),
        )
        .await;

    assert!(matches!(
        result,
        Err(ToolFailure::Operation(ExplorerError::PolicyViolation(_)))
    ));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn execute_query_injects_row_limit_and_assembles_result() {
    let executor = StubExecutor::new(Box::new(|_| {
        Ok((
            vec!["id".to_string(), "id".to_string()],
            vec![row(json!({"id": 1})), row(json!({"id": 2}))],
        ))
    }));
    let cache = fresh_cache();
    let config = ServerConfig {
        max_result_rows: 500,
        ..ServerConfig::default()
    };
    let server = server_with(config, &cache, &executor);

    let text = server
        .handle_tool(
            "execute_query",
            json!({"database": "Sales", "query": "SELECT * FROM Orders"}),
        )
        .await
        .expect("query should succeed");

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_deref(), Some("Sales"));
    assert_eq!(calls[0].1, "SELECT TOP 500 * FROM Orders");

    let payload: Value = serde_json::from_str(&text).expect("payload should be JSON");
    assert_eq!(payload["rowCount"], json!(2));
    // Duplicate column names pass through verbatim.
    assert_eq!(payload["columns"], json!(["id", "id"]));
    assert!(payload["executionTimeMs"].is_u64());
}

#[tokio::test]
async fn repeated_list_tables_hits_the_cache() {
    let executor = StubExecutor::new(Box::new(|_| {
        Ok((Vec::new(), table_rows()))
    }));
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    let first = server
        .handle_tool("list_tables", json!({"database": "Sales"}))
        .await
        .expect("first call should succeed");
    let second = server
        .handle_tool("list_tables", json!({"database": "Sales"}))
        .await
        .expect("second call should succeed");

    assert_eq!(first, second);
    assert_eq!(
        executor.call_count(),
        1,
        "the second call must be served from the cache"
    );

    // A different database is a different key.
    server
        .handle_tool("list_tables", json!({"database": "Inventory"}))
        .await
        .expect("third call should succeed");
    assert_eq!(executor.call_count(), 2);
}

#[tokio::test]
async fn describe_table_key_is_stable_across_schema_qualification() {
    let executor = StubExecutor::new(Box::new(|sql| {
        let rows = if sql.contains("sys.columns") {
            vec![row(json!({
                "columnName": "id",
                "dataType": "int",
                "maxLength": 4,
                "isNullable": false,
                "isPrimaryKey": true,
                "isForeignKey": false,
                "defaultValue": null
            }))]
        } else {
            Vec::new()
        };
        Ok((Vec::new(), rows))
    }));
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    server
        .handle_tool(
            "describe_table",
            json!({"database": "Sales", "tableName": "Orders"}),
        )
        .await
        .expect("bare name should succeed");
    let after_first = executor.call_count();
    assert_eq!(after_first, 3, "columns + foreign keys + indexes");

    // Same table, schema-qualified this time: must be a cache hit.
    server
        .handle_tool(
            "describe_table",
            json!({"database": "Sales", "tableName": "dbo.Orders"}),
        )
        .await
        .expect("qualified name should succeed");
    assert_eq!(executor.call_count(), after_first);
}

#[tokio::test]
async fn failed_describe_table_caches_nothing() {
    let executor = StubExecutor::new(Box::new(|sql| {
        if sql.contains("sys.foreign_keys") {
            Err(ExplorerError::Execution("connection reset".to_string()))
        } else {
            Ok((Vec::new(), Vec::new()))
        }
    }));
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    let result = server
        .handle_tool(
            "describe_table",
            json!({"database": "Sales", "tableName": "Orders"}),
        )
        .await;

    assert!(matches!(
        result,
        Err(ToolFailure::Operation(ExplorerError::Execution(_)))
    ));
    assert_eq!(
        cache.stats().size,
        0,
        "no partial result may be cached when a sub-query fails"
    );

    // The next attempt goes back to the executor rather than a stale entry.
    let before_retry = executor.call_count();
    let _ = server
        .handle_tool(
            "describe_table",
            json!({"database": "Sales", "tableName": "Orders"}),
        )
        .await;
    assert!(executor.call_count() > before_retry);
}

#[tokio::test]
async fn missing_procedure_definition_is_an_empty_string() {
    let executor = StubExecutor::new(Box::new(|_| {
        Ok((
            vec!["definition".to_string()],
            vec![row(json!({"definition": null}))],
        ))
    }));
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    let text = server
        .handle_tool(
            "get_procedure_definition",
            json!({"database": "Sales", "procedureName": "usp_missing"}),
        )
        .await
        .expect("lookup should succeed");

    assert_eq!(text, "", "absent definitions surface as an empty string");
}

#[tokio::test]
async fn unknown_tool_is_a_protocol_error_not_a_tool_error() {
    let executor = StubExecutor::empty();
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    let result = server.handle_tool("drop_everything", json!({})).await;
    assert!(matches!(result, Err(ToolFailure::UnknownTool)));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn malformed_arguments_are_reported_as_invalid() {
    let executor = StubExecutor::empty();
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    // tableName is required for describe_table.
    let result = server
        .handle_tool("describe_table", json!({"database": "Sales"}))
        .await;
    assert!(matches!(result, Err(ToolFailure::InvalidArguments(_))));
}

#[tokio::test]
async fn relationship_lookups_are_never_cached() {
    let executor = StubExecutor::empty();
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    for _ in 0..2 {
        server
            .handle_tool(
                "get_table_relationships",
                json!({"database": "Sales", "tableName": "Orders"}),
            )
            .await
            .expect("lookup should succeed");
    }

    assert_eq!(
        executor.call_count(),
        4,
        "two calls, two sub-queries each, no caching"
    );
    assert_eq!(cache.stats().size, 0);
}

#[tokio::test]
async fn search_schema_merges_all_three_result_kinds() {
    let executor = StubExecutor::new(Box::new(|sql| {
        // The column search joins sys.tables too, so test for it first.
        let rows = if sql.contains("sys.columns") {
            vec![row(json!({
                "objectName": "order_id",
                "schemaName": "dbo",
                "parentObject": "Orders",
                "dataType": "int"
            }))]
        } else if sql.contains("sys.tables") {
            vec![row(json!({"objectName": "Orders", "schemaName": "dbo"}))]
        } else {
            vec![row(json!({"objectName": "usp_orders", "schemaName": "dbo"}))]
        };
        Ok((Vec::new(), rows))
    }));
    let cache = fresh_cache();
    let server = server_with(ServerConfig::default(), &cache, &executor);

    let text = server
        .handle_tool(
            "search_schema",
            json!({"database": "Sales", "searchTerm": "order"}),
        )
        .await
        .expect("search should succeed");

    let payload: Value = serde_json::from_str(&text).expect("payload should be JSON");
    let results = payload.as_array().expect("payload should be an array");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["objectType"], json!("table"));
    assert_eq!(results[1]["objectType"], json!("column"));
    assert_eq!(results[1]["description"], json!("Type: int"));
    assert_eq!(results[2]["objectType"], json!("procedure"));
}
