//! Statement execution seam.
//!
//! The [`Executor`] trait is the only path to the database. Every call names
//! its target database explicitly — there is no ambient "current database"
//! anywhere in the crate, so concurrent operations against different
//! databases cannot race on connection context.
//!
//! [`TdsExecutor`] is the production implementation: a single TDS session
//! serialized behind a mutex. Selecting the database context and running the
//! statement happen under one guard, making the pair atomic. Tests inject
//! stub executors instead.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use std::time::Duration;
use tiberius::{AuthMethod, Client, ColumnData, Config as TdsConfig, Row, ToSql};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::ServerConfig;
use crate::error::{ExplorerError, Result};

/// One result row, keyed by column name.
pub type JsonRow = Map<String, Value>;

#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `sql` with the given string parameters against `database`
    /// (or the connection's initial database when `None`), returning the
    /// column names in result order and the decoded rows.
    async fn query_with_columns(
        &self,
        database: Option<&str>,
        sql: &str,
        params: &[&str],
    ) -> Result<(Vec<String>, Vec<JsonRow>)>;

    /// Like [`query_with_columns`], discarding the column list.
    ///
    /// [`query_with_columns`]: Executor::query_with_columns
    async fn query(
        &self,
        database: Option<&str>,
        sql: &str,
        params: &[&str],
    ) -> Result<Vec<JsonRow>> {
        let (_, rows) = self.query_with_columns(database, sql, params).await?;
        Ok(rows)
    }
}

/// Serialized TDS session with a per-request timeout.
pub struct TdsExecutor {
    client: Mutex<Client<Compat<TcpStream>>>,
    query_timeout: Duration,
}

impl TdsExecutor {
    /// Connect and authenticate using the server configuration.
    pub async fn connect(config: &ServerConfig) -> Result<Self> {
        let username = config
            .username
            .as_deref()
            .ok_or_else(|| ExplorerError::Config("no user name configured".to_string()))?;
        let password = config
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default();

        let mut tds = TdsConfig::new();
        tds.host(&config.server);
        tds.port(config.port);
        tds.database(&config.database);
        tds.trust_cert();
        if config.windows_auth {
            #[cfg(windows)]
            tds.authentication(AuthMethod::windows(username, password));
            #[cfg(not(windows))]
            return Err(ExplorerError::Config(
                "windows authentication requires building on Windows (winauth)".to_string(),
            ));
        } else {
            tds.authentication(AuthMethod::sql_server(username, password));
        }

        let tcp = TcpStream::connect(tds.get_addr()).await?;
        tcp.set_nodelay(true)?;
        let client = Client::connect(tds, tcp.compat_write()).await?;

        log::info!(
            "connected to {}:{} (initial database: {})",
            config.server,
            config.port,
            config.database
        );

        Ok(Self {
            client: Mutex::new(client),
            query_timeout: config.query_timeout,
        })
    }
}

#[async_trait]
impl Executor for TdsExecutor {
    async fn query_with_columns(
        &self,
        database: Option<&str>,
        sql: &str,
        params: &[&str],
    ) -> Result<(Vec<String>, Vec<JsonRow>)> {
        let run = async {
            let mut client = self.client.lock().await;

            // Context select and statement execution share one guard, so the
            // pair is atomic with respect to other callers.
            if let Some(db) = database {
                let use_stmt = format!("USE [{}];", escape_identifier(db));
                client.simple_query(use_stmt).await?.into_results().await?;
            }

            let tds_params: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
            let mut stream = client.query(sql, &tds_params).await?;

            let columns: Vec<String> = stream
                .columns()
                .await?
                .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default();
            let rows = stream.into_first_result().await?;

            Ok::<_, ExplorerError>((columns, rows.iter().map(row_to_json).collect()))
        };

        // A timed-out call abandons the in-flight request; the guard is
        // released when the future drops.
        match tokio::time::timeout(self.query_timeout, run).await {
            Ok(result) => result,
            Err(_) => Err(ExplorerError::Execution(format!(
                "query timed out after {}s",
                self.query_timeout.as_secs()
            ))),
        }
    }
}

/// Escape a name for use inside `[...]` delimiters.
fn escape_identifier(name: &str) -> String {
    name.replace(']', "]]")
}

fn row_to_json(row: &Row) -> JsonRow {
    let mut map = JsonRow::new();
    for (idx, (column, data)) in row.cells().enumerate() {
        map.insert(column.name().to_string(), cell_to_json(row, idx, data));
    }
    map
}

/// Decode one cell into JSON. Temporal types go through the chrono
/// conversions; binary becomes base64; anything undecodable degrades to
/// null rather than failing the whole row.
fn cell_to_json(row: &Row, idx: usize, data: &ColumnData<'_>) -> Value {
    match data {
        ColumnData::Bit(v) => (*v).map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::U8(v) => (*v).map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::I16(v) => (*v).map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::I32(v) => (*v).map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::I64(v) => (*v).map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::F32(v) => (*v)
            .and_then(|n| serde_json::Number::from_f64(f64::from(n)))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::F64(v) => (*v)
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v
            .as_ref()
            .and_then(|n| serde_json::Number::from_f64(f64::from(n.clone())))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => (*v)
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| Value::String(BASE64.encode(b.as_ref())))
            .unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| Value::String(x.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .ok()
            .flatten()
            .map(|dt| Value::String(dt.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Date(_) => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Time(_) => row
            .try_get::<chrono::NaiveTime, _>(idx)
            .ok()
            .flatten()
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::DateTimeOffset(_) => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
            .ok()
            .flatten()
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_closing_brackets_in_identifiers() {
        assert_eq!(escape_identifier("Sales"), "Sales");
        assert_eq!(escape_identifier("odd]name"), "odd]]name");
    }
}
