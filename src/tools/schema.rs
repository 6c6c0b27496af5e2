//! Cached schema facade.
//!
//! High-repeat-rate structural lookups go through the TTL cache: the key is
//! derived from the operation name and its parameters (after `dbo.`
//! qualification), a hit never touches the executor, and a miss populates
//! the cache only when the whole operation succeeds. Definition lookups are
//! cheap and rare, so they stay uncached.

use serde_json::Value;
use std::sync::Arc;

use crate::cache::{SchemaCache, cache_key};
use crate::catalog;
use crate::error::{ExplorerError, Result};
use crate::executor::Executor;
use crate::models::{
    self, DatabaseInfo, DatabaseOverview, StoredProcedureInfo, TableDescription, TableInfo,
    ViewInfo,
};

use super::qualify_object_name;

pub struct SchemaTools {
    executor: Arc<dyn Executor>,
    cache: Arc<SchemaCache>,
}

impl SchemaTools {
    pub fn new(executor: Arc<dyn Executor>, cache: Arc<SchemaCache>) -> Self {
        Self { executor, cache }
    }

    pub async fn list_databases(&self, include_system: bool) -> Result<Vec<DatabaseInfo>> {
        let flag = include_system.to_string();
        let key = cache_key("list_databases", &[flag.as_str()]);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(serde_json::from_value(hit)?);
        }

        let sql = if include_system {
            catalog::LIST_ALL_DATABASES
        } else {
            catalog::LIST_DATABASES
        };
        let rows = self.executor.query(None, sql, &[]).await?;
        let databases: Vec<DatabaseInfo> = models::from_rows(rows)?;

        self.cache.set(&key, serde_json::to_value(&databases)?);
        Ok(databases)
    }

    pub async fn list_tables(&self, database: &str) -> Result<Vec<TableInfo>> {
        let key = cache_key("list_tables", &[database]);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(serde_json::from_value(hit)?);
        }

        let rows = self
            .executor
            .query(Some(database), catalog::LIST_TABLES, &[])
            .await?;
        let tables: Vec<TableInfo> = models::from_rows(rows)?;

        self.cache.set(&key, serde_json::to_value(&tables)?);
        Ok(tables)
    }

    /// Columns, foreign keys, and indexes for one table, fetched
    /// concurrently. All three sub-queries must succeed; a partial result is
    /// never returned or cached.
    pub async fn describe_table(
        &self,
        database: &str,
        table_name: &str,
    ) -> Result<TableDescription> {
        let table = qualify_object_name(table_name);
        let key = cache_key("describe_table", &[database, table.as_str()]);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(serde_json::from_value(hit)?);
        }

        let params: [&str; 1] = [table.as_str()];
        let (columns, foreign_keys, indexes) = tokio::try_join!(
            self.executor
                .query(Some(database), catalog::TABLE_COLUMNS, &params),
            self.executor
                .query(Some(database), catalog::TABLE_FOREIGN_KEYS, &params),
            self.executor
                .query(Some(database), catalog::TABLE_INDEXES, &params),
        )?;

        let description = TableDescription {
            columns: models::from_rows(columns)?,
            foreign_keys: models::from_rows(foreign_keys)?,
            indexes: models::from_rows(indexes)?,
        };

        self.cache.set(&key, serde_json::to_value(&description)?);
        Ok(description)
    }

    pub async fn list_views(&self, database: &str) -> Result<Vec<ViewInfo>> {
        let key = cache_key("list_views", &[database]);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(serde_json::from_value(hit)?);
        }

        let rows = self
            .executor
            .query(Some(database), catalog::LIST_VIEWS, &[])
            .await?;
        let views: Vec<ViewInfo> = models::from_rows(rows)?;

        self.cache.set(&key, serde_json::to_value(&views)?);
        Ok(views)
    }

    pub async fn list_stored_procedures(
        &self,
        database: &str,
    ) -> Result<Vec<StoredProcedureInfo>> {
        let key = cache_key("list_procedures", &[database]);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(serde_json::from_value(hit)?);
        }

        let rows = self
            .executor
            .query(Some(database), catalog::LIST_STORED_PROCEDURES, &[])
            .await?;
        let procedures: Vec<StoredProcedureInfo> = models::from_rows(rows)?;

        self.cache.set(&key, serde_json::to_value(&procedures)?);
        Ok(procedures)
    }

    /// Full definition text of a stored procedure, or an empty string when
    /// the name resolves to nothing.
    pub async fn get_procedure_definition(
        &self,
        database: &str,
        procedure_name: &str,
    ) -> Result<String> {
        let procedure = qualify_object_name(procedure_name);
        let rows = self
            .executor
            .query(Some(database), catalog::PROCEDURE_DEFINITION, &[procedure.as_str()])
            .await?;
        Ok(extract_definition(rows))
    }

    /// Full definition text of a view, or an empty string when the name
    /// resolves to nothing.
    pub async fn get_view_definition(&self, database: &str, view_name: &str) -> Result<String> {
        let view = qualify_object_name(view_name);
        let rows = self
            .executor
            .query(Some(database), catalog::VIEW_DEFINITION, &[view.as_str()])
            .await?;
        Ok(extract_definition(rows))
    }

    pub async fn get_database_overview(&self, database: &str) -> Result<DatabaseOverview> {
        let key = cache_key("overview", &[database]);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(serde_json::from_value(hit)?);
        }

        let rows = self
            .executor
            .query(Some(database), catalog::DATABASE_OVERVIEW, &[])
            .await?;
        let overview: DatabaseOverview = models::from_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ExplorerError::NotFound(format!("database overview for {database}")))?;

        self.cache.set(&key, serde_json::to_value(&overview)?);
        Ok(overview)
    }
}

fn extract_definition(rows: Vec<crate::executor::JsonRow>) -> String {
    rows.into_iter()
        .next()
        .and_then(|mut row| row.remove("definition"))
        .and_then(|value| match value {
            Value::String(s) => Some(s),
            _ => None,
        })
        .unwrap_or_default()
}
