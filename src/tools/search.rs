//! Keyword search across the schema.
//!
//! Search is exploratory and low-repeat-rate, so nothing here touches the
//! cache — results are always fresh.

use serde::Deserialize;
use std::sync::Arc;

use crate::catalog;
use crate::error::Result;
use crate::executor::Executor;
use crate::models::{self, ColumnUsage, SchemaSearchResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMatch {
    object_name: String,
    schema_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnMatch {
    object_name: String,
    schema_name: String,
    parent_object: String,
    data_type: String,
}

pub struct SearchTools {
    executor: Arc<dyn Executor>,
}

impl SearchTools {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Substring search over table, column, and procedure names, run
    /// concurrently and merged into one result list.
    pub async fn search_schema(
        &self,
        database: &str,
        search_term: &str,
    ) -> Result<Vec<SchemaSearchResult>> {
        let pattern = format!("%{search_term}%");
        let params: [&str; 1] = [pattern.as_str()];

        let (tables, columns, procedures) = tokio::try_join!(
            self.executor
                .query(Some(database), catalog::SEARCH_TABLES, &params),
            self.executor
                .query(Some(database), catalog::SEARCH_COLUMNS, &params),
            self.executor
                .query(Some(database), catalog::SEARCH_PROCEDURES, &params),
        )?;

        let tables: Vec<ObjectMatch> = models::from_rows(tables)?;
        let columns: Vec<ColumnMatch> = models::from_rows(columns)?;
        let procedures: Vec<ObjectMatch> = models::from_rows(procedures)?;

        let mut results = Vec::with_capacity(tables.len() + columns.len() + procedures.len());
        results.extend(tables.into_iter().map(|t| SchemaSearchResult {
            object_type: "table".to_string(),
            object_name: t.object_name,
            schema_name: t.schema_name,
            parent_object: None,
            description: None,
        }));
        results.extend(columns.into_iter().map(|c| SchemaSearchResult {
            object_type: "column".to_string(),
            object_name: c.object_name,
            schema_name: c.schema_name,
            parent_object: Some(c.parent_object),
            description: Some(format!("Type: {}", c.data_type)),
        }));
        results.extend(procedures.into_iter().map(|p| SchemaSearchResult {
            object_type: "procedure".to_string(),
            object_name: p.object_name,
            schema_name: p.schema_name,
            parent_object: None,
            description: None,
        }));

        Ok(results)
    }

    /// Every table carrying a column with exactly this name.
    pub async fn find_column_usage(
        &self,
        database: &str,
        column_name: &str,
    ) -> Result<Vec<ColumnUsage>> {
        let rows = self
            .executor
            .query(Some(database), catalog::FIND_COLUMN_USAGE, &[column_name])
            .await?;
        models::from_rows(rows)
    }
}
