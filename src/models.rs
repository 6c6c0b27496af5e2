//! Typed payloads for the tool surface.
//!
//! Field names serialize in camelCase — the wire shapes agents see. Rows
//! coming back from the executor are plain JSON objects keyed by the column
//! aliases in [`crate::catalog`]; [`from_rows`] bridges them into these
//! types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::executor::JsonRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    pub database_name: String,
    pub created_date: Option<String>,
    pub state: String,
    pub compatibility_level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub table_name: String,
    pub schema_name: String,
    /// Approximate, from partition stats; NULL for tables without partitions.
    pub row_count: Option<i64>,
    pub table_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub max_length: Option<i64>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyInfo {
    pub constraint_name: String,
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub referenced_schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    /// Heap entries carry a NULL index name.
    pub index_name: Option<String>,
    pub column_name: String,
    pub is_unique: bool,
    pub is_primary_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewInfo {
    pub view_name: String,
    pub schema_name: String,
    pub created_date: Option<String>,
    pub modified_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProcedureInfo {
    pub procedure_name: String,
    pub schema_name: String,
    pub created_date: Option<String>,
    pub modified_date: Option<String>,
}

/// One table another table depends on through a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDependency {
    pub dependent_table: String,
    pub dependent_schema: String,
    pub constraint_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSearchResult {
    pub object_type: String,
    pub object_name: String,
    pub schema_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnUsage {
    pub table_name: String,
    pub schema_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
}

/// Composite result of `describe_table`: assembled only when all three
/// sub-queries succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescription {
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub indexes: Vec<IndexInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRelationships {
    pub outgoing_references: Vec<ForeignKeyInfo>,
    pub incoming_references: Vec<TableDependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTables {
    pub direct_relations: Vec<String>,
    pub indirect_relations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOverview {
    pub table_count: i64,
    pub view_count: i64,
    pub procedure_count: i64,
    pub schema_count: i64,
    pub database_name: String,
}

/// Result of an ad-hoc `execute_query` call. Never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExecutionResult {
    /// Column names in result order, duplicates preserved verbatim.
    pub columns: Vec<String>,
    pub rows: Vec<JsonRow>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

/// Decode executor rows into a typed vector.
pub fn from_rows<T: serde::de::DeserializeOwned>(rows: Vec<JsonRow>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(Into::into))
        .collect()
}
