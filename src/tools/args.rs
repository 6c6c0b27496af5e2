//! Argument structs for every tool.
//!
//! Wire names are camelCase; the derived JSON Schemas become the tools'
//! input schemas.

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDatabasesArgs {
    /// Include system databases (master, tempdb, model, msdb)
    #[serde(default)]
    pub include_system: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTablesArgs {
    /// Name of the database
    pub database: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTableArgs {
    /// Name of the database
    pub database: String,
    /// Name of the table (can include schema, e.g., dbo.Users)
    pub table_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableRelationshipsArgs {
    /// Name of the database
    pub database: String,
    /// Name of the table
    pub table_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchSchemaArgs {
    /// Name of the database
    pub database: String,
    /// Search term or keyword
    pub search_term: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindColumnUsageArgs {
    /// Name of the database
    pub database: String,
    /// Exact column name to search for
    pub column_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListStoredProceduresArgs {
    /// Name of the database
    pub database: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureDefinitionArgs {
    /// Name of the database
    pub database: String,
    /// Name of the stored procedure
    pub procedure_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListViewsArgs {
    /// Name of the database
    pub database: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinitionArgs {
    /// Name of the database
    pub database: String,
    /// Name of the view
    pub view_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOverviewArgs {
    /// Name of the database
    pub database: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteQueryArgs {
    /// Name of the database
    pub database: String,
    /// SQL SELECT query to execute
    pub query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTablesArgs {
    /// Name of the database
    pub database: String,
    /// Name of the table
    pub table_name: String,
}
