//! Tool facades and static tool metadata.
//!
//! - `schema`: structural lookups behind the TTL cache
//! - `relationships`: foreign-key graph lookups, always fresh
//! - `search`: keyword search and column usage, always fresh

pub mod args;
pub mod relationships;
pub mod schema;
pub mod search;

use schemars::{JsonSchema, schema_for};
use serde_json::Value;

pub use relationships::RelationshipTools;
pub use schema::SchemaTools;
pub use search::SearchTools;

/// Metadata for a single tool.
#[derive(Debug, Clone)]
pub struct ToolMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
}

fn build_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

/// Every tool the server exposes, in listing order.
pub fn all_tool_metadata() -> Vec<ToolMetadata> {
    use args::*;

    vec![
        ToolMetadata {
            name: "list_databases",
            description: "List all databases on the SQL Server instance. Useful for discovering what databases are available.",
            schema: build_schema::<ListDatabasesArgs>(),
        },
        ToolMetadata {
            name: "list_tables",
            description: "List all tables in a specific database with row counts. Essential for understanding database structure.",
            schema: build_schema::<ListTablesArgs>(),
        },
        ToolMetadata {
            name: "describe_table",
            description: "Get detailed schema information about a table including columns, data types, constraints, foreign keys, and indexes. Critical for understanding table structure.",
            schema: build_schema::<DescribeTableArgs>(),
        },
        ToolMetadata {
            name: "get_table_relationships",
            description: "Get all foreign key relationships for a table (both incoming and outgoing). Shows how tables are connected.",
            schema: build_schema::<TableRelationshipsArgs>(),
        },
        ToolMetadata {
            name: "search_schema",
            description: "Search across tables, columns, and stored procedures by keyword. Perfect for finding where something is implemented.",
            schema: build_schema::<SearchSchemaArgs>(),
        },
        ToolMetadata {
            name: "find_column_usage",
            description: "Find all tables that contain a column with a specific name. Useful for tracking where a field is used across the database.",
            schema: build_schema::<FindColumnUsageArgs>(),
        },
        ToolMetadata {
            name: "list_stored_procedures",
            description: "List all stored procedures in a database.",
            schema: build_schema::<ListStoredProceduresArgs>(),
        },
        ToolMetadata {
            name: "get_procedure_definition",
            description: "Get the full SQL definition of a stored procedure.",
            schema: build_schema::<ProcedureDefinitionArgs>(),
        },
        ToolMetadata {
            name: "list_views",
            description: "List all views in a database.",
            schema: build_schema::<ListViewsArgs>(),
        },
        ToolMetadata {
            name: "get_view_definition",
            description: "Get the full SQL definition of a view.",
            schema: build_schema::<ViewDefinitionArgs>(),
        },
        ToolMetadata {
            name: "get_database_overview",
            description: "Get high-level statistics about a database including table count, view count, procedure count, and schema count.",
            schema: build_schema::<DatabaseOverviewArgs>(),
        },
        ToolMetadata {
            name: "execute_query",
            description: "Execute a read-only SELECT query against the database. Automatically limited to prevent large result sets. Only SELECT queries are allowed.",
            schema: build_schema::<ExecuteQueryArgs>(),
        },
        ToolMetadata {
            name: "get_related_tables",
            description: "Get all tables directly related to a given table through foreign key relationships. Helps understand table dependencies.",
            schema: build_schema::<RelatedTablesArgs>(),
        },
    ]
}

/// Qualify an object name with the default `dbo` schema when the caller did
/// not supply one. Applied before cache-key derivation, so `Users` and
/// `dbo.Users` share an entry.
pub(crate) fn qualify_object_name(name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("dbo.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_bare_object_names() {
        assert_eq!(qualify_object_name("Users"), "dbo.Users");
        assert_eq!(qualify_object_name("sales.Orders"), "sales.Orders");
    }

    #[test]
    fn every_tool_has_an_object_schema() {
        for tool in all_tool_metadata() {
            assert!(
                tool.schema.is_object(),
                "tool {} has a non-object input schema",
                tool.name
            );
        }
    }
}
