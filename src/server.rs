//! MCP server: tool listing and dispatch over stdio.
//!
//! [`ExplorerServer`] implements [`ServerHandler`] directly. Tool dispatch
//! is transport-independent ([`handle_tool`]) so the behavior is testable
//! without a connected client: the allow-list gate runs first, then the
//! call routes to the matching facade. Operation failures become MCP error
//! results (the `isError` flag) carrying a readable message; unknown tools
//! and malformed arguments are protocol errors.
//!
//! [`handle_tool`]: ExplorerServer::handle_tool

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::stdio,
};
use serde_json::Value;
use std::sync::Arc;

use crate::cache::SchemaCache;
use crate::config::ServerConfig;
use crate::error::ExplorerError;
use crate::executor::Executor;
use crate::query::QueryGateway;
use crate::tools::{
    RelationshipTools, SchemaTools, SearchTools, all_tool_metadata,
    args::{
        DatabaseOverviewArgs, DescribeTableArgs, ExecuteQueryArgs, FindColumnUsageArgs,
        ListDatabasesArgs, ListStoredProceduresArgs, ListTablesArgs, ListViewsArgs,
        ProcedureDefinitionArgs, RelatedTablesArgs, SearchSchemaArgs, TableRelationshipsArgs,
        ViewDefinitionArgs,
    },
};

/// Why a tool invocation did not produce a payload.
#[derive(Debug)]
pub enum ToolFailure {
    /// No tool with the requested name exists.
    UnknownTool,
    /// The arguments did not match the tool's input schema.
    InvalidArguments(String),
    /// The operation itself failed; reported as a tool error result.
    Operation(ExplorerError),
}

impl From<ExplorerError> for ToolFailure {
    fn from(err: ExplorerError) -> Self {
        ToolFailure::Operation(err)
    }
}

pub struct ExplorerServer {
    config: Arc<ServerConfig>,
    schema: SchemaTools,
    relationships: RelationshipTools,
    search: SearchTools,
    gateway: QueryGateway,
}

impl ExplorerServer {
    pub fn new(
        config: Arc<ServerConfig>,
        cache: Arc<SchemaCache>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            schema: SchemaTools::new(Arc::clone(&executor), cache),
            relationships: RelationshipTools::new(Arc::clone(&executor)),
            search: SearchTools::new(Arc::clone(&executor)),
            gateway: QueryGateway::new(executor, Arc::clone(&config)),
            config,
        }
    }

    /// Serve the MCP protocol over stdio until the client disconnects.
    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        log::info!("starting MCP server on stdio");

        let service = self.serve(stdio()).await.inspect_err(|e| {
            log::error!("serving error: {e:?}");
        })?;
        service.waiting().await?;

        log::info!("MCP server stopped");
        Ok(())
    }

    /// Dispatch one tool call. Returns the rendered response text.
    ///
    /// Any argument set naming a database is checked against the allow-list
    /// before anything else runs — a denied database never reaches the
    /// executor.
    pub async fn handle_tool(
        &self,
        name: &str,
        args: Value,
    ) -> std::result::Result<String, ToolFailure> {
        if let Some(db) = args.get("database").and_then(Value::as_str) {
            self.config.check_database_access(db)?;
        }

        match name {
            "list_databases" => {
                let args: ListDatabasesArgs = parse_args(args)?;
                pretty(&self.schema.list_databases(args.include_system).await?)
            }
            "list_tables" => {
                let args: ListTablesArgs = parse_args(args)?;
                pretty(&self.schema.list_tables(&args.database).await?)
            }
            "describe_table" => {
                let args: DescribeTableArgs = parse_args(args)?;
                pretty(
                    &self
                        .schema
                        .describe_table(&args.database, &args.table_name)
                        .await?,
                )
            }
            "get_table_relationships" => {
                let args: TableRelationshipsArgs = parse_args(args)?;
                pretty(
                    &self
                        .relationships
                        .get_table_relationships(&args.database, &args.table_name)
                        .await?,
                )
            }
            "search_schema" => {
                let args: SearchSchemaArgs = parse_args(args)?;
                pretty(
                    &self
                        .search
                        .search_schema(&args.database, &args.search_term)
                        .await?,
                )
            }
            "find_column_usage" => {
                let args: FindColumnUsageArgs = parse_args(args)?;
                pretty(
                    &self
                        .search
                        .find_column_usage(&args.database, &args.column_name)
                        .await?,
                )
            }
            "list_stored_procedures" => {
                let args: ListStoredProceduresArgs = parse_args(args)?;
                pretty(&self.schema.list_stored_procedures(&args.database).await?)
            }
            "get_procedure_definition" => {
                let args: ProcedureDefinitionArgs = parse_args(args)?;
                // Definition text is returned raw, not JSON-encoded.
                Ok(self
                    .schema
                    .get_procedure_definition(&args.database, &args.procedure_name)
                    .await?)
            }
            "list_views" => {
                let args: ListViewsArgs = parse_args(args)?;
                pretty(&self.schema.list_views(&args.database).await?)
            }
            "get_view_definition" => {
                let args: ViewDefinitionArgs = parse_args(args)?;
                Ok(self
                    .schema
                    .get_view_definition(&args.database, &args.view_name)
                    .await?)
            }
            "get_database_overview" => {
                let args: DatabaseOverviewArgs = parse_args(args)?;
                pretty(&self.schema.get_database_overview(&args.database).await?)
            }
            "execute_query" => {
                let args: ExecuteQueryArgs = parse_args(args)?;
                pretty(
                    &self
                        .gateway
                        .execute_read_only(&args.database, &args.query)
                        .await?,
                )
            }
            "get_related_tables" => {
                let args: RelatedTablesArgs = parse_args(args)?;
                pretty(
                    &self
                        .relationships
                        .get_related_tables(&args.database, &args.table_name)
                        .await?,
                )
            }
            _ => Err(ToolFailure::UnknownTool),
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, ToolFailure> {
    serde_json::from_value(args).map_err(|e| ToolFailure::InvalidArguments(e.to_string()))
}

fn pretty<T: serde::Serialize>(payload: &T) -> Result<String, ToolFailure> {
    serde_json::to_string_pretty(payload)
        .map_err(|e| ToolFailure::Operation(ExplorerError::from(e)))
}

impl ServerHandler for ExplorerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "SQL Server schema exploration and read-only queries. Start with \
                 list_databases or get_database_overview, then drill into tables with \
                 describe_table."
                    .to_string(),
            ),
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_name = request.name.clone();
        let args = match request.arguments {
            Some(map) => Value::Object(map),
            None => Value::Object(serde_json::Map::new()),
        };

        match self.handle_tool(&tool_name, args).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(ToolFailure::UnknownTool) => Err(McpError::invalid_params(
                format!("Unknown tool: {tool_name}"),
                None,
            )),
            Err(ToolFailure::InvalidArguments(message)) => Err(McpError::invalid_params(
                format!("Invalid arguments for tool '{tool_name}': {message}"),
                None,
            )),
            Err(ToolFailure::Operation(err)) => {
                log::warn!("tool '{tool_name}' failed: {err}");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error: {err}"
                ))]))
            }
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let mut tools = Vec::new();

        for tool_meta in all_tool_metadata() {
            let schema_obj = match tool_meta.schema {
                Value::Object(obj) => Arc::new(obj),
                _ => Arc::new(serde_json::Map::new()),
            };

            tools.push(Tool {
                name: tool_meta.name.to_string().into(),
                title: None,
                description: Some(tool_meta.description.to_string().into()),
                input_schema: schema_obj,
                output_schema: None,
                annotations: None,
                icons: None,
                meta: None,
            });
        }

        log::debug!("serving {} tools", tools.len());

        Ok(ListToolsResult::with_all_items(tools))
    }
}
