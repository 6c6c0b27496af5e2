//! MCP server for SQL Server schema exploration.
//!
//! Exposes a SQL Server instance's metadata (databases, tables, columns,
//! indexes, foreign keys, views, stored procedures) and a restricted
//! read-only query path as MCP tools over stdio.
//!
//! Structural lookups are cached with a TTL ([`cache::SchemaCache`]);
//! ad-hoc queries pass through a read-only classifier and a row-limit
//! rewriter ([`query`]) before reaching the database. All statement
//! execution goes through the [`executor::Executor`] seam, which carries
//! the target database in every call — there is no ambient connection
//! context to race on.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod query;
pub mod server;
pub mod tools;

pub use cache::{CacheStats, SchemaCache, cache_key};
pub use config::{Cli, ServerConfig};
pub use error::{ExplorerError, Result};
pub use executor::{Executor, JsonRow, TdsExecutor};
pub use query::{QueryClassification, QueryGateway, bound_rows, classify};
pub use server::{ExplorerServer, ToolFailure};
