//! Server configuration.
//!
//! Every knob is a CLI flag that doubles as an environment variable, so the
//! binary drops into an MCP client config either way:
//!
//! ```json
//! { "command": "mssql-explorer", "env": { "MSSQL_SERVER": "db.internal" } }
//! ```

use clap::Parser;
use secrecy::SecretString;
use std::time::Duration;

use crate::error::{ExplorerError, Result};

/// MSSQL Explorer - schema exploration and read-only queries over MCP
#[derive(Parser, Debug)]
#[command(name = "mssql-explorer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQL Server host name or address
    #[arg(long, env = "MSSQL_SERVER", default_value = "localhost")]
    pub server: String,

    /// SQL Server TCP port
    #[arg(long, env = "MSSQL_PORT", default_value_t = 1433)]
    pub port: u16,

    /// Initial database for the connection
    #[arg(long, env = "MSSQL_DATABASE", default_value = "master")]
    pub database: String,

    /// Authenticate with Windows (NTLM) credentials instead of a SQL login
    #[arg(long, env = "MSSQL_WINDOWS_AUTH", default_value_t = false)]
    pub windows_auth: bool,

    /// Login user name
    #[arg(long, env = "MSSQL_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "MSSQL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Comma-separated allow-list of accessible databases.
    ///
    /// When set, requests naming any other database are rejected before a
    /// single statement is sent.
    #[arg(long, env = "MSSQL_ALLOWED_DATABASES", value_delimiter = ',')]
    pub allowed_databases: Option<Vec<String>>,

    /// Per-query timeout in seconds
    #[arg(long, env = "MSSQL_QUERY_TIMEOUT_SECS", default_value_t = 30)]
    pub query_timeout_secs: u64,

    /// Maximum rows returned by execute_query
    #[arg(long, env = "MSSQL_MAX_RESULT_ROWS", default_value_t = 1000)]
    pub max_result_rows: u32,

    /// Allow statements that fail the read-only classifier
    #[arg(long, env = "MSSQL_ENABLE_WRITE_OPERATIONS", default_value_t = false)]
    pub enable_write_operations: bool,

    /// Schema cache time-to-live in seconds
    #[arg(long, env = "MSSQL_CACHE_TTL_SECS", default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    /// Disable the schema cache entirely
    #[arg(long, env = "MSSQL_CACHE_DISABLED", default_value_t = false)]
    pub cache_disabled: bool,
}

impl Cli {
    /// Convert parsed arguments into the runtime configuration.
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            server: self.server,
            port: self.port,
            database: self.database,
            windows_auth: self.windows_auth,
            username: self.username,
            password: self.password.map(SecretString::from),
            allowed_databases: self.allowed_databases,
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            max_result_rows: self.max_result_rows,
            enable_write_operations: self.enable_write_operations,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_enabled: !self.cache_disabled,
        }
    }
}

/// Runtime configuration, built once in main and shared via `Arc`.
#[derive(Debug)]
pub struct ServerConfig {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub windows_auth: bool,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub allowed_databases: Option<Vec<String>>,
    pub query_timeout: Duration,
    pub max_result_rows: u32,
    pub enable_write_operations: bool,
    pub cache_ttl: Duration,
    pub cache_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 1433,
            database: "master".to_string(),
            windows_auth: false,
            username: None,
            password: None,
            allowed_databases: None,
            query_timeout: Duration::from_secs(30),
            max_result_rows: 1000,
            enable_write_operations: false,
            cache_ttl: Duration::from_secs(3600),
            cache_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Reject databases outside the allow-list.
    ///
    /// An unset or empty allow-list permits everything. Matching is exact,
    /// the way the list was written in configuration.
    pub fn check_database_access(&self, database: &str) -> Result<()> {
        match &self.allowed_databases {
            Some(allowed)
                if !allowed.is_empty() && !allowed.iter().any(|db| db == database) =>
            {
                Err(ExplorerError::AccessDenied {
                    database: database.to_string(),
                    allowed: allowed.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_config_permits_any_database() {
        let config = ServerConfig::default();
        assert!(config.check_database_access("Northwind").is_ok());
    }

    #[test]
    fn allow_list_rejects_unlisted_database() {
        let config = ServerConfig {
            allowed_databases: Some(vec!["Sales".to_string(), "Inventory".to_string()]),
            ..ServerConfig::default()
        };

        assert!(config.check_database_access("Sales").is_ok());
        let err = config.check_database_access("Payroll").unwrap_err();
        assert!(matches!(err, ExplorerError::AccessDenied { .. }));
        assert!(err.to_string().contains("Payroll"));
    }

    #[test]
    fn empty_allow_list_permits_everything() {
        let config = ServerConfig {
            allowed_databases: Some(vec![]),
            ..ServerConfig::default()
        };
        assert!(config.check_database_access("anything").is_ok());
    }
}
