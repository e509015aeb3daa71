//! Query execution against the data source.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor, Row};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Query errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The server could not be reached or refused the credentials
    #[error("{0}")]
    Connection(String),

    /// The query was rejected or its result could not be read
    #[error("{0}")]
    Query(String),

    /// The query succeeded but produced no rows
    #[error("Query returned no rows.")]
    NoRows,
}

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionParams {
    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// Runs one query and returns its first column of its first row as text.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `query`, returning the scalar result.
    ///
    /// SQL `NULL` is returned as an empty string.
    async fn fetch_scalar(
        &self,
        params: &ConnectionParams,
        query: &str,
    ) -> Result<String, QueryError>;
}

/// MySQL-backed executor. Opens one connection per call, no pooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlExecutor;

impl MySqlExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueryExecutor for MySqlExecutor {
    async fn fetch_scalar(
        &self,
        params: &ConnectionParams,
        query: &str,
    ) -> Result<String, QueryError> {
        let mut conn = MySqlConnection::connect_with(&params.connect_options())
            .await
            .map_err(|e| {
                warn!(host = %params.host, port = params.port, error = %e, "MySQL connection failed");
                QueryError::Connection(e.to_string())
            })?;
        debug!(host = %params.host, database = %params.database, "connected");

        // A plain &str runs over the text protocol, so every column type
        // arrives as its textual form.
        let fetched = (&mut conn).fetch_optional(query).await;

        if let Err(e) = conn.close().await {
            debug!(error = %e, "error closing MySQL connection");
        }

        let row = fetched
            .map_err(|e| {
                warn!(error = %e, "query failed");
                QueryError::Query(e.to_string())
            })?
            .ok_or(QueryError::NoRows)?;

        if row.columns().is_empty() {
            return Err(QueryError::NoRows);
        }

        let value: Option<String> = row
            .try_get_unchecked(0usize)
            .map_err(|e| QueryError::Query(e.to_string()))?;
        Ok(value.unwrap_or_default())
    }
}
