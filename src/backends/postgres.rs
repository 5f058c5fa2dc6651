//! PostgreSQL driver backed by sqlx.
//!
//! Connections always use `sslmode=verify-full`: the server certificate must
//! chain to a trusted root (the configured CA bundle, or the system roots) and
//! match the host name, otherwise the connection fails.

use crate::connection::{ConnectParams, Diagnostic, StatementError, DIAGNOSTIC_QUERY};
use crate::{Connector, DbConnection, QaError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;

/// sqlx-based [`Connector`].
#[derive(Debug, Default, Clone)]
pub struct PgConnector;

impl PgConnector {
    /// Creates the connector.
    pub fn new() -> Self {
        Self
    }

    fn connect_options(params: &ConnectParams) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.username)
            .password(&params.password)
            .database(&params.database)
            .ssl_mode(PgSslMode::VerifyFull);

        match params.ssl_root_cert {
            Some(ref path) => options.ssl_root_cert(path),
            None => options,
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn open(&self, params: &ConnectParams) -> Result<Box<dyn DbConnection>> {
        let options = Self::connect_options(params);

        let conn = PgConnection::connect_with(&options).await.map_err(|e| {
            tracing::error!(endpoint = %params.target(), error = %e, "Failed to open database connection");
            QaError::connection(params.target(), e)
        })?;

        Ok(Box::new(PgDbConnection { conn }))
    }
}

/// Open sqlx connection.
struct PgDbConnection {
    conn: PgConnection,
}

#[async_trait]
impl DbConnection for PgDbConnection {
    async fn diagnose(&mut self) -> std::result::Result<Diagnostic, StatementError> {
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| StatementError(e.to_string()))?;

        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(DIAGNOSTIC_QUERY)
            .fetch_one(&mut *tx)
            .await;

        // Read-only: nothing to commit. A failed rollback leaves the
        // connection unusable, which close() handles.
        if let Err(e) = tx.rollback().await {
            tracing::warn!(error = %e, "Rollback of diagnostic transaction failed");
        }

        let (user, database, server_time) = row.map_err(|e| StatementError(e.to_string()))?;

        Ok(Diagnostic {
            user,
            database,
            server_time,
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| QaError::Other(anyhow::anyhow!("closing connection: {}", e)))
    }
}
