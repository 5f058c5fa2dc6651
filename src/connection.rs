//! Connection parameters and diagnostic query results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The single read-only statement used to confirm a live, authenticated
/// connection.
pub const DIAGNOSTIC_QUERY: &str =
    "SELECT current_user::text, current_database()::text, current_timestamp";

/// Everything a [`Connector`](crate::Connector) needs to open one connection.
///
/// TLS with full certificate-chain and hostname verification is always
/// required; there is no way to downgrade it through these parameters.
#[derive(Clone, PartialEq)]
pub struct ConnectParams {
    /// Server host name
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database name
    pub database: String,
    /// Login user
    pub username: String,
    /// Login password
    pub password: String,
    /// CA bundle for server verification (system roots when `None`)
    pub ssl_root_cert: Option<PathBuf>,
}

impl ConnectParams {
    /// `host:port/database`, safe to log.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ssl_root_cert", &self.ssl_root_cert)
            .finish()
    }
}

/// Row returned by [`DIAGNOSTIC_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Authenticated user
    pub user: String,
    /// Connected database
    pub database: String,
    /// Server clock at execution time
    pub server_time: DateTime<Utc>,
}

/// The diagnostic statement failed after the connection was established.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("diagnostic statement failed: {0}")]
pub struct StatementError(pub String);

/// Result of a connection attempt that got as far as an open connection.
///
/// Connection-level failures are errors instead; this only distinguishes
/// "connected and verified" from "connected but the statement failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticOutcome {
    /// The diagnostic statement returned a row
    Verified(Diagnostic),
    /// The connection opened but the statement failed
    StatementFailed(StatementError),
}

impl DiagnosticOutcome {
    /// True if the diagnostic statement succeeded.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Returns the diagnostic row, if any.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Verified(d) => Some(d),
            Self::StatementFailed(_) => None,
        }
    }
}
