//! Traits for the remote collaborators of a QA session.
//!
//! A [`Session`](crate::Session) talks to three things it does not own: the
//! instance directory, the secret store, and the database driver. Each sits
//! behind a trait here so the session logic can run against the AWS/Postgres
//! implementations in production and the in-memory mocks in tests.

use crate::connection::{ConnectParams, Diagnostic, StatementError};
use crate::{InstanceRecord, Result};
use async_trait::async_trait;

/// Directory of database instances (the RDS `DescribeDBInstances` API).
///
/// Implementations return the full collection on every call; caching is the
/// session's job.
///
/// # Implementations
///
/// - [`RdsDirectory`](crate::backends::aws::RdsDirectory) (feature `aws`)
/// - [`MockDirectory`](crate::backends::mock::MockDirectory) (feature `mock`)
#[async_trait]
pub trait Directory: Send + Sync {
    /// Returns the directory name (e.g., "rds", "mock").
    fn name(&self) -> &str;

    /// Lists every instance visible in the configured region.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::RemoteOperation`](crate::QaError::RemoteOperation)
    /// when the listing call fails.
    async fn list_instances(&self) -> Result<Vec<InstanceRecord>>;
}

/// Name-addressed secret store (the Secrets Manager `GetSecretValue` API).
///
/// # Implementations
///
/// - [`AwsSecretStore`](crate::backends::aws::AwsSecretStore) (feature `aws`)
/// - [`MockSecretStore`](crate::backends::mock::MockSecretStore) (feature `mock`)
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the store name (e.g., "awssecrets", "mock").
    fn name(&self) -> &str;

    /// Fetches the raw secret string stored under `name`.
    ///
    /// # Errors
    ///
    /// - [`QaError::SecretUnresolvable`](crate::QaError::SecretUnresolvable):
    ///   the secret does not exist or has no string value
    /// - [`QaError::RemoteOperation`](crate::QaError::RemoteOperation):
    ///   access denied or any other service failure
    async fn get_secret_value(&self, name: &str) -> Result<String>;
}

/// Database driver entry point.
///
/// # Implementations
///
/// - [`PgConnector`](crate::backends::postgres::PgConnector) (feature `postgres`)
/// - [`MockConnector`](crate::backends::mock::MockConnector) (feature `mock`)
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the driver name (e.g., "postgres", "mock").
    fn name(&self) -> &str;

    /// Opens one connection with verify-full TLS.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Connection`](crate::QaError::Connection) for
    /// authentication, network, or certificate failures.
    async fn open(&self, params: &ConnectParams) -> Result<Box<dyn DbConnection>>;
}

/// One open database connection.
#[async_trait]
pub trait DbConnection: Send {
    /// Runs [`DIAGNOSTIC_QUERY`](crate::connection::DIAGNOSTIC_QUERY) inside a
    /// transaction.
    ///
    /// The transaction is rolled back and released before this returns, on
    /// both success and failure.
    async fn diagnose(&mut self) -> std::result::Result<Diagnostic, StatementError>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}
