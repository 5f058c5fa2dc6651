//! Mock backends for testing.
//!
//! In-memory implementations of [`Directory`], [`SecretStore`], and
//! [`Connector`] with call counters and error injection, so session behaviour
//! (caching, downgrading, connection sequencing) can be tested without AWS or
//! a database.
//!
//! Every mock is cheaply cloneable and clones share state: keep a clone as a
//! handle after boxing the original into a [`Session`](crate::Session).

use crate::connection::{ConnectParams, Diagnostic, StatementError};
use crate::*;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock instance directory.
///
/// # Example
///
/// ```
/// use rds_qa::backends::mock::MockDirectory;
/// use rds_qa::{Directory, InstanceRecord};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> rds_qa::Result<()> {
///     let directory = MockDirectory::new();
///     directory.add_instance(InstanceRecord::from_value(json!({
///         "DBInstanceIdentifier": "qa",
///     })).unwrap()).await;
///
///     assert_eq!(directory.list_instances().await?.len(), 1);
///
///     directory.set_error("throttled").await;
///     assert!(directory.list_instances().await.is_err());
///     assert_eq!(directory.calls(), 2);
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct MockDirectory {
    instances: Arc<RwLock<Vec<InstanceRecord>>>,
    error: Arc<RwLock<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instance to the listing.
    pub async fn add_instance(&self, record: InstanceRecord) {
        self.instances.write().await.push(record);
    }

    /// Makes every subsequent listing fail with `message`.
    pub async fn set_error(&self, message: impl Into<String>) {
        *self.error.write().await = Some(message.into());
    }

    /// Removes an injected error.
    pub async fn clear_error(&self) {
        *self.error.write().await = None;
    }

    /// Number of `list_instances` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Directory for MockDirectory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_instances(&self) -> Result<Vec<InstanceRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ref message) = *self.error.read().await {
            return Err(QaError::remote_op(
                "mock",
                "describe-db-instances",
                "mock-region",
                QaError::Other(anyhow::anyhow!("{}", message)),
            ));
        }

        Ok(self.instances.read().await.clone())
    }
}

/// Mock secret store.
#[derive(Clone, Default)]
pub struct MockSecretStore {
    secrets: Arc<RwLock<HashMap<String, String>>>,
    error: Arc<RwLock<Option<String>>>,
    calls: Arc<AtomicUsize>,
    requested: Arc<RwLock<Vec<String>>>,
}

impl MockSecretStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw secret string under `name`.
    pub async fn set_secret(&self, name: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().await.insert(name.into(), value.into());
    }

    /// Makes every subsequent fetch fail as access-denied with `message`.
    pub async fn set_error(&self, message: impl Into<String>) {
        *self.error.write().await = Some(message.into());
    }

    /// Number of `get_secret_value` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Secret names requested so far, in order.
    pub async fn requested(&self) -> Vec<String> {
        self.requested.read().await.clone()
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_secret_value(&self, name: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.write().await.push(name.to_string());

        if let Some(ref message) = *self.error.read().await {
            return Err(QaError::remote_op(
                "mock",
                "get-secret-value",
                name,
                QaError::Other(anyhow::anyhow!("{}", message)),
            ));
        }

        self.secrets
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| QaError::SecretUnresolvable(format!("{} not found", name)))
    }
}

/// Mock database driver.
///
/// Records every connection attempt and counts closes so tests can assert the
/// connection lifecycle.
#[derive(Clone, Default)]
pub struct MockConnector {
    /// Error returned from `open()` (auth, network, TLS stand-in)
    connect_error: Arc<RwLock<Option<String>>>,
    /// Error returned from the diagnostic statement
    statement_error: Arc<RwLock<Option<String>>>,
    opened: Arc<RwLock<Vec<ConnectParams>>>,
    closed: Arc<AtomicUsize>,
}

impl MockConnector {
    /// Creates a connector whose connections always succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `open()` fail with `message`.
    pub async fn set_connect_error(&self, message: impl Into<String>) {
        *self.connect_error.write().await = Some(message.into());
    }

    /// Makes the diagnostic statement fail with `message`.
    pub async fn set_statement_error(&self, message: impl Into<String>) {
        *self.statement_error.write().await = Some(message.into());
    }

    /// Parameters of every `open()` call so far, including failed ones.
    pub async fn opened(&self) -> Vec<ConnectParams> {
        self.opened.read().await.clone()
    }

    /// Number of connections closed so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(&self, params: &ConnectParams) -> Result<Box<dyn DbConnection>> {
        self.opened.write().await.push(params.clone());

        if let Some(ref message) = *self.connect_error.read().await {
            return Err(QaError::connection(params.target(), message.clone()));
        }

        Ok(Box::new(MockConnection {
            user: params.username.clone(),
            database: params.database.clone(),
            statement_error: self.statement_error.read().await.clone(),
            closed: Arc::clone(&self.closed),
        }))
    }
}

/// Connection handed out by [`MockConnector`].
pub struct MockConnection {
    user: String,
    database: String,
    statement_error: Option<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl DbConnection for MockConnection {
    async fn diagnose(&mut self) -> std::result::Result<Diagnostic, StatementError> {
        if let Some(ref message) = self.statement_error {
            return Err(StatementError(message.clone()));
        }

        Ok(Diagnostic {
            user: self.user.clone(),
            database: self.database.clone(),
            server_time: Utc::now(),
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
