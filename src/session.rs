//! QA session: lazy remote lookups and the live connection check.
//!
//! A [`Session`] owns three cache slots (instance record, credentials secret,
//! endpoint), each filled on first successful use and never refreshed for the
//! rest of the run. Resolvers report failure as `None` and log the reason;
//! only [`Session::connect`] returns errors.

use crate::arn::secret_name_from_arn;
use crate::cache::Cached;
use crate::connection::{ConnectParams, DiagnosticOutcome};
use crate::{
    logging, Attributes, Config, Connector, Directory, EndpointInfo, InstanceRecord, QaError,
    Result, SecretPayload, SecretStore,
};
use tracing::{debug, error, info, warn};

/// Long-lived context for one QA run against a single instance.
///
/// Methods take `&mut self` because the first call to each resolver fills its
/// cache slot; a session is not meant to be shared between tasks.
///
/// # Example
///
/// ```
/// use rds_qa::backends::mock::{MockConnector, MockDirectory, MockSecretStore};
/// use rds_qa::{Config, InstanceRecord, Session};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> rds_qa::Result<()> {
///     let directory = MockDirectory::new();
///     directory.add_instance(InstanceRecord::from_value(json!({
///         "DBInstanceIdentifier": "qa",
///         "DBInstanceStatus": "available",
///     })).unwrap()).await;
///
///     let mut session = Session::new(
///         Config::new(),
///         Box::new(directory),
///         Box::new(MockSecretStore::new()),
///         Box::new(MockConnector::new()),
///     );
///
///     assert!(session.attributes().await.is_instance_available());
///     Ok(())
/// }
/// ```
pub struct Session {
    config: Config,
    directory: Box<dyn Directory>,
    secrets: Box<dyn SecretStore>,
    connector: Box<dyn Connector>,
    instance: Cached<InstanceRecord>,
    secret: Cached<SecretPayload>,
    endpoint: Cached<EndpointInfo>,
}

impl Session {
    /// Creates a session over the given collaborators.
    ///
    /// Installs the process-wide log subscriber at `config.log_level` if none
    /// is installed yet. No remote call is made until a resolver is used.
    pub fn new(
        config: Config,
        directory: Box<dyn Directory>,
        secrets: Box<dyn SecretStore>,
        connector: Box<dyn Connector>,
    ) -> Self {
        logging::init(config.log_level);

        debug!(
            instance = %config.instance_identifier,
            region = %config.region,
            database = %config.database,
            directory = directory.name(),
            secrets = secrets.name(),
            connector = connector.name(),
            "Created QA session"
        );

        Self {
            config,
            directory,
            secrets,
            connector,
            instance: Cached::Unresolved,
            secret: Cached::Unresolved,
            endpoint: Cached::Unresolved,
        }
    }

    /// Creates a session backed by RDS, Secrets Manager, and sqlx Postgres.
    ///
    /// AWS credentials come from the SDK default chain.
    #[cfg(all(feature = "aws", feature = "postgres"))]
    pub async fn from_config(config: Config) -> Self {
        use crate::backends::aws::{load_sdk_config, AwsSecretStore, RdsDirectory};
        use crate::backends::postgres::PgConnector;

        let sdk_config = load_sdk_config(&config).await;
        let directory = RdsDirectory::new(&sdk_config, config.region.clone());
        let secrets = AwsSecretStore::new(&sdk_config);

        Self::new(
            config,
            Box::new(directory),
            Box::new(secrets),
            Box::new(PgConnector::new()),
        )
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========================================================================
    // Instance Resolver
    // ========================================================================

    /// Returns the record of the target instance.
    ///
    /// The first successful lookup is cached; `None` means the instance is
    /// missing from the directory or the listing failed, and the next call
    /// will try again.
    pub async fn instance(&mut self) -> Option<&InstanceRecord> {
        if self.instance.needs_fetch() {
            self.instance = self.fetch_instance().await;
        }
        self.instance.get()
    }

    async fn fetch_instance(&self) -> Cached<InstanceRecord> {
        let target = &self.config.instance_identifier;
        info!(
            region = %self.config.region,
            instance = %target,
            directory = self.directory.name(),
            "Querying instance directory"
        );

        let instances = match self.directory.list_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(error = %e, "Instance directory query failed");
                return Cached::Failed(e.to_string());
            }
        };

        match instances
            .into_iter()
            .find(|record| record.identifier() == Some(target.as_str()))
        {
            Some(record) => {
                debug!(instance = %target, "Found target instance");
                Cached::Resolved(record)
            }
            None => {
                let err = QaError::InstanceNotFound(target.clone());
                warn!(error = %err, "Target instance missing from directory");
                Cached::Failed(err.to_string())
            }
        }
    }

    /// True if the target instance is present in the directory.
    pub async fn instance_exists(&mut self) -> bool {
        self.instance().await.is_some()
    }

    /// Returns a typed view over the instance record.
    ///
    /// Resolves the instance first; when that fails the view answers every
    /// accessor with its default.
    pub async fn attributes(&mut self) -> Attributes<'_> {
        Attributes::new(self.instance().await)
    }

    // ========================================================================
    // Secret Resolver
    // ========================================================================

    /// Derives the secret-store key from the instance's `MasterUserSecret.SecretArn`.
    pub async fn secret_name(&mut self) -> Option<String> {
        let arn = self.attributes().await.secret_arn()?.to_string();

        match secret_name_from_arn(&arn) {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(error = %e, "Cannot derive secret name from instance record");
                None
            }
        }
    }

    /// Returns the parsed credentials secret.
    ///
    /// Not-found, access-denied, and malformed secrets all yield `None`.
    pub async fn secret(&mut self) -> Option<&SecretPayload> {
        if self.secret.needs_fetch() {
            self.secret = self.fetch_secret().await;
        }
        self.secret.get()
    }

    async fn fetch_secret(&mut self) -> Cached<SecretPayload> {
        let Some(name) = self.secret_name().await else {
            return Cached::Failed("no usable secret reference on instance".to_string());
        };

        info!(secret = %name, store = self.secrets.name(), "Fetching database credentials");

        let payload = self
            .secrets
            .get_secret_value(&name)
            .await
            .and_then(|raw| SecretPayload::parse(&raw));

        match payload {
            Ok(payload) => Cached::Resolved(payload),
            Err(e) => {
                warn!(secret = %name, error = %e, "Credentials secret unavailable");
                match e {
                    QaError::SecretUnresolvable(reason) => Cached::Failed(reason),
                    other => Cached::Failed(other.to_string()),
                }
            }
        }
    }

    /// True if the credentials secret resolves.
    pub async fn secret_exists(&mut self) -> bool {
        self.secret().await.is_some()
    }

    // ========================================================================
    // Endpoint Resolver
    // ========================================================================

    /// Returns the instance's `{address, port}`.
    pub async fn endpoint(&mut self) -> Option<&EndpointInfo> {
        if self.endpoint.needs_fetch() {
            let identifier = self.config.instance_identifier.clone();
            self.endpoint = match self.instance().await.map(EndpointInfo::from_record) {
                Some(Some(endpoint)) => Cached::Resolved(endpoint),
                Some(None) => Cached::Failed(QaError::EndpointUnavailable(identifier).to_string()),
                None => Cached::Failed(QaError::InstanceNotFound(identifier).to_string()),
            };
        }
        self.endpoint.get()
    }

    // ========================================================================
    // Connection Orchestrator
    // ========================================================================

    /// Opens a verified TLS connection and runs the diagnostic query.
    ///
    /// The sequence is: resolve endpoint, resolve secret, open the connection,
    /// run [`DIAGNOSTIC_QUERY`](crate::connection::DIAGNOSTIC_QUERY) in a
    /// transaction, close the connection. The connection is closed whether or
    /// not the statement succeeds.
    ///
    /// # Errors
    ///
    /// - [`QaError::EndpointUnavailable`]: no endpoint; nothing was dialled
    /// - [`QaError::SecretUnresolvable`]: no credentials; nothing was dialled
    /// - [`QaError::Connection`]: authentication, network, or TLS failure
    ///
    /// A failing diagnostic statement is not an error: it is logged and
    /// reported as [`DiagnosticOutcome::StatementFailed`].
    pub async fn connect(&mut self) -> Result<DiagnosticOutcome> {
        let endpoint = self.endpoint().await.cloned().ok_or_else(|| {
            QaError::EndpointUnavailable(self.config.instance_identifier.clone())
        })?;

        let Some(secret) = self.secret().await.cloned() else {
            let reason = self
                .secret
                .failure()
                .unwrap_or("credentials not resolved")
                .to_string();
            return Err(QaError::SecretUnresolvable(reason));
        };

        let params = ConnectParams {
            host: endpoint.address,
            port: endpoint.port,
            database: self.config.database.clone(),
            username: secret.username,
            password: secret.password,
            ssl_root_cert: self.config.ssl_root_cert.clone(),
        };

        info!(
            endpoint = %params.target(),
            user = %params.username,
            connector = self.connector.name(),
            "Connecting to database"
        );

        let mut conn = self.connector.open(&params).await?;

        let outcome = match conn.diagnose().await {
            Ok(diagnostic) => {
                info!(
                    user = %diagnostic.user,
                    database = %diagnostic.database,
                    server_time = %diagnostic.server_time,
                    "Diagnostic query succeeded"
                );
                DiagnosticOutcome::Verified(diagnostic)
            }
            Err(e) => {
                error!(endpoint = %params.target(), error = %e, "Diagnostic query failed");
                DiagnosticOutcome::StatementFailed(e)
            }
        };

        if let Err(e) = conn.close().await {
            warn!(endpoint = %params.target(), error = %e, "Error while closing connection");
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("directory", &self.directory.name())
            .field("secrets", &self.secrets.name())
            .field("connector", &self.connector.name())
            .field("instance", &self.instance)
            .field("secret", &self.secret)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
