//! Session behaviour tests over the in-memory backends.
//!
//! Run with:
//!   cargo test --test session

#![cfg(feature = "mock")]

use rds_qa::backends::mock::{MockConnector, MockDirectory, MockSecretStore};
use rds_qa::checks::{run_checks, Expectations};
use rds_qa::{Config, DiagnosticOutcome, InstanceRecord, QaError, Session, NOT_REPORTED};
use serde_json::{json, Value};

const SECRET_ARN: &str =
    "arn:aws:secretsmanager:eu-central-1:123456789012:secret:qa-db-secret-abc123";
const SECRET_NAME: &str = "qa-db-secret";
const SECRET_VALUE: &str = r#"{"username":"qa_user","password":"s3cret"}"#;

struct Harness {
    directory: MockDirectory,
    secrets: MockSecretStore,
    connector: MockConnector,
}

impl Harness {
    fn new() -> Self {
        Self {
            directory: MockDirectory::new(),
            secrets: MockSecretStore::new(),
            connector: MockConnector::new(),
        }
    }

    /// A harness whose directory holds a complete QA instance and whose
    /// secret store holds its credentials.
    async fn complete() -> Self {
        let harness = Self::new();
        harness.add(qa_instance()).await;
        harness.secrets.set_secret(SECRET_NAME, SECRET_VALUE).await;
        harness
    }

    async fn add(&self, value: Value) {
        self.directory
            .add_instance(InstanceRecord::from_value(value).expect("object"))
            .await;
    }

    fn session(&self) -> Session {
        self.session_with(Config::new())
    }

    fn session_with(&self, config: Config) -> Session {
        Session::new(
            config,
            Box::new(self.directory.clone()),
            Box::new(self.secrets.clone()),
            Box::new(self.connector.clone()),
        )
    }
}

fn qa_instance() -> Value {
    json!({
        "DBInstanceIdentifier": "qa",
        "DBInstanceStatus": "available",
        "MasterUsername": "qa_user",
        "AllocatedStorage": 5,
        "StorageType": "gp2",
        "StorageEncrypted": true,
        "MultiAZ": true,
        "BackupRetentionPeriod": 0,
        "CACertificateIdentifier": "rds-ca-ecc384-g1",
        "Endpoint": {"Address": "qa.abc.eu-central-1.rds.amazonaws.com", "Port": 5432},
        "MasterUserSecret": {"SecretArn": SECRET_ARN, "SecretStatus": "active"},
        "DBSubnetGroup": {"Subnets": [{"SubnetStatus": "Active"}]}
    })
}

// ============================================================================
// Instance Resolver
// ============================================================================

#[tokio::test]
async fn test_instance_is_matched_by_identifier() {
    let harness = Harness::new();
    harness.add(json!({"DBInstanceIdentifier": "staging"})).await;
    harness.add(json!({"DBInstanceIdentifier": "qa", "Engine": "postgres"})).await;
    harness.add(json!({"Engine": "mysql"})).await;

    let mut session = harness.session();
    let record = session.instance().await.expect("qa instance");

    assert_eq!(record.identifier(), Some("qa"));
    assert_eq!(session.attributes().await.engine(), Some("postgres"));
}

#[tokio::test]
async fn test_instance_is_fetched_once() {
    let harness = Harness::complete().await;
    let mut session = harness.session();

    let first = session.instance().await.cloned();
    let second = session.instance().await.cloned();
    assert!(session.instance_exists().await);

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(harness.directory.calls(), 1);
}

#[tokio::test]
async fn test_cache_ignores_later_directory_changes() {
    let harness = Harness::new();
    harness
        .add(json!({"DBInstanceIdentifier": "qa", "DBInstanceStatus": "creating"}))
        .await;

    let mut session = harness.session();
    assert!(!session.attributes().await.is_instance_available());

    harness.directory.set_error("listing now fails").await;
    assert_eq!(session.attributes().await.status(), Some("creating"));
    assert_eq!(harness.directory.calls(), 1);
}

#[tokio::test]
async fn test_missing_instance_is_absent_and_retried() {
    let harness = Harness::new();
    harness.add(json!({"DBInstanceIdentifier": "staging"})).await;

    let mut session = harness.session();
    assert!(session.instance().await.is_none());
    assert!(!session.instance_exists().await);
    assert_eq!(harness.directory.calls(), 2);

    harness.add(json!({"DBInstanceIdentifier": "qa"})).await;
    assert!(session.instance_exists().await);
    assert_eq!(harness.directory.calls(), 3);

    session.instance().await;
    assert_eq!(harness.directory.calls(), 3);
}

#[tokio::test]
async fn test_directory_failure_is_absent() {
    let harness = Harness::complete().await;
    harness.directory.set_error("AccessDenied").await;

    let mut session = harness.session();
    assert!(session.instance().await.is_none());

    harness.directory.clear_error().await;
    assert!(session.instance().await.is_some());
}

#[tokio::test]
async fn test_custom_instance_identifier() {
    let harness = Harness::complete().await;
    harness.add(json!({"DBInstanceIdentifier": "qa-blue", "StorageType": "io1"})).await;

    let mut session = harness.session_with(Config::new().with_instance_identifier("qa-blue"));
    assert_eq!(session.attributes().await.storage_type(), Some("io1"));
}

// ============================================================================
// Attribute Accessors
// ============================================================================

#[tokio::test]
async fn test_accessors_on_unresolved_instance_use_defaults() {
    let harness = Harness::new();
    harness.directory.set_error("unreachable").await;
    let mut session = harness.session();

    let attrs = session.attributes().await;
    assert!(!attrs.instance_exists());
    assert!(!attrs.is_instance_available());
    assert!(!attrs.is_storage_encrypted());
    assert!(!attrs.is_multi_az());
    assert!(!attrs.has_active_subnets());
    assert_eq!(attrs.username(), None);
    assert_eq!(attrs.storage_type(), None);
    assert_eq!(attrs.storage_size(), NOT_REPORTED);
    assert_eq!(attrs.backup_retention_period(), NOT_REPORTED);
    assert!(attrs.cloudwatch_log_exports().is_empty());
}

#[tokio::test]
async fn test_end_to_end_attributes() {
    let harness = Harness::new();
    harness
        .add(json!({
            "DBInstanceIdentifier": "qa",
            "DBInstanceStatus": "available",
            "StorageEncrypted": true,
            "AllocatedStorage": 20,
            "StorageType": "gp3",
            "MultiAZ": true
        }))
        .await;

    let mut session = harness.session();
    let attrs = session.attributes().await;

    assert!(attrs.is_instance_available());
    assert!(attrs.is_storage_encrypted());
    assert_eq!(attrs.storage_size(), 20);
    assert_eq!(attrs.storage_type(), Some("gp3"));
    assert!(attrs.is_multi_az());
}

// ============================================================================
// Secret Resolver
// ============================================================================

#[tokio::test]
async fn test_secret_name_is_derived_from_arn() {
    let harness = Harness::complete().await;
    let mut session = harness.session();

    assert_eq!(session.secret_name().await.as_deref(), Some(SECRET_NAME));
}

#[tokio::test]
async fn test_secret_is_fetched_once() {
    let harness = Harness::complete().await;
    let mut session = harness.session();

    let first = session.secret().await.cloned().expect("secret");
    let second = session.secret().await.cloned().expect("secret");
    assert!(session.secret_exists().await);

    assert_eq!(first, second);
    assert_eq!(first.username, "qa_user");
    assert_eq!(harness.secrets.calls(), 1);
    assert_eq!(harness.secrets.requested().await, vec![SECRET_NAME]);
}

#[tokio::test]
async fn test_malformed_arn_yields_no_secret() {
    let harness = Harness::new();
    harness
        .add(json!({
            "DBInstanceIdentifier": "qa",
            "MasterUserSecret": {"SecretArn": "arn:aws:secretsmanager:eu-central-1"}
        }))
        .await;

    let mut session = harness.session();
    assert!(session.secret_name().await.is_none());
    assert!(session.secret().await.is_none());
    assert_eq!(harness.secrets.calls(), 0);
}

#[tokio::test]
async fn test_secret_store_denial_yields_no_secret() {
    let harness = Harness::complete().await;
    harness.secrets.set_error("AccessDeniedException").await;

    let mut session = harness.session();
    assert!(!session.secret_exists().await);
}

#[tokio::test]
async fn test_unparsable_secret_yields_no_secret() {
    let harness = Harness::new();
    harness.add(qa_instance()).await;
    harness.secrets.set_secret(SECRET_NAME, "not json").await;

    let mut session = harness.session();
    assert!(session.secret().await.is_none());
}

// ============================================================================
// Endpoint Resolver
// ============================================================================

#[tokio::test]
async fn test_endpoint_is_cached() {
    let harness = Harness::complete().await;
    let mut session = harness.session();

    let endpoint = session.endpoint().await.cloned().expect("endpoint");
    assert_eq!(endpoint.address, "qa.abc.eu-central-1.rds.amazonaws.com");
    assert_eq!(endpoint.port, 5432);

    assert_eq!(session.endpoint().await, Some(&endpoint));
    assert_eq!(harness.directory.calls(), 1);
}

#[tokio::test]
async fn test_endpoint_without_port_is_absent() {
    let harness = Harness::new();
    harness
        .add(json!({"DBInstanceIdentifier": "qa", "Endpoint": {"Address": "db.local"}}))
        .await;

    let mut session = harness.session();
    assert!(session.endpoint().await.is_none());
}

// ============================================================================
// Connection Orchestrator
// ============================================================================

#[tokio::test]
async fn test_connect_verifies_and_closes() {
    let harness = Harness::complete().await;
    let mut session = harness.session_with(Config::new().with_database("app"));

    let outcome = session.connect().await.expect("connect");
    let diagnostic = outcome.diagnostic().expect("diagnostic row");
    assert_eq!(diagnostic.user, "qa_user");
    assert_eq!(diagnostic.database, "app");

    let opened = harness.connector.opened().await;
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].host, "qa.abc.eu-central-1.rds.amazonaws.com");
    assert_eq!(opened[0].port, 5432);
    assert_eq!(opened[0].database, "app");
    assert_eq!(opened[0].username, "qa_user");
    assert_eq!(opened[0].password, "s3cret");
    assert_eq!(harness.connector.closed(), 1);
}

#[tokio::test]
async fn test_connect_passes_root_cert() {
    let harness = Harness::complete().await;
    let mut session =
        harness.session_with(Config::new().with_ssl_root_cert("/etc/ssl/rds-global-bundle.pem"));

    session.connect().await.expect("connect");

    let opened = harness.connector.opened().await;
    assert_eq!(
        opened[0].ssl_root_cert.as_deref(),
        Some(std::path::Path::new("/etc/ssl/rds-global-bundle.pem"))
    );
}

#[tokio::test]
async fn test_statement_failure_is_reported_and_connection_closed() {
    let harness = Harness::complete().await;
    harness
        .connector
        .set_statement_error("permission denied for function now")
        .await;

    let mut session = harness.session();
    let outcome = session.connect().await.expect("connection itself succeeds");

    match outcome {
        DiagnosticOutcome::StatementFailed(e) => assert!(e.to_string().contains("permission denied")),
        other => panic!("expected statement failure, got {:?}", other),
    }
    assert_eq!(harness.connector.closed(), 1);
}

#[tokio::test]
async fn test_connection_failure_propagates() {
    let harness = Harness::complete().await;
    harness
        .connector
        .set_connect_error("certificate verify failed")
        .await;

    let mut session = harness.session();
    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, QaError::Connection { .. }));
    assert!(err.to_string().contains("certificate verify failed"));
    assert_eq!(harness.connector.closed(), 0);
}

#[tokio::test]
async fn test_connect_without_secret_never_dials() {
    let harness = Harness::new();
    harness.add(qa_instance()).await;

    let mut session = harness.session();
    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, QaError::SecretUnresolvable(_)));
    assert!(harness.connector.opened().await.is_empty());
}

#[tokio::test]
async fn test_connect_with_empty_credentials_never_dials() {
    let harness = Harness::new();
    harness.add(qa_instance()).await;
    harness
        .secrets
        .set_secret(SECRET_NAME, r#"{"username":"","password":""}"#)
        .await;

    let mut session = harness.session();
    assert!(!session.secret_exists().await);

    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, QaError::SecretUnresolvable(_)));
    assert!(err.to_string().contains("empty username"));
    assert!(harness.connector.opened().await.is_empty());
}

#[tokio::test]
async fn test_connect_without_instance_never_dials() {
    let harness = Harness::new();
    let mut session = harness.session();

    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, QaError::EndpointUnavailable(_)));
    assert!(harness.connector.opened().await.is_empty());
    assert_eq!(harness.secrets.calls(), 0);
}

#[tokio::test]
async fn test_repeated_connect_reuses_caches() {
    let harness = Harness::complete().await;
    let mut session = harness.session();

    session.connect().await.expect("first connect");
    session.connect().await.expect("second connect");

    assert_eq!(harness.directory.calls(), 1);
    assert_eq!(harness.secrets.calls(), 1);
    assert_eq!(harness.connector.opened().await.len(), 2);
    assert_eq!(harness.connector.closed(), 2);
}

// ============================================================================
// Checks
// ============================================================================

#[tokio::test]
async fn test_checks_pass_for_expected_instance() {
    let harness = Harness::complete().await;
    let mut session = harness.session();

    let expected = Expectations {
        active_subnets: Some(true),
        publicly_accessible: Some(false),
        ..Expectations::default()
    };
    let report = run_checks(&mut session, &expected).await;

    assert!(report.passed(), "unexpected failures:\n{}", report);
    assert_eq!(harness.directory.calls(), 1);
}

#[tokio::test]
async fn test_checks_report_mismatches() {
    let harness = Harness::new();
    harness
        .add(json!({
            "DBInstanceIdentifier": "qa",
            "DBInstanceStatus": "available",
            "StorageType": "gp3",
            "AllocatedStorage": 20
        }))
        .await;

    let mut session = harness.session();
    let report = run_checks(&mut session, &Expectations::default()).await;

    let failed: Vec<&str> = report.failures().iter().map(|o| o.name).collect();
    assert!(failed.contains(&"storage_type"));
    assert!(failed.contains(&"storage_size"));
    assert!(failed.contains(&"backup_retention_period"));
    assert!(failed.contains(&"secret_exists"));
    assert!(!failed.contains(&"instance_exists"));
    assert!(!failed.contains(&"instance_available"));
}
