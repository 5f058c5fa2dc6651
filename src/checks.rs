//! QA assertions over the instance under test.
//!
//! [`Expectations`] lists the configuration the QA instance must have;
//! [`run_checks`] probes a [`Session`] and records one [`CheckOutcome`] per
//! enabled expectation. Checks never fail early: a missing instance simply
//! makes every check report its default value.

use crate::{Session, NOT_REPORTED};
use serde::Serialize;
use std::fmt;

/// Expected configuration of the QA instance.
///
/// `None` (or `false` for the presence checks) disables a check.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectations {
    /// Instance is present in the directory
    pub instance_exists: bool,
    /// `DBInstanceStatus` is `available`
    pub instance_available: bool,
    /// Credentials secret resolves
    pub secret_exists: bool,
    /// `MultiAZ`
    pub multi_az: Option<bool>,
    /// `StorageEncrypted`
    pub storage_encrypted: Option<bool>,
    /// `PubliclyAccessible`
    pub publicly_accessible: Option<bool>,
    /// `DeletionProtection`
    pub deletion_protection: Option<bool>,
    /// Every subnet in the subnet group is `Active`
    pub active_subnets: Option<bool>,
    /// `CACertificateIdentifier`
    pub certificate_ca: Option<String>,
    /// `MasterUsername`
    pub username: Option<String>,
    /// `StorageType`
    pub storage_type: Option<String>,
    /// `AllocatedStorage` in GiB
    pub storage_size: Option<i64>,
    /// `BackupRetentionPeriod` in days
    pub backup_retention_period: Option<i64>,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            instance_exists: true,
            instance_available: true,
            secret_exists: true,
            multi_az: Some(true),
            storage_encrypted: Some(true),
            publicly_accessible: None,
            deletion_protection: None,
            active_subnets: None,
            certificate_ca: Some("rds-ca-ecc384-g1".to_string()),
            username: Some("qa_user".to_string()),
            storage_type: Some("gp2".to_string()),
            storage_size: Some(5),
            backup_retention_period: Some(0),
        }
    }
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    /// Check name
    pub name: &'static str,
    /// Expected value, rendered
    pub expected: String,
    /// Observed value, rendered (`<absent>` when not reported)
    pub actual: String,
    /// Whether observed matched expected
    pub passed: bool,
}

impl CheckOutcome {
    fn compare<T: PartialEq + fmt::Debug>(name: &'static str, expected: T, actual: T) -> Self {
        Self {
            name,
            passed: expected == actual,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    fn text(name: &'static str, expected: &str, actual: Option<&str>) -> Self {
        Self {
            name,
            passed: Some(expected) == actual,
            expected: expected.to_string(),
            actual: actual.unwrap_or("<absent>").to_string(),
        }
    }

    fn number(name: &'static str, expected: i64, actual: i64) -> Self {
        Self {
            name,
            passed: expected == actual,
            expected: expected.to_string(),
            actual: if actual == NOT_REPORTED {
                "<absent>".to_string()
            } else {
                actual.to_string()
            },
        }
    }
}

/// Ordered results of [`run_checks`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// One entry per enabled check
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    /// True if every check passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// The checks that failed.
    pub fn failures(&self) -> Vec<&CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed).collect()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for o in &self.outcomes {
            let mark = if o.passed { "PASS" } else { "FAIL" };
            writeln!(
                f,
                "{} {}: expected {}, got {}",
                mark, o.name, o.expected, o.actual
            )?;
        }
        Ok(())
    }
}

/// Probes the session against `expected`.
///
/// # Example
///
/// ```
/// use rds_qa::backends::mock::{MockConnector, MockDirectory, MockSecretStore};
/// use rds_qa::checks::{run_checks, Expectations};
/// use rds_qa::{Config, Session};
///
/// #[tokio::main]
/// async fn main() {
///     let mut session = Session::new(
///         Config::new(),
///         Box::new(MockDirectory::new()),
///         Box::new(MockSecretStore::new()),
///         Box::new(MockConnector::new()),
///     );
///
///     let report = run_checks(&mut session, &Expectations::default()).await;
///     assert!(!report.passed());
///     assert_eq!(report.failures()[0].name, "instance_exists");
/// }
/// ```
pub async fn run_checks(session: &mut Session, expected: &Expectations) -> CheckReport {
    let mut outcomes = Vec::new();

    {
        let attrs = session.attributes().await;

        if expected.instance_exists {
            outcomes.push(CheckOutcome::compare("instance_exists", true, attrs.instance_exists()));
        }
        if expected.instance_available {
            outcomes.push(CheckOutcome::text(
                "instance_available",
                "available",
                attrs.status(),
            ));
        }
        if let Some(want) = expected.multi_az {
            outcomes.push(CheckOutcome::compare("multi_az", want, attrs.is_multi_az()));
        }
        if let Some(want) = expected.storage_encrypted {
            outcomes.push(CheckOutcome::compare(
                "storage_encrypted",
                want,
                attrs.is_storage_encrypted(),
            ));
        }
        if let Some(want) = expected.publicly_accessible {
            outcomes.push(CheckOutcome::compare(
                "publicly_accessible",
                want,
                attrs.is_publicly_accessible(),
            ));
        }
        if let Some(want) = expected.deletion_protection {
            outcomes.push(CheckOutcome::compare(
                "deletion_protection",
                want,
                attrs.is_delete_protected(),
            ));
        }
        if let Some(want) = expected.active_subnets {
            outcomes.push(CheckOutcome::compare(
                "active_subnets",
                want,
                attrs.has_active_subnets(),
            ));
        }
        if let Some(ref want) = expected.certificate_ca {
            outcomes.push(CheckOutcome::text("certificate_ca", want, attrs.certificate_ca()));
        }
        if let Some(ref want) = expected.username {
            outcomes.push(CheckOutcome::text("username", want, attrs.username()));
        }
        if let Some(ref want) = expected.storage_type {
            outcomes.push(CheckOutcome::text("storage_type", want, attrs.storage_type()));
        }
        if let Some(want) = expected.storage_size {
            outcomes.push(CheckOutcome::number("storage_size", want, attrs.storage_size()));
        }
        if let Some(want) = expected.backup_retention_period {
            outcomes.push(CheckOutcome::number(
                "backup_retention_period",
                want,
                attrs.backup_retention_period(),
            ));
        }
    }

    if expected.secret_exists {
        outcomes.push(CheckOutcome::compare("secret_exists", true, session.secret_exists().await));
    }

    let report = CheckReport { outcomes };
    for failure in report.failures() {
        tracing::warn!(
            check = failure.name,
            expected = %failure.expected,
            actual = %failure.actual,
            "QA check failed"
        );
    }
    report
}
