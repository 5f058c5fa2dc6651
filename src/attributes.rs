//! Read-only projections over an instance record.
//!
//! Every accessor is total: when the instance could not be resolved, or a key
//! is missing, the accessor returns its documented default instead of failing.
//! This lets a caller probe many properties of a possibly-unavailable instance
//! without guarding each call.
//!
//! | Kind | Missing key yields |
//! |------|--------------------|
//! | flag (`is_*`) | `false` (only a literal `true` counts) |
//! | scalar | `None` |
//! | numeric | [`NOT_REPORTED`] |
//! | list | empty `Vec` |

use crate::InstanceRecord;
use serde_json::Value;

/// Sentinel for a numeric attribute the directory did not report.
///
/// Distinct from a legitimately reported zero.
pub const NOT_REPORTED: i64 = -1;

/// Status the directory reports for a ready instance.
const STATUS_AVAILABLE: &str = "available";

/// Status every subnet must report for [`Attributes::has_active_subnets`].
const SUBNET_ACTIVE: &str = "Active";

/// Typed view over an optional [`InstanceRecord`].
///
/// Obtained from [`Session::attributes`](crate::Session::attributes), or built
/// directly over any record:
///
/// ```
/// use rds_qa::{Attributes, InstanceRecord};
/// use serde_json::json;
///
/// let record = InstanceRecord::from_value(json!({
///     "DBInstanceIdentifier": "qa",
///     "StorageEncrypted": true,
/// })).unwrap();
///
/// let attrs = Attributes::new(Some(&record));
/// assert!(attrs.is_storage_encrypted());
/// assert_eq!(attrs.storage_size(), -1);
///
/// let absent = Attributes::new(None);
/// assert!(!absent.is_storage_encrypted());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Attributes<'a> {
    record: Option<&'a InstanceRecord>,
}

impl<'a> Attributes<'a> {
    /// Creates a view. `None` stands for an instance that could not be resolved.
    pub fn new(record: Option<&'a InstanceRecord>) -> Self {
        Self { record }
    }

    fn value(&self, path: &[&str]) -> Option<&'a Value> {
        self.record?.lookup(path)
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.value(&[key]), Some(Value::Bool(true)))
    }

    fn text(&self, key: &str) -> Option<&'a str> {
        self.value(&[key])?.as_str()
    }

    fn number(&self, key: &str) -> i64 {
        self.value(&[key])
            .and_then(Value::as_i64)
            .unwrap_or(NOT_REPORTED)
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// True if the target instance was found.
    pub fn instance_exists(&self) -> bool {
        self.record.is_some()
    }

    /// `DBInstanceStatus`
    pub fn status(&self) -> Option<&'a str> {
        self.text("DBInstanceStatus")
    }

    /// True if `DBInstanceStatus` is `available`.
    pub fn is_instance_available(&self) -> bool {
        self.status() == Some(STATUS_AVAILABLE)
    }

    // ========================================================================
    // Flags
    // ========================================================================

    /// `StorageEncrypted`
    pub fn is_storage_encrypted(&self) -> bool {
        self.flag("StorageEncrypted")
    }

    /// `MultiAZ`
    pub fn is_multi_az(&self) -> bool {
        self.flag("MultiAZ")
    }

    /// `PubliclyAccessible`
    pub fn is_publicly_accessible(&self) -> bool {
        self.flag("PubliclyAccessible")
    }

    /// `IAMDatabaseAuthenticationEnabled`
    pub fn is_iam_auth_enabled(&self) -> bool {
        self.flag("IAMDatabaseAuthenticationEnabled")
    }

    /// `DeletionProtection`
    pub fn is_delete_protected(&self) -> bool {
        self.flag("DeletionProtection")
    }

    /// `PerformanceInsightsEnabled`
    pub fn is_performance_insights_enabled(&self) -> bool {
        self.flag("PerformanceInsightsEnabled")
    }

    /// `AutoMinorVersionUpgrade`
    pub fn is_auto_minor_version_upgrade(&self) -> bool {
        self.flag("AutoMinorVersionUpgrade")
    }

    /// `DedicatedLogVolume`
    pub fn is_dedicated_log_volume(&self) -> bool {
        self.flag("DedicatedLogVolume")
    }

    /// `CustomerOwnedIpEnabled`
    pub fn is_customer_owned_ip_enabled(&self) -> bool {
        self.flag("CustomerOwnedIpEnabled")
    }

    /// `IsStorageConfigUpgradeAvailable`
    pub fn is_storage_upgrade_available(&self) -> bool {
        self.flag("IsStorageConfigUpgradeAvailable")
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    /// `MasterUsername`
    pub fn username(&self) -> Option<&'a str> {
        self.text("MasterUsername")
    }

    /// `StorageType` (gp2, gp3, io1, ...)
    pub fn storage_type(&self) -> Option<&'a str> {
        self.text("StorageType")
    }

    /// `Engine`
    pub fn engine(&self) -> Option<&'a str> {
        self.text("Engine")
    }

    /// `EngineVersion`
    pub fn engine_version(&self) -> Option<&'a str> {
        self.text("EngineVersion")
    }

    /// `DBName`
    pub fn database_name(&self) -> Option<&'a str> {
        self.text("DBName")
    }

    /// `DBInstanceClass`
    pub fn instance_class(&self) -> Option<&'a str> {
        self.text("DBInstanceClass")
    }

    /// `PreferredMaintenanceWindow`
    pub fn maintenance_window(&self) -> Option<&'a str> {
        self.text("PreferredMaintenanceWindow")
    }

    /// `PreferredBackupWindow`
    pub fn backup_window(&self) -> Option<&'a str> {
        self.text("PreferredBackupWindow")
    }

    /// `CACertificateIdentifier`
    pub fn certificate_ca(&self) -> Option<&'a str> {
        self.text("CACertificateIdentifier")
    }

    /// `MasterUserSecret.SecretArn`
    pub fn secret_arn(&self) -> Option<&'a str> {
        self.value(&["MasterUserSecret", "SecretArn"])?.as_str()
    }

    // ========================================================================
    // Numerics
    // ========================================================================

    /// `AllocatedStorage` in GiB, or [`NOT_REPORTED`].
    pub fn storage_size(&self) -> i64 {
        self.number("AllocatedStorage")
    }

    /// `BackupRetentionPeriod` in days, or [`NOT_REPORTED`].
    pub fn backup_retention_period(&self) -> i64 {
        self.number("BackupRetentionPeriod")
    }

    /// `PerformanceInsightsRetentionPeriod` in days, or [`NOT_REPORTED`].
    pub fn performance_insights_retention_period(&self) -> i64 {
        self.number("PerformanceInsightsRetentionPeriod")
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// `EnabledCloudwatchLogsExports`
    pub fn cloudwatch_log_exports(&self) -> Vec<String> {
        self.value(&["EnabledCloudwatchLogsExports"])
            .and_then(Value::as_array)
            .map(|exports| {
                exports
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Derived
    // ========================================================================

    /// True if the instance has a subnet group and every subnet in it reports
    /// `Active`.
    ///
    /// An empty (or unreported) subnet list is vacuously active.
    pub fn has_active_subnets(&self) -> bool {
        let Some(group) = self.value(&["DBSubnetGroup"]).and_then(Value::as_object) else {
            return false;
        };

        match group.get("Subnets") {
            None | Some(Value::Null) => true,
            Some(Value::Array(subnets)) => subnets.iter().all(|subnet| {
                subnet.get("SubnetStatus").and_then(Value::as_str) == Some(SUBNET_ACTIVE)
            }),
            Some(_) => false,
        }
    }
}
