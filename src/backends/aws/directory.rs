//! RDS instance directory.

use crate::{Directory, InstanceRecord, QaError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rds::types::{DbInstance, DbSubnetGroup};
use aws_sdk_rds::Client;
use serde_json::{json, Map, Value};
use std::future::Future;

/// RDS `DescribeDBInstances` directory.
///
/// Follows the `Marker` cursor so every page of the listing is returned.
pub struct RdsDirectory {
    client: Client,
    region: String,
}

impl RdsDirectory {
    /// Creates a directory from a loaded SDK configuration.
    pub fn new(sdk_config: &SdkConfig, region: String) -> Self {
        Self {
            client: Client::new(sdk_config),
            region,
        }
    }
}

#[async_trait]
impl Directory for RdsDirectory {
    fn name(&self) -> &str {
        "rds"
    }

    async fn list_instances(&self) -> Result<Vec<InstanceRecord>> {
        let client = &self.client;
        let region = self.region.as_str();

        collect_pages(|marker| async move {
            let response = client
                .describe_db_instances()
                .set_marker(marker)
                .send()
                .await
                .map_err(|e| {
                    QaError::remote_op(
                        "rds",
                        "describe-db-instances",
                        region,
                        QaError::Other(anyhow::anyhow!(
                            "{}",
                            aws_sdk_rds::error::DisplayErrorContext(&e)
                        )),
                    )
                })?;

            let records = response.db_instances().iter().map(to_record).collect();
            Ok((records, response.marker().map(str::to_string)))
        })
        .await
    }
}

/// Drains a `Marker`-paginated listing.
///
/// `fetch` receives the cursor of the page to load (`None` for the first
/// page) and returns that page's items plus the next cursor. Stops at the
/// first page without a cursor; an empty cursor also ends the listing.
async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>>,
{
    let mut items = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let (page, next) = fetch(marker).await?;
        items.extend(page);

        marker = next.filter(|m| !m.is_empty());
        if marker.is_none() {
            break;
        }
    }

    Ok(items)
}

/// Inserts `value` under `key` when present.
fn put<V: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<V>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.into());
    }
}

/// Converts an SDK instance into the directory's key/value shape.
///
/// Only fields the SDK actually reported are written, so a missing field
/// stays distinguishable from a false or zero one.
fn to_record(db: &DbInstance) -> InstanceRecord {
    let mut map = Map::new();

    put(&mut map, "DBInstanceIdentifier", db.db_instance_identifier());
    put(&mut map, "DBInstanceArn", db.db_instance_arn());
    put(&mut map, "DBInstanceClass", db.db_instance_class());
    put(&mut map, "DBInstanceStatus", db.db_instance_status());
    put(&mut map, "Engine", db.engine());
    put(&mut map, "EngineVersion", db.engine_version());
    put(&mut map, "DBName", db.db_name());
    put(&mut map, "MasterUsername", db.master_username());

    put(&mut map, "AllocatedStorage", db.allocated_storage());
    put(&mut map, "StorageType", db.storage_type());
    put(&mut map, "StorageEncrypted", db.storage_encrypted());
    put(&mut map, "KmsKeyId", db.kms_key_id());
    put(&mut map, "DedicatedLogVolume", db.dedicated_log_volume());
    put(
        &mut map,
        "IsStorageConfigUpgradeAvailable",
        db.is_storage_config_upgrade_available(),
    );

    put(&mut map, "BackupRetentionPeriod", db.backup_retention_period());
    put(&mut map, "PreferredBackupWindow", db.preferred_backup_window());
    put(
        &mut map,
        "PreferredMaintenanceWindow",
        db.preferred_maintenance_window(),
    );
    put(&mut map, "AutoMinorVersionUpgrade", db.auto_minor_version_upgrade());
    put(&mut map, "DeletionProtection", db.deletion_protection());

    put(&mut map, "MultiAZ", db.multi_az());
    put(&mut map, "PubliclyAccessible", db.publicly_accessible());
    put(&mut map, "CustomerOwnedIpEnabled", db.customer_owned_ip_enabled());
    put(
        &mut map,
        "IAMDatabaseAuthenticationEnabled",
        db.iam_database_authentication_enabled(),
    );
    put(&mut map, "CACertificateIdentifier", db.ca_certificate_identifier());

    put(
        &mut map,
        "PerformanceInsightsEnabled",
        db.performance_insights_enabled(),
    );
    put(
        &mut map,
        "PerformanceInsightsRetentionPeriod",
        db.performance_insights_retention_period(),
    );
    map.insert(
        "EnabledCloudwatchLogsExports".to_string(),
        json!(db.enabled_cloudwatch_logs_exports()),
    );

    if let Some(endpoint) = db.endpoint() {
        let mut ep = Map::new();
        put(&mut ep, "Address", endpoint.address());
        put(&mut ep, "Port", endpoint.port());
        put(&mut ep, "HostedZoneId", endpoint.hosted_zone_id());
        map.insert("Endpoint".to_string(), Value::Object(ep));
    }

    if let Some(secret) = db.master_user_secret() {
        let mut ms = Map::new();
        put(&mut ms, "SecretArn", secret.secret_arn());
        put(&mut ms, "SecretStatus", secret.secret_status());
        put(&mut ms, "KmsKeyId", secret.kms_key_id());
        map.insert("MasterUserSecret".to_string(), Value::Object(ms));
    }

    if let Some(group) = db.db_subnet_group() {
        map.insert("DBSubnetGroup".to_string(), subnet_group(group));
    }

    InstanceRecord::from(map)
}

fn subnet_group(group: &DbSubnetGroup) -> Value {
    let subnets: Vec<Value> = group
        .subnets()
        .iter()
        .map(|subnet| {
            let mut s = Map::new();
            put(&mut s, "SubnetIdentifier", subnet.subnet_identifier());
            put(&mut s, "SubnetStatus", subnet.subnet_status());
            if let Some(az) = subnet.subnet_availability_zone().and_then(|az| az.name()) {
                s.insert("SubnetAvailabilityZone".to_string(), json!({ "Name": az }));
            }
            Value::Object(s)
        })
        .collect();

    let mut g = Map::new();
    put(&mut g, "DBSubnetGroupName", group.db_subnet_group_name());
    put(&mut g, "VpcId", group.vpc_id());
    put(&mut g, "SubnetGroupStatus", group.subnet_group_status());
    g.insert("Subnets".to_string(), Value::Array(subnets));
    Value::Object(g)
}
