//! AWS backends: RDS instance directory and Secrets Manager.
//!
//! Both clients are built from one shared SDK configuration.
//!
//! # Requirements
//!
//! - AWS credentials configured via:
//!   - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//!   - Shared credentials file (`~/.aws/credentials`)
//!   - IAM instance role (for EC2/ECS)
//! - Permissions: `rds:DescribeDBInstances`, `secretsmanager:GetSecretValue`
//!   (plus `kms:Decrypt` on the secret's key for RDS-managed secrets)
//!
//! # Example
//!
//! ```no_run
//! use rds_qa::backends::aws::{load_sdk_config, AwsSecretStore, RdsDirectory};
//! use rds_qa::{Config, Directory};
//!
//! #[tokio::main]
//! async fn main() -> rds_qa::Result<()> {
//!     let config = Config::new().with_region("eu-central-1");
//!     let sdk_config = load_sdk_config(&config).await;
//!
//!     let directory = RdsDirectory::new(&sdk_config, config.region.clone());
//!     let _secrets = AwsSecretStore::new(&sdk_config);
//!
//!     for instance in directory.list_instances().await? {
//!         println!("{:?}", instance.identifier());
//!     }
//!     Ok(())
//! }
//! ```

mod directory;
mod secrets;

pub use directory::RdsDirectory;
pub use secrets::AwsSecretStore;

use crate::Config;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads the SDK configuration for the session's region.
///
/// Honours `config.endpoint_url` (for LocalStack testing).
pub async fn load_sdk_config(config: &Config) -> SdkConfig {
    let mut config_loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if let Some(ref endpoint) = config.endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    config_loader.load().await
}
