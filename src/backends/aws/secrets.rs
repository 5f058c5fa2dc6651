//! Secrets Manager secret store.

use crate::{QaError, Result, SecretStore};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;

/// AWS Secrets Manager secret store.
pub struct AwsSecretStore {
    client: Client,
}

impl AwsSecretStore {
    /// Creates a store from a loaded SDK configuration.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    fn name(&self) -> &str {
        "awssecrets"
    }

    async fn get_secret_value(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception());

                if not_found {
                    QaError::SecretUnresolvable(format!("{} not found", name))
                } else {
                    QaError::remote_op(
                        "secretsmanager",
                        "get-secret-value",
                        name,
                        QaError::Other(anyhow::anyhow!(
                            "{}",
                            aws_sdk_secretsmanager::error::DisplayErrorContext(&e)
                        )),
                    )
                }
            })?;

        response
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| QaError::SecretUnresolvable(format!("{} has no string value", name)))
    }
}
