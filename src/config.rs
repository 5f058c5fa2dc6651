//! Configuration for a QA session.

use crate::{QaError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Default target database name.
pub const DEFAULT_DATABASE: &str = "postgres";

/// Default AWS region holding the QA resources.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Identifier of the instance under test.
pub const DEFAULT_INSTANCE_IDENTIFIER: &str = "qa";

/// Configuration for creating a [`Session`](crate::Session).
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use rds_qa::Config;
/// use tracing::level_filters::LevelFilter;
///
/// let config = Config::new()
///     .with_database("app")
///     .with_region("us-west-2")
///     .with_log_level(LevelFilter::DEBUG);
///
/// assert_eq!(config.database, "app");
/// assert_eq!(config.instance_identifier, "qa");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Database to connect to (default: "postgres")
    pub database: String,

    /// AWS region of the instance (default: "eu-central-1")
    pub region: String,

    /// Default log level for the process-wide subscriber
    pub log_level: LevelFilter,

    /// `DBInstanceIdentifier` of the instance under test (default: "qa")
    pub instance_identifier: String,

    /// Custom AWS endpoint URL (for LocalStack testing)
    pub endpoint_url: Option<String>,

    /// PEM bundle used to verify the server certificate.
    ///
    /// RDS certificates chain to the RDS CA bundle rather than a public root,
    /// so a live run normally sets this.
    pub ssl_root_cert: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            region: DEFAULT_REGION.to_string(),
            log_level: LevelFilter::INFO,
            instance_identifier: DEFAULT_INSTANCE_IDENTIFIER.to_string(),
            endpoint_url: None,
            ssl_root_cert: None,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `RDS_QA_DATABASE` | `database` |
    /// | `AWS_REGION` | `region` |
    /// | `RDS_QA_LOG_LEVEL` | `log_level` (`off`, `error`, `warn`, `info`, `debug`, `trace`) |
    /// | `RDS_QA_INSTANCE` | `instance_identifier` |
    /// | `RDS_QA_ENDPOINT_URL` | `endpoint_url` |
    /// | `RDS_QA_SSL_ROOT_CERT` | `ssl_root_cert` |
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::InvalidConfig`] if `RDS_QA_LOG_LEVEL` is not a
    /// recognised level.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(database) = env::var("RDS_QA_DATABASE") {
            config = config.with_database(database);
        }
        if let Ok(region) = env::var("AWS_REGION") {
            config = config.with_region(region);
        }
        if let Ok(level) = env::var("RDS_QA_LOG_LEVEL") {
            config = config.with_log_level(parse_log_level(&level)?);
        }
        if let Ok(identifier) = env::var("RDS_QA_INSTANCE") {
            config = config.with_instance_identifier(identifier);
        }
        if let Ok(endpoint) = env::var("RDS_QA_ENDPOINT_URL") {
            config = config.with_endpoint_url(endpoint);
        }
        if let Ok(path) = env::var("RDS_QA_SSL_ROOT_CERT") {
            config = config.with_ssl_root_cert(path);
        }

        Ok(config)
    }

    /// Sets the target database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the default log level.
    ///
    /// `RUST_LOG` still takes precedence when it is set.
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Sets the identifier of the instance under test.
    pub fn with_instance_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.instance_identifier = identifier.into();
        self
    }

    /// Sets a custom AWS endpoint URL.
    pub fn with_endpoint_url(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint.into());
        self
    }

    /// Sets the CA bundle used for server certificate verification.
    pub fn with_ssl_root_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssl_root_cert = Some(path.into());
        self
    }
}

fn parse_log_level(value: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(value.trim())
        .map_err(|_| QaError::InvalidConfig(format!("unknown log level: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database, "postgres");
        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.log_level, LevelFilter::INFO);
        assert_eq!(config.instance_identifier, "qa");
        assert!(config.endpoint_url.is_none());
        assert!(config.ssl_root_cert.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_database("reporting")
            .with_region("us-west-2")
            .with_log_level(LevelFilter::WARN)
            .with_endpoint_url("http://localhost:4566")
            .with_ssl_root_cert("/etc/ssl/rds-global-bundle.pem");

        assert_eq!(config.database, "reporting");
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.log_level, LevelFilter::WARN);
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(
            config.ssl_root_cert,
            Some(PathBuf::from("/etc/ssl/rds-global-bundle.pem"))
        );
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_log_level(" WARN ").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::OFF);

        let err = parse_log_level("chatty").unwrap_err();
        assert!(err.to_string().contains("unknown log level"));
    }

    const ENV_VARS: [&str; 6] = [
        "RDS_QA_DATABASE",
        "AWS_REGION",
        "RDS_QA_LOG_LEVEL",
        "RDS_QA_INSTANCE",
        "RDS_QA_ENDPOINT_URL",
        "RDS_QA_SSL_ROOT_CERT",
    ];

    /// Runs `f` with the given variables set and every other QA variable
    /// unset, then restores the previous environment.
    fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let saved: Vec<(&str, Option<String>)> =
            ENV_VARS.iter().map(|k| (*k, env::var(k).ok())).collect();

        for key in ENV_VARS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let result = f();

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        result
    }

    // One test owns the process environment so parallel tests cannot race on it.
    #[test]
    fn test_from_env() {
        let config = with_env(&[], Config::from_env).unwrap();
        assert_eq!(config, Config::default());

        let config = with_env(
            &[
                ("RDS_QA_DATABASE", "reporting"),
                ("AWS_REGION", "us-east-1"),
                ("RDS_QA_LOG_LEVEL", "debug"),
                ("RDS_QA_INSTANCE", "qa-blue"),
                ("RDS_QA_ENDPOINT_URL", "http://localhost:4566"),
                ("RDS_QA_SSL_ROOT_CERT", "/etc/ssl/rds-global-bundle.pem"),
            ],
            Config::from_env,
        )
        .unwrap();

        assert_eq!(config.database, "reporting");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.log_level, LevelFilter::DEBUG);
        assert_eq!(config.instance_identifier, "qa-blue");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(
            config.ssl_root_cert,
            Some(PathBuf::from("/etc/ssl/rds-global-bundle.pem"))
        );

        let err = with_env(&[("RDS_QA_LOG_LEVEL", "chatty")], Config::from_env).unwrap_err();
        assert!(matches!(err, QaError::InvalidConfig(_)));
    }
}
