//! Error types for QA session operations.

use thiserror::Error;

/// Result type alias using [`QaError`].
pub type Result<T> = std::result::Result<T, QaError>;

/// Errors that can occur while probing the QA instance.
///
/// Resolver failures never escape the session as errors (they are downgraded
/// to `None`); these variants surface from the backends themselves and from
/// [`Session::connect`](crate::Session::connect).
#[derive(Debug, Error)]
pub enum QaError {
    /// No instance with the target identifier in the directory listing.
    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    /// The instance record carries no usable endpoint.
    #[error("endpoint unavailable for instance: {0}")]
    EndpointUnavailable(String),

    /// The credentials secret could not be derived, fetched, or parsed.
    #[error("secret unresolvable: {0}")]
    SecretUnresolvable(String),

    /// Remote API call failed with context.
    #[error("{service}: {operation} {target}: {source}")]
    RemoteOperation {
        /// Service name (rds, secretsmanager)
        service: String,
        /// Operation name
        operation: String,
        /// Region, secret name, or other call target
        target: String,
        /// Underlying error
        #[source]
        source: Box<QaError>,
    },

    /// Opening the database connection failed (auth, network, TLS).
    #[error("connection to {target} failed: {source}")]
    Connection {
        /// `host:port/database`
        target: String,
        /// Driver error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration value could not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QaError {
    /// Wraps an underlying error with the service, operation, and target
    /// that produced it.
    ///
    /// # Example
    ///
    /// ```
    /// use rds_qa::QaError;
    ///
    /// let err = QaError::SecretUnresolvable("access denied".to_string());
    /// let wrapped = QaError::remote_op("secretsmanager", "get-secret-value", "qa-db", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "secretsmanager: get-secret-value qa-db: secret unresolvable: access denied"
    /// );
    /// ```
    pub fn remote_op(
        service: impl Into<String>,
        operation: impl Into<String>,
        target: impl Into<String>,
        err: QaError,
    ) -> Self {
        Self::RemoteOperation {
            service: service.into(),
            operation: operation.into(),
            target: target.into(),
            source: Box::new(err),
        }
    }

    /// Creates a connection error from any driver error.
    pub fn connection(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Connection {
            target: target.into(),
            source: source.into(),
        }
    }
}
