//! Database credentials fetched from the secret store.

use crate::{QaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Parsed secret value holding the database credentials.
///
/// RDS-managed secrets carry `username` and `password`; any other keys are
/// kept in `extra`. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretPayload {
    /// Database user
    pub username: String,

    /// Database password
    pub password: String,

    /// Remaining fields of the secret JSON
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SecretPayload {
    /// Parses a secret string.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Json`](crate::QaError::Json) if the string is not a
    /// JSON object with string `username` and `password` fields, and
    /// [`QaError::SecretUnresolvable`] if either of them is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use rds_qa::SecretPayload;
    ///
    /// let secret = SecretPayload::parse(r#"{"username":"qa_user","password":"s3cret"}"#).unwrap();
    /// assert_eq!(secret.username, "qa_user");
    /// assert!(!format!("{:?}", secret).contains("s3cret"));
    /// ```
    pub fn parse(secret_string: &str) -> Result<Self> {
        let payload: Self = serde_json::from_str(secret_string)?;

        if payload.username.is_empty() {
            return Err(QaError::SecretUnresolvable(
                "secret has an empty username".to_string(),
            ));
        }
        if payload.password.is_empty() {
            return Err(QaError::SecretUnresolvable(format!(
                "secret for user {} has an empty password",
                payload.username
            )));
        }

        Ok(payload)
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
