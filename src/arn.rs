//! Secret-name derivation from Secrets Manager ARNs.
//!
//! A secret ARN looks like
//! `arn:aws:secretsmanager:<region>:<account>:secret:<name>-<suffix>`, where
//! `<suffix>` is a random token appended by the service. The lookup key is the
//! 7th colon-delimited segment with its last hyphen-delimited token dropped.

use thiserror::Error;

/// Index of the resource segment in a colon-delimited ARN.
const RESOURCE_SEGMENT: usize = 6;

/// Why an ARN could not be turned into a secret name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnError {
    /// The ARN has fewer than 7 colon-delimited segments.
    #[error("ARN has {found} colon-delimited segments, expected at least 7")]
    TooFewSegments {
        /// Number of segments actually present
        found: usize,
    },

    /// Nothing is left of the resource segment once the suffix is removed.
    #[error("ARN resource segment {0:?} has no name before its random suffix")]
    EmptyName(String),
}

/// Derives the secret-store lookup key from a secret ARN.
///
/// Assumes the random suffix contains no hyphens.
///
/// # Errors
///
/// - [`ArnError::TooFewSegments`]: fewer than 7 colon-delimited segments
/// - [`ArnError::EmptyName`]: the resource segment has no hyphen, or nothing
///   precedes its last hyphen
///
/// # Example
///
/// ```
/// use rds_qa::arn::{secret_name_from_arn, ArnError};
///
/// assert_eq!(
///     secret_name_from_arn("arn:aws:secretsmanager:eu-central-1:123456789012:secret:qa-db-secret-abc123"),
///     Ok("qa-db-secret".to_string())
/// );
///
/// assert_eq!(
///     secret_name_from_arn("arn:aws:secretsmanager:eu-central-1"),
///     Err(ArnError::TooFewSegments { found: 4 })
/// );
/// ```
pub fn secret_name_from_arn(arn: &str) -> Result<String, ArnError> {
    let segments: Vec<&str> = arn.split(':').collect();
    let resource = segments
        .get(RESOURCE_SEGMENT)
        .ok_or(ArnError::TooFewSegments {
            found: segments.len(),
        })?;

    match resource.rsplit_once('-') {
        Some((name, _suffix)) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ArnError::EmptyName(resource.to_string())),
    }
}
