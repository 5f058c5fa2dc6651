//! Per-session lazy cache slot.

/// State of one lazily fetched value.
///
/// A session holds one slot per remote lookup. `Resolved` is final for the
/// lifetime of the session; `Failed` keeps the reason for diagnostics but is
/// fetched again on the next access.
///
/// # Example
///
/// ```
/// use rds_qa::cache::Cached;
///
/// let mut slot: Cached<u16> = Cached::Unresolved;
/// assert!(slot.needs_fetch());
///
/// slot = Cached::Failed("endpoint missing".to_string());
/// assert!(slot.needs_fetch());
/// assert_eq!(slot.failure(), Some("endpoint missing"));
///
/// slot = Cached::Resolved(5432);
/// assert!(!slot.needs_fetch());
/// assert_eq!(slot.get(), Some(&5432));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cached<T> {
    /// Never fetched
    #[default]
    Unresolved,
    /// Fetched successfully
    Resolved(T),
    /// Last fetch failed
    Failed(String),
}

impl<T> Cached<T> {
    /// Returns the cached value, if resolved.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// True unless a value has been resolved.
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Self::Resolved(_))
    }

    /// Returns the reason of the last failed fetch.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
