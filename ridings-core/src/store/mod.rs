//! Persistence capability for repaired boundaries.
//!
//! The [`BoundaryStore`] trait is the only surface the pipeline and the
//! reconciliation engine see. Stores enforce uniqueness on the dedup key
//! (`region_name`, `parent_region`); a duplicate insert is reported as
//! [`InsertOutcome::Conflict`], not as an error.

use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

use crate::{DedupKey, GeometryRecord};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{
    DEFAULT_BUSY_TIMEOUT, DEFAULT_STATEMENT_TIMEOUT, SqliteBoundaryStore, SqliteStoreError,
    StoreConfig,
};

/// Result of a single insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted {
        /// Identifier assigned by the store.
        id: i64,
    },
    /// A record with the same dedup key already exists; nothing was written.
    Conflict,
}

/// Summary of a stored boundary returned by name queries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredBoundary {
    /// Store identifier.
    pub id: i64,
    /// Region name.
    pub region_name: String,
    /// Parent region.
    pub parent_region: String,
}

/// Errors surfaced by [`BoundaryStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The statement deadline elapsed.
    #[error("{operation} exceeded the statement deadline of {limit:?}")]
    Timeout {
        /// Operation that was interrupted.
        operation: &'static str,
        /// Configured deadline.
        limit: Duration,
    },
    /// The backend reported a failure.
    #[error("{operation} failed: {source}")]
    Backend {
        /// Operation that failed.
        operation: &'static str,
        /// Error returned by the backend.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap a backend error.
    pub fn backend(
        operation: &'static str,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }

    /// Whether the failure came from the statement deadline.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Operation label.
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Timeout { operation, .. } | Self::Backend { operation, .. } => *operation,
        }
    }
}

/// Storage for repaired boundaries.
///
/// # Examples
/// ```
/// use ridings_core::{BoundaryStore, DedupKey, StoreError};
///
/// fn stored_in<S: BoundaryStore>(store: &S, key: &DedupKey) -> Result<bool, StoreError> {
///     Ok(store.identity_keys()?.contains(key))
/// }
/// ```
pub trait BoundaryStore {
    /// Persist a record unless its dedup key is already present.
    ///
    /// Each call is atomic: either the whole row is written or nothing is.
    fn insert(&mut self, record: &GeometryRecord) -> Result<InsertOutcome, StoreError>;

    /// Number of stored boundaries.
    fn count_all(&self) -> Result<u64, StoreError>;

    /// Dedup keys of every stored boundary.
    fn identity_keys(&self) -> Result<Vec<DedupKey>, StoreError>;

    /// Boundaries in `parent_region` whose name contains `pattern`,
    /// ignoring case.
    fn query_by_parent_and_name_pattern(
        &self,
        parent_region: &str,
        pattern: &str,
    ) -> Result<Vec<StoredBoundary>, StoreError>;
}

/// Case-insensitive substring match used by name pattern queries.
pub fn name_matches(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, record};
    use rstest::rstest;

    #[rstest]
    #[case("Ottawa Centre", "ottawa", true)]
    #[case("Ottawa Centre", "CENTRE", true)]
    #[case("Nepean", "ottawa", false)]
    #[case("Montréal", "MONTRÉAL", true)]
    fn name_matching_ignores_case(
        #[case] name: &str,
        #[case] pattern: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(name_matches(name, pattern), expected);
    }

    #[rstest]
    fn second_insert_with_same_key_conflicts() {
        let mut store = MemoryStore::default();
        let first = store
            .insert(&record("Test Riding", "Ontario"))
            .expect("first insert");
        let second = store
            .insert(&record("Test Riding", "Ontario"))
            .expect("second insert");
        assert!(matches!(first, InsertOutcome::Inserted { .. }));
        assert_eq!(second, InsertOutcome::Conflict);
        assert_eq!(store.count_all().expect("count"), 1);
    }

    #[rstest]
    fn timeout_errors_are_flagged() {
        let err = StoreError::Timeout {
            operation: "insert boundary",
            limit: Duration::from_secs(1),
        };
        assert!(err.is_timeout());
        assert_eq!(err.operation(), "insert boundary");
    }
}
