//! SQLite-backed boundary store.
//!
//! Geometries are written as bincode blobs of the validated WGS84
//! multi-polygon. Uniqueness of (`riding_name`, `province`) is enforced by
//! the schema and inserts use `INSERT OR IGNORE`, so zero affected rows is
//! the duplicate signal.

use std::{fmt, time::Duration, time::Instant};

use camino::{Utf8Path, Utf8PathBuf};
use geo::MultiPolygon;
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params};
use thiserror::Error;

use crate::DedupKey;
use crate::GeometryRecord;

use super::{BoundaryStore, InsertOutcome, StoreError, StoredBoundary, name_matches};

/// Statement deadline applied when none is configured explicitly.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(300);

/// How long to wait on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// VM instructions between deadline checks.
const PROGRESS_INTERVAL: i32 = 1000;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS riding_boundaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    riding_name TEXT NOT NULL,
    province TEXT NOT NULL,
    source_code TEXT,
    source_srid INTEGER NOT NULL,
    geom BLOB NOT NULL,
    UNIQUE (riding_name, province)
)";

/// Connection settings for [`SqliteBoundaryStore`].
///
/// Built once at startup and passed by reference; the store never parses
/// connection strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    path: Utf8PathBuf,
    statement_timeout: Option<Duration>,
    busy_timeout: Duration,
}

impl StoreConfig {
    /// Configuration for the database at `path` with default timeouts.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            statement_timeout: Some(DEFAULT_STATEMENT_TIMEOUT),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Replace the per-statement deadline. `None` disables it.
    #[must_use]
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Replace the busy timeout.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Database location.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Per-statement deadline.
    pub const fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout
    }

    /// Busy timeout.
    pub const fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}

/// Errors raised while opening the store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}")]
    OpenDatabase {
        /// Location of the database.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Applying connection settings failed.
    #[error("failed to configure SQLite connection")]
    Configure {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the `riding_boundaries` table failed.
    #[error("failed to create riding_boundaries table")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// [`BoundaryStore`] persisted in a SQLite database.
pub struct SqliteBoundaryStore {
    connection: Connection,
    statement_timeout: Option<Duration>,
}

impl fmt::Debug for SqliteBoundaryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBoundaryStore")
            .field("path", &self.connection.path())
            .field("statement_timeout", &self.statement_timeout)
            .finish_non_exhaustive()
    }
}

impl SqliteBoundaryStore {
    /// Open (creating when needed) the database described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, SqliteStoreError> {
        Self::open_with_flags(config, OpenFlags::default())
    }

    /// Open the database described by `config`, failing when it does not
    /// exist yet.
    pub fn open_existing(config: &StoreConfig) -> Result<Self, SqliteStoreError> {
        Self::open_with_flags(config, OpenFlags::default().difference(OpenFlags::SQLITE_OPEN_CREATE))
    }

    fn open_with_flags(config: &StoreConfig, flags: OpenFlags) -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_with_flags(config.path().as_std_path(), flags)
            .map_err(|source| SqliteStoreError::OpenDatabase {
                path: config.path().to_path_buf(),
                source,
            })?;
        connection
            .busy_timeout(config.busy_timeout())
            .map_err(|source| SqliteStoreError::Configure { source })?;
        Self::initialise(connection, config.statement_timeout())
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(statement_timeout: Option<Duration>) -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::OpenDatabase {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        Self::initialise(connection, statement_timeout)
    }

    fn initialise(
        connection: Connection,
        statement_timeout: Option<Duration>,
    ) -> Result<Self, SqliteStoreError> {
        connection
            .execute(SCHEMA, [])
            .map_err(|source| SqliteStoreError::CreateSchema { source })?;
        Ok(Self {
            connection,
            statement_timeout,
        })
    }

    /// Decode the stored geometry of boundary `id`.
    pub fn load_geometry(&self, id: i64) -> Result<Option<MultiPolygon<f64>>, StoreError> {
        let blob: Option<Vec<u8>> = self.with_deadline("load geometry", |connection| {
            connection
                .query_row(
                    "SELECT geom FROM riding_boundaries WHERE id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()
        })?;
        blob.map(|bytes| {
            bincode::deserialize(&bytes).map_err(|source| StoreError::backend("decode geometry", source))
        })
        .transpose()
    }

    /// Run `statement` under the configured deadline.
    ///
    /// The progress handler is armed for the duration of the call and
    /// removed afterwards; an interrupt maps to [`StoreError::Timeout`].
    fn with_deadline<T>(
        &self,
        operation: &'static str,
        statement: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        if let Some(limit) = self.statement_timeout {
            let started = Instant::now();
            self.connection
                .progress_handler(PROGRESS_INTERVAL, Some(move || started.elapsed() >= limit));
        }
        let result = statement(&self.connection);
        if self.statement_timeout.is_some() {
            self.connection.progress_handler(0, None::<fn() -> bool>);
        }
        result.map_err(|source| {
            let interrupted = matches!(
                &source,
                rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::OperationInterrupted
            );
            match self.statement_timeout {
                Some(limit) if interrupted => StoreError::Timeout { operation, limit },
                _ => StoreError::backend(operation, source),
            }
        })
    }
}

impl BoundaryStore for SqliteBoundaryStore {
    fn insert(&mut self, record: &GeometryRecord) -> Result<InsertOutcome, StoreError> {
        let blob = bincode::serialize(record.geometry())
            .map_err(|source| StoreError::backend("encode geometry", source))?;
        let identity = record.identity();
        let source_code = (!identity.source_code.is_empty()).then_some(identity.source_code.as_str());
        let srid = record.source_srid().code();

        self.with_deadline("insert boundary", |connection| {
            let transaction = connection.unchecked_transaction()?;
            let affected = transaction.execute(
                "INSERT OR IGNORE INTO riding_boundaries
                    (riding_name, province, source_code, source_srid, geom)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    identity.region_name,
                    identity.parent_region,
                    source_code,
                    srid,
                    blob
                ],
            )?;
            let outcome = if affected == 0 {
                InsertOutcome::Conflict
            } else {
                InsertOutcome::Inserted {
                    id: transaction.last_insert_rowid(),
                }
            };
            transaction.commit()?;
            Ok(outcome)
        })
    }

    fn count_all(&self) -> Result<u64, StoreError> {
        let count: i64 = self.with_deadline("count boundaries", |connection| {
            connection.query_row("SELECT COUNT(*) FROM riding_boundaries", [], |row| {
                row.get(0)
            })
        })?;
        u64::try_from(count).map_err(|source| StoreError::backend("count boundaries", source))
    }

    fn identity_keys(&self) -> Result<Vec<DedupKey>, StoreError> {
        self.with_deadline("list identity keys", |connection| {
            let mut statement = connection
                .prepare("SELECT riding_name, province FROM riding_boundaries ORDER BY id")?;
            let keys = statement
                .query_map([], |row| Ok(DedupKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(keys)
        })
    }

    fn query_by_parent_and_name_pattern(
        &self,
        parent_region: &str,
        pattern: &str,
    ) -> Result<Vec<StoredBoundary>, StoreError> {
        let rows = self.with_deadline("query boundaries by name", |connection| {
            let mut statement = connection.prepare(
                "SELECT id, riding_name, province FROM riding_boundaries
                 WHERE province = ?1
                 ORDER BY riding_name, id",
            )?;
            let rows = statement
                .query_map([parent_region], |row| {
                    Ok(StoredBoundary {
                        id: row.get(0)?,
                        region_name: row.get(1)?,
                        parent_region: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;
        Ok(rows
            .into_iter()
            .filter(|boundary| name_matches(&boundary.region_name, pattern))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn store() -> SqliteBoundaryStore {
        SqliteBoundaryStore::open_in_memory(Some(DEFAULT_STATEMENT_TIMEOUT)).expect("open store")
    }

    #[rstest]
    fn insert_assigns_identifier(mut store: SqliteBoundaryStore) {
        let outcome = store
            .insert(&record("Ottawa Centre", "Ontario"))
            .expect("insert");
        assert!(matches!(outcome, InsertOutcome::Inserted { id } if id > 0));
        assert_eq!(store.count_all().expect("count"), 1);
    }

    #[rstest]
    fn duplicate_key_reports_conflict(mut store: SqliteBoundaryStore) {
        store
            .insert(&record("Test Riding", "Ontario"))
            .expect("first insert");
        let second = store
            .insert(&record("Test Riding", "Ontario"))
            .expect("duplicate is not an error");
        assert_eq!(second, InsertOutcome::Conflict);
        assert_eq!(store.count_all().expect("count"), 1);
    }

    #[rstest]
    fn same_name_in_other_province_is_distinct(mut store: SqliteBoundaryStore) {
        store.insert(&record("Kings", "Nova Scotia")).expect("insert");
        let outcome = store
            .insert(&record("Kings", "Prince Edward Island"))
            .expect("insert");
        assert!(matches!(outcome, InsertOutcome::Inserted { .. }));
        assert_eq!(store.count_all().expect("count"), 2);
    }

    #[rstest]
    fn identity_keys_follow_insert_order(mut store: SqliteBoundaryStore) {
        store.insert(&record("Nunavut", "Nunavut")).expect("insert");
        store.insert(&record("Yukon", "Yukon")).expect("insert");
        let keys = store.identity_keys().expect("keys");
        assert_eq!(
            keys,
            vec![DedupKey::new("Nunavut", "Nunavut"), DedupKey::new("Yukon", "Yukon")]
        );
    }

    #[rstest]
    fn name_query_filters_by_parent_and_pattern(mut store: SqliteBoundaryStore) {
        store.insert(&record("Ottawa Centre", "Ontario")).expect("insert");
        store.insert(&record("Ottawa South", "Ontario")).expect("insert");
        store.insert(&record("Ottawa--Vanier", "Quebec")).expect("insert");
        store.insert(&record("Nepean", "Ontario")).expect("insert");
        let found = store
            .query_by_parent_and_name_pattern("Ontario", "OTTAWA")
            .expect("query");
        let names: Vec<_> = found.iter().map(|b| b.region_name.as_str()).collect();
        assert_eq!(names, vec!["Ottawa Centre", "Ottawa South"]);
    }

    #[rstest]
    fn stored_geometry_decodes(mut store: SqliteBoundaryStore) {
        let record = record("Whitehorse", "Yukon");
        let InsertOutcome::Inserted { id } = store.insert(&record).expect("insert") else {
            panic!("expected a new row");
        };
        let geometry = store.load_geometry(id).expect("load").expect("row exists");
        assert_eq!(&geometry, record.geometry());
        assert_eq!(store.load_geometry(id + 100).expect("load"), None);
    }

    #[rstest]
    fn elapsed_deadline_interrupts_long_statement() {
        let store = SqliteBoundaryStore::open_in_memory(Some(Duration::ZERO)).expect("open");
        let err = store
            .with_deadline("count to a million", |connection| {
                connection.query_row(
                    "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 1000000)
                     SELECT count(*) FROM n",
                    [],
                    |row| row.get::<_, i64>(0),
                )
            })
            .expect_err("deadline elapsed");
        assert!(err.is_timeout(), "unexpected error: {err}");
    }

    #[rstest]
    fn short_statement_completes_under_deadline() {
        let mut store =
            SqliteBoundaryStore::open_in_memory(Some(Duration::from_secs(5))).expect("open");
        store.insert(&record("Nunavut", "Nunavut")).expect("insert");
        assert_eq!(store.count_all().expect("count"), 1);
    }

    #[rstest]
    fn records_persist_across_connections() {
        let dir = TempDir::new().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("ridings.db")).expect("utf8 path");
        let config = StoreConfig::new(path).with_busy_timeout(Duration::from_millis(100));
        {
            let mut store = SqliteBoundaryStore::open(&config).expect("open");
            store.insert(&record("Iqaluit", "Nunavut")).expect("insert");
        }
        let store = SqliteBoundaryStore::open(&config).expect("reopen");
        assert_eq!(store.count_all().expect("count"), 1);
    }

    #[rstest]
    fn open_existing_refuses_to_create() {
        let dir = TempDir::new().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("typo.db")).expect("utf8 path");
        let config = StoreConfig::new(path.clone());
        let err = SqliteBoundaryStore::open_existing(&config).expect_err("absent database");
        assert!(matches!(err, SqliteStoreError::OpenDatabase { .. }));
        assert!(!path.as_std_path().exists());

        SqliteBoundaryStore::open(&config).expect("create");
        let store = SqliteBoundaryStore::open_existing(&config).expect("reopen");
        assert_eq!(store.count_all().expect("count"), 0);
    }

    #[rstest]
    fn open_reports_unreachable_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("missing/dir/ridings.db"))
            .expect("utf8 path");
        let err = SqliteBoundaryStore::open(&StoreConfig::new(path.clone())).expect_err("no parent");
        match err {
            SqliteStoreError::OpenDatabase { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
