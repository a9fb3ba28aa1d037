//! Core domain for electoral boundary ingestion.
//!
//! Raw features are resolved to a canonical [`Identity`], planned for
//! reprojection by [`plan`], repaired by a [`RepairChain`] and persisted
//! through a [`BoundaryStore`]. [`reconcile`] compares a source collection
//! with a store and [`find_near_matches`] proposes candidates for records that
//! are missing.
//!
//! The SQLite store is available behind the `store-sqlite` feature; test
//! doubles live in [`test_support`] behind `test-support`.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod feature;
mod identity;
mod plan;
mod reconcile;
mod record;
mod repair;
mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use feature::{Attributes, Feature, GeometryKind, RawGeometry};
pub use identity::{DedupKey, Identity, IdentityResolver, PROVINCE_CODES, UNKNOWN, province_name};
pub use plan::{PROJECTED_MAGNITUDE_THRESHOLD, Srid, TransformPlan, first_sample, plan, plan_geometry};
pub use reconcile::{
    NearMatch, ReconciliationReport, StoreIndex, find_near_matches, fuzzy_patterns, reconcile,
    reconcile_identities,
};
pub use record::GeometryRecord;
pub use repair::{
    DEFAULT_SIMPLIFY_TOLERANCE, GeoOps, GeometryDiagnosis, GeometryOps, RepairChain, RepairFailure,
    RepairSettings, RepairStrategy, ReprojectError, Shape, ShapeError, StrategyReport,
    ValidGeometry, Validity, parse_shape,
};
pub use store::{BoundaryStore, InsertOutcome, StoreError, StoredBoundary, name_matches};

#[cfg(feature = "store-sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "store-sqlite")))]
pub use store::{
    DEFAULT_BUSY_TIMEOUT, DEFAULT_STATEMENT_TIMEOUT, SqliteBoundaryStore, SqliteStoreError,
    StoreConfig,
};
