//! Facade crate for electoral boundary ingestion.
//!
//! This crate re-exports the core domain types and exposes the SQLite store
//! and the collection pipeline behind feature flags.

#![forbid(unsafe_code)]

pub use ridings_core::{
    Attributes, BoundaryStore, DedupKey, Feature, GeoOps, GeometryDiagnosis, GeometryKind,
    GeometryOps, GeometryRecord, Identity, IdentityResolver, InsertOutcome, NearMatch,
    RawGeometry, ReconciliationReport, RepairChain, RepairFailure, RepairSettings, RepairStrategy,
    Srid, StoreError, StoreIndex, StoredBoundary, TransformPlan, ValidGeometry, Validity,
    find_near_matches, plan, reconcile,
};

#[cfg(feature = "store-sqlite")]
pub use ridings_core::{SqliteBoundaryStore, SqliteStoreError, StoreConfig};

#[cfg(feature = "data")]
pub use ridings_data::{
    FeatureScope, ImportError, ImportReport, Importer, InputError, MissingReport,
    diagnose_features, find_missing, read_feature_collection,
};

#[cfg(feature = "test-support")]
pub use ridings_core::test_support;
