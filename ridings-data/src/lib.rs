//! Reading boundary collections and running them against a store.
//!
//! Responsibilities:
//! - Decode feature collections from disk ([`read_feature_collection`]).
//! - Drive features through the import pipeline ([`Importer`]).
//! - Diagnose geometry that fails repair ([`diagnose_features`]).
//! - Report source boundaries missing from a store ([`find_missing`]).
//!
//! Boundaries:
//! - Domain rules (identity, planning, repair, reconciliation) live in
//!   `ridings-core`.
//! - Presentation of reports belongs to the CLI.

mod diagnostics;
mod missing;
mod pipeline;
mod reader;
mod scope;

pub use diagnostics::{FeatureDiagnosis, diagnose_features};
pub use missing::{MissingReport, find_missing};
pub use pipeline::{
    FeatureOutcome, FeatureReport, ImportError, ImportReport, ImportSummary, Importer,
    STORE_FAILURE_CATEGORY, STORE_TIMEOUT_CATEGORY, import_features,
};
pub use reader::{InputError, parse_feature_collection, read_feature_collection};
pub use scope::FeatureScope;
