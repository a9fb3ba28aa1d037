//! Per-feature import pipeline.
//!
//! Each feature moves through identity resolution, transform planning and
//! repair before it is offered to the store. Failures stop at the feature
//! that caused them: they become a [`FeatureOutcome`] and the batch moves on.
//! Only the end-of-run store count can abort an import.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use ridings_core::{
    BoundaryStore, Feature, GeoOps, GeometryOps, GeometryRecord, Identity, IdentityResolver,
    InsertOutcome, RepairChain, RepairFailure, RepairSettings, RepairStrategy, StoreError,
    TransformPlan, plan,
};
use thiserror::Error;

use crate::FeatureScope;

/// Category recorded for inserts interrupted by the statement deadline.
pub const STORE_TIMEOUT_CATEGORY: &str = "store timeout";
/// Category recorded for other store failures.
pub const STORE_FAILURE_CATEGORY: &str = "store failure";

/// Terminal state of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutcome {
    /// The record was written.
    Persisted {
        /// Store identifier of the new row.
        id: i64,
        /// Strategy that produced the valid geometry.
        strategy: RepairStrategy,
    },
    /// A record with the same dedup key already exists.
    PersistSkipped,
    /// No valid geometry could be produced.
    GeometryFailed(RepairFailure),
    /// The store rejected the insert.
    PersistFailed {
        /// Store error message.
        reason: String,
        /// Whether the statement deadline interrupted the insert.
        timed_out: bool,
    },
}

impl FeatureOutcome {
    fn persist_failed(err: &StoreError) -> Self {
        Self::PersistFailed {
            reason: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    /// Whether the feature was skipped because of a failure.
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::GeometryFailed(_) | Self::PersistFailed { .. })
    }

    /// Summary category of a failure.
    pub fn failure_category(&self) -> Option<&'static str> {
        match self {
            Self::GeometryFailed(failure) => Some(failure.category()),
            Self::PersistFailed { timed_out: true, .. } => Some(STORE_TIMEOUT_CATEGORY),
            Self::PersistFailed { .. } => Some(STORE_FAILURE_CATEGORY),
            Self::Persisted { .. } | Self::PersistSkipped => None,
        }
    }

    /// Failure reason, if the feature failed.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::GeometryFailed(failure) => Some(failure.reason()),
            Self::PersistFailed { reason, .. } => Some(reason.clone()),
            Self::Persisted { .. } | Self::PersistSkipped => None,
        }
    }
}

/// What happened to one feature of the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureReport {
    /// Position of the feature in the source collection.
    pub index: usize,
    /// Resolved identity.
    pub identity: Identity,
    /// Transform plan chosen for its geometry.
    pub plan: TransformPlan,
    /// Terminal state.
    pub outcome: FeatureOutcome,
}

/// Run-end counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Features the run looked at.
    pub processed: usize,
    /// Features excluded by the scope.
    pub out_of_scope: usize,
    /// Records written.
    pub imported: usize,
    /// Inserts skipped because the key was already stored.
    pub duplicates: usize,
    /// Features skipped because of a failure.
    pub failed: usize,
    /// Failures grouped by category.
    pub failure_reasons: BTreeMap<&'static str, usize>,
    /// Records in the store once the run finished.
    pub total_in_store: u64,
}

impl ImportSummary {
    fn record(&mut self, outcome: &FeatureOutcome) {
        self.processed += 1;
        match outcome {
            FeatureOutcome::Persisted { .. } => self.imported += 1,
            FeatureOutcome::PersistSkipped => self.duplicates += 1,
            FeatureOutcome::GeometryFailed(_) | FeatureOutcome::PersistFailed { .. } => {
                self.failed += 1;
            }
        }
        if let Some(category) = outcome.failure_category() {
            *self.failure_reasons.entry(category).or_default() += 1;
        }
    }
}

/// Per-feature reports and the run summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Reports in source order, for features inside the scope.
    pub features: Vec<FeatureReport>,
    /// Run-end counts.
    pub summary: ImportSummary,
}

impl ImportReport {
    /// Reports of features that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FeatureReport> {
        self.features
            .iter()
            .filter(|report| report.outcome.is_failure())
    }
}

/// Errors that abort an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The store could not report its size after the batch.
    #[error("failed to count stored boundaries after import")]
    CountStored {
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

/// Drives features through the pipeline into a [`BoundaryStore`].
///
/// # Examples
/// ```
/// use ridings_core::test_support::{MemoryStore, federal_feature};
/// use ridings_core::RepairSettings;
/// use ridings_data::Importer;
///
/// let mut store = MemoryStore::default();
/// let features = vec![federal_feature("Nunavut", "62", "62001")];
/// let report = Importer::new(RepairSettings::default())
///     .import(&features, &mut store)
///     .expect("import");
/// assert_eq!(report.summary.imported, 1);
/// assert_eq!(report.summary.total_in_store, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Importer<O = GeoOps> {
    resolver: IdentityResolver,
    chain: RepairChain<O>,
    scope: FeatureScope,
}

impl Importer<GeoOps> {
    /// Importer with the federal resolver and the default geometry engine.
    pub fn new(settings: RepairSettings) -> Self {
        Self::with_chain(RepairChain::new(settings))
    }
}

impl<O: GeometryOps> Importer<O> {
    /// Importer using a custom repair chain.
    pub fn with_chain(chain: RepairChain<O>) -> Self {
        Self {
            resolver: IdentityResolver::federal(),
            chain,
            scope: FeatureScope::All,
        }
    }

    /// Replace the identity resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: IdentityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Restrict the run to `scope`.
    #[must_use]
    pub fn with_scope(mut self, scope: FeatureScope) -> Self {
        self.scope = scope;
        self
    }

    /// Resolver in use.
    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Repair chain in use.
    pub fn chain(&self) -> &RepairChain<O> {
        &self.chain
    }

    /// Import every in-scope feature, then count the store.
    pub fn import<S>(&self, features: &[Feature], store: &mut S) -> Result<ImportReport, ImportError>
    where
        S: BoundaryStore + ?Sized,
    {
        info!("importing {} features", features.len());
        let mut report = ImportReport::default();
        for (index, feature) in features.iter().enumerate() {
            if !self.scope.includes(&self.resolver, feature) {
                report.summary.out_of_scope += 1;
                continue;
            }
            let feature_report = self.import_feature(index, feature, store);
            report.summary.record(&feature_report.outcome);
            report.features.push(feature_report);
        }
        report.summary.total_in_store = store
            .count_all()
            .map_err(|source| ImportError::CountStored { source })?;
        info!(
            "import finished: {} imported, {} duplicates, {} failed, {} in store",
            report.summary.imported,
            report.summary.duplicates,
            report.summary.failed,
            report.summary.total_in_store
        );
        Ok(report)
    }

    /// Take one feature to a terminal state.
    pub fn import_feature<S>(&self, index: usize, feature: &Feature, store: &mut S) -> FeatureReport
    where
        S: BoundaryStore + ?Sized,
    {
        let identity = self.resolver.resolve_feature(feature);
        debug!("feature {index}: identity resolved as {identity}");
        let plan = plan(feature);
        debug!(
            "feature {index}: planned {} -> {} (reproject: {})",
            plan.source_srid, plan.target_srid, plan.needs_reprojection
        );

        let outcome = match self.chain.repair(&feature.geometry, &plan) {
            Err(failure) => {
                warn!("skipping {identity}: {failure}");
                FeatureOutcome::GeometryFailed(failure)
            }
            Ok(valid) => {
                let strategy = valid.strategy();
                let record = GeometryRecord::new(identity.clone(), valid, plan.source_srid);
                match store.insert(&record) {
                    Ok(InsertOutcome::Inserted { id }) => {
                        debug!("feature {index}: persisted as {id} after {strategy} strategy");
                        FeatureOutcome::Persisted { id, strategy }
                    }
                    Ok(InsertOutcome::Conflict) => {
                        debug!("feature {index}: {identity} already stored");
                        FeatureOutcome::PersistSkipped
                    }
                    Err(err) => {
                        warn!("skipping {identity}: {err}");
                        FeatureOutcome::persist_failed(&err)
                    }
                }
            }
        };

        FeatureReport {
            index,
            identity,
            plan,
            outcome,
        }
    }
}

/// Import `features` with the default importer configured by `settings`.
pub fn import_features<S>(
    features: &[Feature],
    store: &mut S,
    settings: RepairSettings,
    scope: FeatureScope,
) -> Result<ImportReport, ImportError>
where
    S: BoundaryStore + ?Sized,
{
    Importer::new(settings)
        .with_scope(scope)
        .import(features, store)
}
