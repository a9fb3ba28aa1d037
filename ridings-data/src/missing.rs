//! Reports of source boundaries absent from a store.

use log::info;
use ridings_core::{
    BoundaryStore, Feature, IdentityResolver, NearMatch, ReconciliationReport, StoreError,
    StoreIndex, find_near_matches, reconcile,
};

/// Reconciliation of a collection against a store, with candidate matches
/// for every missing identity.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingReport {
    /// Missing identities and source-side duplicates.
    pub reconciliation: ReconciliationReport,
    /// Stored records that might correspond to the missing identities.
    pub near_matches: Vec<NearMatch>,
    /// Number of distinct keys in the store when the report was built.
    pub stored_keys: usize,
}

impl MissingReport {
    /// Whether every source identity is stored.
    pub fn is_complete(&self) -> bool {
        self.reconciliation.missing.is_empty()
    }
}

/// Compare `features` with `store` and look for near matches of the misses.
pub fn find_missing<S>(
    features: &[Feature],
    store: &S,
    resolver: &IdentityResolver,
) -> Result<MissingReport, StoreError>
where
    S: BoundaryStore + ?Sized,
{
    let index = StoreIndex::from_store(store)?;
    let reconciliation = reconcile(features, &index, resolver);
    info!(
        "{} of {} source features missing from a store of {} boundaries",
        reconciliation.missing.len(),
        reconciliation.total_features,
        index.len()
    );
    let near_matches = find_near_matches(store, &reconciliation.missing)?;
    Ok(MissingReport {
        reconciliation,
        near_matches,
        stored_keys: index.len(),
    })
}
