//! Set reconciliation between a source collection and a store.
//!
//! [`reconcile`] classifies source features by dedup key against a
//! [`StoreIndex`] snapshot. [`find_near_matches`] then looks for stored
//! boundaries whose names resemble each missing identity so an operator can
//! decide what to do; nothing is resolved automatically.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};

use crate::{BoundaryStore, DedupKey, Feature, Identity, IdentityResolver, StoreError, StoredBoundary};

/// Snapshot of the dedup keys present in a store.
///
/// Built once per reconciliation pass and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreIndex {
    keys: HashSet<DedupKey>,
}

impl StoreIndex {
    /// Build an index from explicit keys.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = DedupKey>,
    {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Fetch every key from `store`.
    pub fn from_store<S>(store: &S) -> Result<Self, StoreError>
    where
        S: BoundaryStore + ?Sized,
    {
        let index = Self::from_keys(store.identity_keys()?);
        debug!("store index holds {} keys", index.len());
        Ok(index)
    }

    /// Whether `key` is stored.
    pub fn contains(&self, key: &DedupKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store held no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Outcome of comparing a source collection with a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Identities absent from the store, once per key, in source order.
    pub missing: Vec<Identity>,
    /// Keys occurring more than once in the source, with their counts.
    pub duplicates_in_source: BTreeMap<DedupKey, usize>,
    /// Number of features examined.
    pub total_features: usize,
}

/// Classify `features` against `index`.
///
/// # Examples
/// ```
/// use ridings_core::{
///     Attributes, DedupKey, Feature, IdentityResolver, RawGeometry, StoreIndex, reconcile,
/// };
/// use serde_json::json;
///
/// let feature = |name: &str| {
///     Feature::new(
///         Attributes::from_pairs([("FEDNAME", json!(name)), ("PRUID", json!("60"))]),
///         RawGeometry::missing(),
///     )
/// };
/// let features = [feature("Yukon"), feature("Whitehorse")];
/// let index = StoreIndex::from_keys([DedupKey::new("Yukon", "Yukon")]);
///
/// let report = reconcile(&features, &index, &IdentityResolver::default());
/// assert_eq!(report.missing.len(), 1);
/// assert_eq!(report.missing[0].region_name, "Whitehorse");
/// ```
pub fn reconcile<'a, I>(
    features: I,
    index: &StoreIndex,
    resolver: &IdentityResolver,
) -> ReconciliationReport
where
    I: IntoIterator<Item = &'a Feature>,
{
    reconcile_identities(
        features
            .into_iter()
            .map(|feature| resolver.resolve_feature(feature)),
        index,
    )
}

/// Classify already-resolved identities against `index`.
pub fn reconcile_identities<I>(identities: I, index: &StoreIndex) -> ReconciliationReport
where
    I: IntoIterator<Item = Identity>,
{
    let mut occurrences: BTreeMap<DedupKey, usize> = BTreeMap::new();
    let mut missing = Vec::new();
    let mut total_features = 0;

    for identity in identities {
        total_features += 1;
        let key = identity.dedup_key();
        let count = occurrences.entry(key.clone()).or_default();
        *count += 1;
        if *count == 1 && !index.contains(&key) {
            missing.push(identity);
        }
    }

    let duplicates_in_source: BTreeMap<_, _> = occurrences
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();
    info!(
        "reconciled {total_features} features: {} missing, {} duplicated in source",
        missing.len(),
        duplicates_in_source.len()
    );
    ReconciliationReport {
        missing,
        duplicates_in_source,
        total_features,
    }
}

/// Name fragments used to look for near matches of `region_name`.
///
/// The first whitespace-delimited token and the text before the first `--`
/// separator, trimmed, de-duplicated and without empty entries.
///
/// # Examples
/// ```
/// use ridings_core::fuzzy_patterns;
///
/// assert_eq!(fuzzy_patterns("Ottawa--Vanier"), vec!["Ottawa--Vanier", "Ottawa"]);
/// assert_eq!(fuzzy_patterns("Nunavut"), vec!["Nunavut"]);
/// ```
pub fn fuzzy_patterns(region_name: &str) -> Vec<String> {
    let first_token = region_name.split_whitespace().next().unwrap_or_default();
    let before_separator = region_name
        .split("--")
        .next()
        .unwrap_or_default()
        .trim();
    let mut patterns: Vec<String> = Vec::with_capacity(2);
    for pattern in [first_token, before_separator] {
        if !pattern.is_empty() && !patterns.iter().any(|existing| existing == pattern) {
            patterns.push(pattern.to_owned());
        }
    }
    patterns
}

/// Stored boundaries resembling a missing identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearMatch {
    /// Identity missing from the store.
    pub identity: Identity,
    /// Candidates in the same parent region, sorted by name.
    pub candidates: Vec<StoredBoundary>,
}

/// Query `store` for near matches of each missing identity.
pub fn find_near_matches<S>(store: &S, missing: &[Identity]) -> Result<Vec<NearMatch>, StoreError>
where
    S: BoundaryStore + ?Sized,
{
    missing
        .iter()
        .map(|identity| -> Result<NearMatch, StoreError> {
            let mut candidates = Vec::new();
            for pattern in fuzzy_patterns(&identity.region_name) {
                candidates.extend(
                    store.query_by_parent_and_name_pattern(&identity.parent_region, &pattern)?,
                );
            }
            candidates.sort_by(|a, b| {
                a.region_name
                    .cmp(&b.region_name)
                    .then_with(|| a.id.cmp(&b.id))
            });
            candidates.dedup_by_key(|candidate| candidate.id);
            Ok(NearMatch {
                identity: identity.clone(),
                candidates,
            })
        })
        .collect()
}
