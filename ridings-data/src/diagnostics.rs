//! Geometry diagnostics for features that fail import.

use log::{info, warn};
use ridings_core::{
    Feature, GeometryDiagnosis, GeometryOps, Identity, IdentityResolver, RepairChain, plan,
};

use crate::FeatureScope;

/// Diagnosis of one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDiagnosis {
    /// Position of the feature in the source collection.
    pub index: usize,
    /// Resolved identity.
    pub identity: Identity,
    /// Per-strategy outcomes.
    pub diagnosis: GeometryDiagnosis,
}

impl FeatureDiagnosis {
    /// Whether any strategy produced a valid geometry.
    pub fn repairable(&self) -> bool {
        self.diagnosis.first_valid().is_some()
    }
}

/// Run every repair strategy on each in-scope feature without writing
/// anything.
pub fn diagnose_features<O: GeometryOps>(
    features: &[Feature],
    resolver: &IdentityResolver,
    chain: &RepairChain<O>,
    scope: &FeatureScope,
) -> Vec<FeatureDiagnosis> {
    let diagnoses: Vec<FeatureDiagnosis> = features
        .iter()
        .enumerate()
        .filter(|(_, feature)| scope.includes(resolver, feature))
        .map(|(index, feature)| {
            let identity = resolver.resolve_feature(feature);
            let diagnosis = chain.diagnose(&feature.geometry, &plan(feature));
            if diagnosis.plan.ambiguous {
                warn!("{identity}: coordinate extent disagrees with the sampled reference system");
            }
            FeatureDiagnosis {
                index,
                identity,
                diagnosis,
            }
        })
        .collect();
    info!(
        "diagnosed {} features, {} repairable",
        diagnoses.len(),
        diagnoses.iter().filter(|entry| entry.repairable()).count()
    );
    diagnoses
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridings_core::test_support::federal_feature;
    use ridings_core::{
        Attributes, GeometryKind, RawGeometry, RepairSettings, RepairStrategy,
    };
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn reports_every_strategy_for_valid_geometry() {
        let features = vec![federal_feature("Nunavut", "62", "62001")];
        let diagnoses = diagnose_features(
            &features,
            &IdentityResolver::federal(),
            &RepairChain::new(RepairSettings::default()),
            &FeatureScope::All,
        );
        let entry = &diagnoses[0];
        assert_eq!(entry.identity.parent_region, "Nunavut");
        assert_eq!(entry.diagnosis.geometry_type, "Polygon");
        assert_eq!(entry.diagnosis.strategies.len(), RepairStrategy::ORDER.len());
        assert_eq!(entry.diagnosis.first_valid(), Some(RepairStrategy::Direct));
        assert!(entry.repairable());
    }

    #[rstest]
    fn preparation_failures_are_reported() {
        let features = vec![Feature::new(
            Attributes::from_pairs([("FEDNAME", json!("Nowhere"))]),
            RawGeometry::new(GeometryKind::from_tag("LineString"), json!([[0.0, 0.0], [1.0, 1.0]])),
        )];
        let diagnoses = diagnose_features(
            &features,
            &IdentityResolver::federal(),
            &RepairChain::new(RepairSettings::default()),
            &FeatureScope::All,
        );
        let entry = &diagnoses[0];
        assert!(entry.diagnosis.preparation.is_some());
        assert!(entry.diagnosis.strategies.is_empty());
        assert!(!entry.repairable());
    }

    #[rstest]
    fn scope_limits_the_run() {
        let features = vec![
            federal_feature("One", "35", "35082"),
            federal_feature("Two", "35", "35100"),
        ];
        let diagnoses = diagnose_features(
            &features,
            &IdentityResolver::federal(),
            &RepairChain::new(RepairSettings::default()),
            &FeatureScope::from_codes(["35100"]),
        );
        assert_eq!(diagnoses.len(), 1);
        assert_eq!(diagnoses[0].index, 1);
    }
}
