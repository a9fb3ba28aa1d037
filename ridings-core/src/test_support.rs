//! Test-only helpers: an in-memory `BoundaryStore`, scripted geometry
//! operations and feature builders used by unit and behaviour tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use geo::MultiPolygon;
use serde_json::json;

use crate::{
    Attributes, BoundaryStore, DedupKey, Feature, GeometryKind, GeometryOps, GeometryRecord,
    Identity, InsertOutcome, RawGeometry, RepairChain, RepairSettings, ReprojectError, Srid,
    StoreError, StoredBoundary, TransformPlan, Validity, name_matches,
};

#[derive(Debug, Clone)]
struct MemoryRow {
    id: i64,
    key: DedupKey,
    geometry: MultiPolygon<f64>,
}

/// In-memory `BoundaryStore` used in tests.
///
/// Inserts for region names registered through
/// [`MemoryStore::with_timeout_for`] fail with [`StoreError::Timeout`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<MemoryRow>,
    timeout_for: BTreeSet<String>,
}

impl MemoryStore {
    /// Create a store seeded with `(region_name, parent_region)` pairs.
    pub fn with_boundaries<'a, I>(boundaries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut store = Self::default();
        for (name, parent) in boundaries {
            store.push(DedupKey::new(name, parent), MultiPolygon::new(Vec::new()));
        }
        store
    }

    /// Make inserts of `region_name` time out.
    #[must_use]
    pub fn with_timeout_for(mut self, region_name: impl Into<String>) -> Self {
        self.timeout_for.insert(region_name.into());
        self
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<DedupKey> {
        self.rows.iter().map(|row| row.key.clone()).collect()
    }

    /// Geometry stored under `key`.
    pub fn geometry(&self, key: &DedupKey) -> Option<&MultiPolygon<f64>> {
        self.rows
            .iter()
            .find(|row| &row.key == key)
            .map(|row| &row.geometry)
    }

    fn push(&mut self, key: DedupKey, geometry: MultiPolygon<f64>) -> i64 {
        let id = i64::try_from(self.rows.len() + 1).unwrap_or(i64::MAX);
        self.rows.push(MemoryRow { id, key, geometry });
        id
    }
}

impl BoundaryStore for MemoryStore {
    fn insert(&mut self, record: &GeometryRecord) -> Result<InsertOutcome, StoreError> {
        let identity = record.identity();
        if self.timeout_for.contains(&identity.region_name) {
            return Err(StoreError::Timeout {
                operation: "insert boundary",
                limit: Duration::ZERO,
            });
        }
        let key = identity.dedup_key();
        if self.rows.iter().any(|row| row.key == key) {
            return Ok(InsertOutcome::Conflict);
        }
        let id = self.push(key, record.geometry().clone());
        Ok(InsertOutcome::Inserted { id })
    }

    fn count_all(&self) -> Result<u64, StoreError> {
        u64::try_from(self.rows.len()).map_err(|source| StoreError::backend("count boundaries", source))
    }

    fn identity_keys(&self) -> Result<Vec<DedupKey>, StoreError> {
        Ok(self.keys())
    }

    fn query_by_parent_and_name_pattern(
        &self,
        parent_region: &str,
        pattern: &str,
    ) -> Result<Vec<StoredBoundary>, StoreError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.key.parent_region() == parent_region)
            .filter(|row| name_matches(row.key.region_name(), pattern))
            .map(|row| StoredBoundary {
                id: row.id,
                region_name: row.key.region_name().to_owned(),
                parent_region: row.key.parent_region().to_owned(),
            })
            .collect())
    }
}

/// `GeometryOps` returning scripted validity outcomes.
///
/// Geometries pass through unchanged. Each call to
/// [`GeometryOps::validity`] pops the next scripted outcome and reports
/// [`Validity::Valid`] once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedOps {
    outcomes: RefCell<VecDeque<Validity>>,
    reproject_error: Option<ReprojectError>,
    reproject_calls: Cell<usize>,
    simplify_calls: Cell<usize>,
}

impl ScriptedOps {
    /// Script validity outcomes in call order.
    pub fn new<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Validity>,
    {
        Self {
            outcomes: RefCell::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Fail every reprojection with `error`.
    #[must_use]
    pub fn failing_reprojection(mut self, error: ReprojectError) -> Self {
        self.reproject_error = Some(error);
        self
    }

    /// Number of reprojections requested.
    pub fn reproject_calls(&self) -> usize {
        self.reproject_calls.get()
    }

    /// Number of simplifications requested.
    pub fn simplify_calls(&self) -> usize {
        self.simplify_calls.get()
    }
}

impl GeometryOps for ScriptedOps {
    fn reproject(
        &self,
        geometry: &MultiPolygon<f64>,
        _from: Srid,
        _to: Srid,
    ) -> Result<MultiPolygon<f64>, ReprojectError> {
        self.reproject_calls.set(self.reproject_calls.get() + 1);
        match &self.reproject_error {
            Some(error) => Err(error.clone()),
            None => Ok(geometry.clone()),
        }
    }

    fn validity(&self, _geometry: &MultiPolygon<f64>) -> Validity {
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(Validity::Valid)
    }

    fn make_valid(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.clone()
    }

    fn simplify(&self, geometry: &MultiPolygon<f64>, _tolerance: f64) -> MultiPolygon<f64> {
        self.simplify_calls.set(self.simplify_calls.get() + 1);
        geometry.clone()
    }
}

/// A small valid WGS84 square as a raw polygon.
pub fn square_geometry() -> RawGeometry {
    RawGeometry::new(
        GeometryKind::Polygon,
        json!([[[-75.7, 45.4], [-75.6, 45.4], [-75.6, 45.5], [-75.7, 45.5], [-75.7, 45.4]]]),
    )
}

/// Feature laid out like a federal boundary file.
pub fn federal_feature(name: &str, province_code: &str, source_code: &str) -> Feature {
    Feature::new(
        Attributes::from_pairs([
            ("FEDNAME", json!(name)),
            ("PRUID", json!(province_code)),
            ("FEDUID", json!(source_code)),
        ]),
        square_geometry(),
    )
}

/// Repaired record for `region_name` in `parent_region`.
///
/// # Panics
///
/// Panics if the built-in square fails repair, which indicates a broken
/// geometry engine.
#[expect(clippy::expect_used, reason = "test fixture with a known-valid square")]
pub fn record(region_name: &str, parent_region: &str) -> GeometryRecord {
    let valid = RepairChain::new(RepairSettings::default())
        .repair(&square_geometry(), &TransformPlan::geographic())
        .expect("square repairs directly");
    GeometryRecord::new(
        Identity::new(region_name, parent_region, ""),
        valid,
        Srid::WGS84,
    )
}
