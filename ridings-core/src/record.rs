//! Validated records ready for persistence.

use geo::MultiPolygon;

use crate::{Identity, Srid, ValidGeometry};

/// A boundary that passed repair and may be written to a store.
///
/// The geometry can only come from a [`ValidGeometry`], so an invalid shape
/// never reaches a store.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    identity: Identity,
    geometry: ValidGeometry,
    source_srid: Srid,
}

impl GeometryRecord {
    /// Pair an identity with its repaired geometry.
    pub fn new(identity: Identity, geometry: ValidGeometry, source_srid: Srid) -> Self {
        Self {
            identity,
            geometry,
            source_srid,
        }
    }

    /// Resolved identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Geometry in WGS84.
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        self.geometry.geometry()
    }

    /// Repair outcome, including the strategy that produced it.
    pub fn repaired(&self) -> &ValidGeometry {
        &self.geometry
    }

    /// Reference system of the source coordinates.
    pub const fn source_srid(&self) -> Srid {
        self.source_srid
    }
}
