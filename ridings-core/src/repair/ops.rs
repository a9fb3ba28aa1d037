//! Geometry primitives used by the repair chain.
//!
//! [`GeometryOps`] is the seam between the chain's control flow and the
//! numeric work. [`GeoOps`] backs it with `geo` for validation, repair and
//! simplification and with `proj4rs` for reprojection.

use geo::{
    Coord, LineString, MapCoords, MultiPolygon, Polygon, RemoveRepeatedPoints, Simplify,
    Validation, unary_union,
};
use proj4rs::{proj::Proj, transform::transform};
use thiserror::Error;

use crate::Srid;

/// Outcome of the validity predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    /// The geometry is valid.
    Valid,
    /// The geometry is invalid for the recorded reason.
    Invalid {
        /// Human-readable explanation; never empty.
        reason: String,
    },
}

impl Validity {
    /// Build an invalid outcome, substituting a generic reason when none is
    /// supplied.
    pub fn invalid(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Self::Invalid {
                reason: "geometry is invalid".to_owned(),
            };
        }
        Self::Invalid { reason }
    }

    /// Whether the geometry passed.
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Reason for an invalid outcome.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { reason } => Some(reason),
        }
    }
}

/// Errors raised while moving coordinates between reference systems.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReprojectError {
    /// No projection definition exists for the system.
    #[error("unsupported reference system {srid}")]
    UnsupportedSrid {
        /// Offending system.
        srid: Srid,
    },
    /// The projection definition could not be built.
    #[error("failed to build projection for {srid}: {reason}")]
    Projection {
        /// System whose definition failed.
        srid: Srid,
        /// Message reported by the projection library.
        reason: String,
    },
    /// A coordinate could not be transformed.
    #[error("failed to transform coordinate ({x}, {y}): {reason}")]
    Transform {
        /// Source ordinate.
        x: f64,
        /// Source ordinate.
        y: f64,
        /// Message reported by the projection library.
        reason: String,
    },
    /// The coordinate sample and the extent disagree about the source
    /// system, so reprojecting could silently relocate the feature.
    #[error("coordinates of {srid} are uncertain: most positions lie within longitude/latitude range")]
    AmbiguousSource {
        /// System suggested by the coordinate sample.
        srid: Srid,
    },
    /// The transformed coordinate is not finite or lies outside
    /// longitude/latitude bounds.
    #[error("reprojected coordinate ({x}, {y}) is outside longitude/latitude range")]
    OutOfRange {
        /// Transformed longitude.
        x: f64,
        /// Transformed latitude.
        y: f64,
    },
}

/// Operations the repair chain needs from a geometry engine.
pub trait GeometryOps {
    /// Reproject every coordinate from `from` to `to`.
    fn reproject(
        &self,
        geometry: &MultiPolygon<f64>,
        from: Srid,
        to: Srid,
    ) -> Result<MultiPolygon<f64>, ReprojectError>;

    /// Evaluate the validity predicate.
    fn validity(&self, geometry: &MultiPolygon<f64>) -> Validity;

    /// Repair self-intersections and degenerate rings.
    fn make_valid(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64>;

    /// Douglas–Peucker simplification at `tolerance` in target units.
    fn simplify(&self, geometry: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64>;
}

/// [`GeometryOps`] backed by `geo` and `proj4rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoOps;

fn projection(srid: Srid) -> Result<Proj, ReprojectError> {
    let definition = srid
        .proj_string()
        .ok_or(ReprojectError::UnsupportedSrid { srid })?;
    Proj::from_proj_string(definition).map_err(|err| ReprojectError::Projection {
        srid,
        reason: err.to_string(),
    })
}

fn in_geographic_range(coord: Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (-90.0..=90.0).contains(&coord.y)
}

impl GeometryOps for GeoOps {
    fn reproject(
        &self,
        geometry: &MultiPolygon<f64>,
        from: Srid,
        to: Srid,
    ) -> Result<MultiPolygon<f64>, ReprojectError> {
        if from == to {
            return Ok(geometry.clone());
        }
        let source = projection(from)?;
        let target = projection(to)?;
        let (source, target) = (&source, &target);

        geometry.try_map_coords(move |coord: Coord<f64>| {
            // proj4rs works in radians on the geographic side.
            let mut point = if from.is_geographic() {
                (coord.x.to_radians(), coord.y.to_radians(), 0.0)
            } else {
                (coord.x, coord.y, 0.0)
            };
            transform(source, target, &mut point).map_err(|err| ReprojectError::Transform {
                x: coord.x,
                y: coord.y,
                reason: err.to_string(),
            })?;
            let out = if to.is_geographic() {
                Coord {
                    x: point.0.to_degrees(),
                    y: point.1.to_degrees(),
                }
            } else {
                Coord {
                    x: point.0,
                    y: point.1,
                }
            };
            if !out.x.is_finite() || !out.y.is_finite() {
                return Err(ReprojectError::OutOfRange { x: out.x, y: out.y });
            }
            if to.is_geographic() && !in_geographic_range(out) {
                return Err(ReprojectError::OutOfRange { x: out.x, y: out.y });
            }
            Ok(out)
        })
    }

    fn validity(&self, geometry: &MultiPolygon<f64>) -> Validity {
        if geometry.0.is_empty() {
            return Validity::invalid("geometry is empty");
        }
        let errors = geometry.validation_errors();
        if errors.is_empty() {
            return Validity::Valid;
        }
        Validity::invalid(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn make_valid(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let cleaned: Vec<Polygon<f64>> = geometry.iter().filter_map(clean_polygon).collect();
        if cleaned.is_empty() {
            return MultiPolygon::new(Vec::new());
        }
        unary_union(cleaned.iter())
    }

    fn simplify(&self, geometry: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
        geometry.simplify(tolerance)
    }
}

fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut ring = ring.remove_repeated_points();
    ring.close();
    (ring.0.len() >= 4).then_some(ring)
}

fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, coord, polygon};
    use rstest::{fixture, rstest};

    #[fixture]
    fn ops() -> GeoOps {
        GeoOps
    }

    fn square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: -75.7, y: 45.4),
            (x: -75.6, y: 45.4),
            (x: -75.6, y: 45.5),
            (x: -75.7, y: 45.5),
            (x: -75.7, y: 45.4),
        ]])
    }

    fn bowtie() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    #[rstest]
    fn square_is_valid(ops: GeoOps) {
        assert_eq!(ops.validity(&square()), Validity::Valid);
    }

    #[rstest]
    fn empty_geometry_is_invalid(ops: GeoOps) {
        let validity = ops.validity(&MultiPolygon::new(Vec::new()));
        assert_eq!(validity.reason(), Some("geometry is empty"));
    }

    #[rstest]
    fn bowtie_is_invalid_with_reason(ops: GeoOps) {
        let validity = ops.validity(&bowtie());
        assert!(!validity.is_valid());
        assert!(validity.reason().is_some_and(|reason| !reason.is_empty()));
    }

    #[rstest]
    fn make_valid_resolves_self_intersection(ops: GeoOps) {
        let repaired = ops.make_valid(&bowtie());
        assert!(ops.validity(&repaired).is_valid());
        assert!(repaired.unsigned_area() > 0.0);
    }

    #[rstest]
    fn make_valid_drops_degenerate_rings(ops: GeoOps) {
        let sliver = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 0.0, y: 0.0),
        ]]);
        assert!(ops.make_valid(&sliver).0.is_empty());
    }

    #[rstest]
    fn reproject_maps_projection_origin_to_central_meridian(ops: GeoOps) {
        let origin = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1000.0, y: 0.0),
            (x: 1000.0, y: 1000.0),
            (x: 0.0, y: 0.0),
        ]]);
        let reprojected = ops
            .reproject(&origin, Srid::CANADA_ATLAS_LAMBERT, Srid::WGS84)
            .expect("reproject");
        let first = reprojected.0[0].exterior().0[0];
        assert!((first.x - -95.0).abs() < 1e-6, "longitude {}", first.x);
        assert!((first.y - 49.0).abs() < 1e-6, "latitude {}", first.y);
    }

    #[rstest]
    fn reprojection_preserves_part_count(ops: GeoOps) {
        let parts = MultiPolygon::new(vec![
            polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 0.0)],
            polygon![(x: 50.0, y: 50.0), (x: 60.0, y: 50.0), (x: 60.0, y: 60.0), (x: 50.0, y: 50.0)],
        ]);
        let reprojected = ops
            .reproject(&parts, Srid::CANADA_ATLAS_LAMBERT, Srid::WGS84)
            .expect("reproject");
        assert_eq!(reprojected.0.len(), 2);
    }

    #[rstest]
    fn reprojection_round_trips_within_tolerance(ops: GeoOps) {
        let projected = ops
            .reproject(&square(), Srid::WGS84, Srid::CANADA_ATLAS_LAMBERT)
            .expect("forward");
        let back = ops
            .reproject(&projected, Srid::CANADA_ATLAS_LAMBERT, Srid::WGS84)
            .expect("inverse");
        let expected = coord! { x: -75.7, y: 45.4 };
        let actual = back.0[0].exterior().0[0];
        assert!((actual.x - expected.x).abs() < 1e-6);
        assert!((actual.y - expected.y).abs() < 1e-6);
    }

    #[rstest]
    fn unsupported_srid_is_reported(ops: GeoOps) {
        let err = ops
            .reproject(&square(), Srid::new(2154), Srid::WGS84)
            .expect_err("unsupported");
        assert_eq!(err, ReprojectError::UnsupportedSrid { srid: Srid::new(2154) });
    }

    #[rstest]
    fn simplify_removes_collinear_noise(ops: GeoOps) {
        let noisy = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 0.5, y: 0.0001),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]]);
        let simplified = ops.simplify(&noisy, 0.001);
        assert_eq!(simplified.0[0].exterior().0.len(), 5);
    }
}
