//! Coordinate reference system inference.
//!
//! Boundary files arrive either in Canada Atlas Lambert (EPSG:3978, metres)
//! or already in WGS84 longitude/latitude. The source rarely says which, so
//! [`plan`] samples the first coordinate: a magnitude above 180 cannot be a
//! longitude and marks the feature as projected.

use std::fmt;

use log::warn;
use serde_json::Value;

use crate::{Feature, RawGeometry};

/// Magnitude above which a sampled ordinate is taken to be projected.
pub const PROJECTED_MAGNITUDE_THRESHOLD: f64 = 180.0;

/// Spatial reference identifier (EPSG code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Srid(u32);

impl Srid {
    /// Canada Atlas Lambert, the projected system of federal boundary files.
    pub const CANADA_ATLAS_LAMBERT: Self = Self(3978);
    /// WGS84 geographic coordinates.
    pub const WGS84: Self = Self(4326);

    /// Wrap a raw EPSG code.
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Raw EPSG code.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Whether coordinates in this system are longitude/latitude degrees.
    pub const fn is_geographic(self) -> bool {
        self.0 == Self::WGS84.0
    }

    /// PROJ.4 definition for the supported systems.
    pub(crate) const fn proj_string(self) -> Option<&'static str> {
        match self.0 {
            3978 => Some(
                "+proj=lcc +lat_0=49 +lon_0=-95 +lat_1=49 +lat_2=77 +x_0=0 +y_0=0 \
                 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs +type=crs",
            ),
            4326 => Some("+proj=longlat +datum=WGS84 +no_defs +type=crs"),
            _ => None,
        }
    }
}

impl fmt::Display for Srid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// How a feature's coordinates must be transformed before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformPlan {
    /// Whether coordinates must be reprojected.
    pub needs_reprojection: bool,
    /// Reference system of the raw coordinates.
    pub source_srid: Srid,
    /// Reference system of stored geometry.
    pub target_srid: Srid,
    /// The bounding box of all positions disagrees with the sampled decision.
    pub ambiguous: bool,
}

impl TransformPlan {
    /// Plan for coordinates already in WGS84.
    pub const fn geographic() -> Self {
        Self {
            needs_reprojection: false,
            source_srid: Srid::WGS84,
            target_srid: Srid::WGS84,
            ambiguous: false,
        }
    }

    /// Plan for Canada Atlas Lambert coordinates.
    pub const fn projected() -> Self {
        Self {
            needs_reprojection: true,
            source_srid: Srid::CANADA_ATLAS_LAMBERT,
            target_srid: Srid::WGS84,
            ambiguous: false,
        }
    }

    const fn with_ambiguity(mut self, ambiguous: bool) -> Self {
        self.ambiguous = ambiguous;
        self
    }
}

/// Decide how a feature's geometry must be transformed.
///
/// # Examples
/// ```
/// use ridings_core::{GeometryKind, RawGeometry, Srid, plan_geometry};
/// use serde_json::json;
///
/// let projected = RawGeometry::new(
///     GeometryKind::Polygon,
///     json!([[[1500000.2, 200000.0], [1500100.0, 200000.0], [1500100.0, 200100.0], [1500000.2, 200000.0]]]),
/// );
/// let plan = plan_geometry(&projected);
/// assert!(plan.needs_reprojection);
/// assert_eq!(plan.source_srid, Srid::CANADA_ATLAS_LAMBERT);
/// ```
pub fn plan(feature: &Feature) -> TransformPlan {
    plan_geometry(&feature.geometry)
}

/// Decide how a raw geometry must be transformed.
pub fn plan_geometry(geometry: &RawGeometry) -> TransformPlan {
    let needs_reprojection =
        first_sample(&geometry.coordinates).is_some_and(|x| x.abs() > PROJECTED_MAGNITUDE_THRESHOLD);
    let base = if needs_reprojection {
        TransformPlan::projected()
    } else {
        TransformPlan::geographic()
    };
    let ambiguous = bounds_disagree(&geometry.coordinates, needs_reprojection);
    if ambiguous {
        warn!(
            "coordinate sample suggests {} but the bounding box suggests otherwise",
            base.source_srid
        );
    }
    base.with_ambiguity(ambiguous)
}

/// First scalar reached by repeatedly descending into index 0.
///
/// Returns `None` for empty arrays and for non-numeric leaves.
pub fn first_sample(coordinates: &Value) -> Option<f64> {
    let mut current = coordinates;
    while let Value::Array(items) = current {
        current = items.first()?;
    }
    current.as_f64()
}

#[derive(Debug, Default)]
struct Extent {
    positions: usize,
    out_of_range: usize,
}

impl Extent {
    fn visit(&mut self, value: &Value) {
        let Value::Array(items) = value else {
            return;
        };
        match (items.first().and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
            (Some(x), Some(y)) => {
                self.positions += 1;
                if x.abs() > PROJECTED_MAGNITUDE_THRESHOLD || y.abs() > 90.0 {
                    self.out_of_range += 1;
                }
            }
            _ => items.iter().for_each(|item| self.visit(item)),
        }
    }
}

fn bounds_disagree(coordinates: &Value, needs_reprojection: bool) -> bool {
    let mut extent = Extent::default();
    extent.visit(coordinates);
    if extent.positions == 0 {
        return false;
    }
    if needs_reprojection {
        extent.out_of_range * 2 < extent.positions
    } else {
        extent.out_of_range > 0
    }
}
