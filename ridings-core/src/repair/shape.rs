//! Conversion of raw coordinate arrays into `geo` geometries.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;
use thiserror::Error;

use crate::{GeometryKind, RawGeometry};

/// Reasons a raw geometry cannot be turned into polygons.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// The feature declared a non-polygonal geometry type.
    #[error("unsupported geometry type {kind}")]
    UnsupportedType {
        /// Declared type tag.
        kind: String,
    },
    /// The coordinate arrays did not match the declared type.
    #[error("malformed {kind} coordinates: {detail}")]
    Malformed {
        /// Declared type tag.
        kind: String,
        /// What was wrong.
        detail: &'static str,
    },
}

/// Polygonal shape preserving whether the source was single- or multi-part.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Single polygon.
    Polygon(Polygon<f64>),
    /// Multi-part polygon.
    MultiPolygon(MultiPolygon<f64>),
}

impl Shape {
    /// Coerce to a multi-part geometry.
    ///
    /// A single polygon becomes a one-member collection. A multi-polygon is
    /// returned untouched so it is never wrapped twice.
    pub fn into_multi(self) -> MultiPolygon<f64> {
        match self {
            Self::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            Self::MultiPolygon(multi) => multi,
        }
    }
}

/// Parse a raw geometry into a polygonal [`Shape`].
pub fn parse_shape(raw: &RawGeometry) -> Result<Shape, ShapeError> {
    match &raw.kind {
        GeometryKind::Polygon => polygon(&raw.coordinates)
            .map(Shape::Polygon)
            .map_err(|detail| malformed(&raw.kind, detail)),
        GeometryKind::MultiPolygon => multi_polygon(&raw.coordinates)
            .map(Shape::MultiPolygon)
            .map_err(|detail| malformed(&raw.kind, detail)),
        GeometryKind::Unsupported(_) | GeometryKind::Missing => Err(ShapeError::UnsupportedType {
            kind: raw.kind.as_str().to_owned(),
        }),
    }
}

fn malformed(kind: &GeometryKind, detail: &'static str) -> ShapeError {
    ShapeError::Malformed {
        kind: kind.as_str().to_owned(),
        detail,
    }
}

fn array<'a>(value: &'a Value, detail: &'static str) -> Result<&'a [Value], &'static str> {
    value.as_array().map(Vec::as_slice).ok_or(detail)
}

fn position(value: &Value) -> Result<Coord<f64>, &'static str> {
    let items = array(value, "position is not an array")?;
    match (items.first().and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err("position needs two numeric ordinates"),
    }
}

fn ring(value: &Value) -> Result<LineString<f64>, &'static str> {
    let coords = array(value, "ring is not an array")?
        .iter()
        .map(position)
        .collect::<Result<Vec<_>, _>>()?;
    if coords.is_empty() {
        return Err("ring has no positions");
    }
    Ok(LineString::new(coords))
}

fn polygon(value: &Value) -> Result<Polygon<f64>, &'static str> {
    let mut rings = array(value, "polygon is not an array of rings")?
        .iter()
        .map(ring);
    let exterior = rings.next().ok_or("polygon has no rings")??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn multi_polygon(value: &Value) -> Result<MultiPolygon<f64>, &'static str> {
    let polygons = array(value, "multipolygon is not an array of polygons")?
        .iter()
        .map(polygon)
        .collect::<Result<Vec<_>, _>>()?;
    if polygons.is_empty() {
        return Err("multipolygon has no polygons");
    }
    Ok(MultiPolygon::new(polygons))
}
