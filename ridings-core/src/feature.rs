//! Source features as read from a boundary feature collection.
//!
//! A [`Feature`] pairs a heterogeneous attribute mapping with the raw,
//! still-untyped geometry. Nothing here interprets coordinates; the
//! normaliser and repair chain do that downstream.

use serde_json::{Map, Value};

/// Attribute mapping attached to a feature.
///
/// Keys are attribute names such as `FEDNAME` or `PRUID`. Values keep their
/// JSON shape so that numeric codes and text names can both be read through
/// [`Attributes::text`].
///
/// # Examples
/// ```
/// use ridings_core::Attributes;
/// use serde_json::json;
///
/// let attributes = Attributes::from_pairs([("PRUID", json!(35)), ("FEDNAME", json!("Ottawa"))]);
/// assert_eq!(attributes.text("PRUID").as_deref(), Some("35"));
/// assert_eq!(attributes.text("FEDNAME").as_deref(), Some("Ottawa"));
/// assert_eq!(attributes.text("MISSING"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Wrap an existing JSON object.
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build attributes from key/value pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }

    /// Read an attribute as a non-empty scalar string.
    ///
    /// Strings are returned verbatim and numbers in their canonical decimal
    /// form. Empty strings, booleans, nulls, arrays and objects count as
    /// absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Return the first key in `keys` that yields a value through
    /// [`Attributes::text`].
    pub fn first_text<'a, I>(&self, keys: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter().find_map(|key| self.text(key))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

/// Geometry type tag of a raw feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryKind {
    /// A single polygon with optional holes.
    Polygon,
    /// A collection of polygons.
    MultiPolygon,
    /// Any other tag; such features cannot be imported.
    Unsupported(String),
    /// The feature carried no geometry at all.
    Missing,
}

impl GeometryKind {
    /// Interpret a GeoJSON `type` tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Polygon" => Self::Polygon,
            "MultiPolygon" => Self::MultiPolygon,
            other => Self::Unsupported(other.to_owned()),
        }
    }

    /// Tag as it appears in GeoJSON.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::Unsupported(tag) => tag,
            Self::Missing => "null",
        }
    }

    /// Whether the tag names a multi-part geometry.
    pub const fn is_multi(&self) -> bool {
        matches!(self, Self::MultiPolygon)
    }
}

/// Geometry exactly as supplied by the source: a type tag and nested
/// coordinate arrays in an unknown reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGeometry {
    /// Declared geometry type.
    pub kind: GeometryKind,
    /// Nested coordinate arrays.
    pub coordinates: Value,
}

impl RawGeometry {
    /// Construct a raw geometry.
    pub fn new(kind: GeometryKind, coordinates: Value) -> Self {
        Self { kind, coordinates }
    }

    /// Placeholder for features without geometry.
    pub fn missing() -> Self {
        Self::new(GeometryKind::Missing, Value::Null)
    }
}

/// One input boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Heterogeneous source attributes.
    pub attributes: Attributes,
    /// Geometry in its source reference system.
    pub geometry: RawGeometry,
}

impl Feature {
    /// Construct a feature.
    pub fn new(attributes: Attributes, geometry: RawGeometry) -> Self {
        Self {
            attributes,
            geometry,
        }
    }
}
