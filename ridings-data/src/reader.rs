//! Reading boundary feature collections.
//!
//! A collection is decoded leniently per feature: properties that are not an
//! object become empty attributes and a missing or non-object geometry becomes
//! [`RawGeometry::missing`], so the pipeline can fail that feature on its own.
//! Only a document that is not a collection at all is rejected.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use ridings_core::{Attributes, Feature, GeometryKind, RawGeometry};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised before any feature is processed.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input path does not name a regular file.
    #[error("boundary file {path} does not exist")]
    Missing {
        /// Path that was requested.
        path: Utf8PathBuf,
    },
    /// The file exists but could not be read.
    #[error("failed to read boundary file {path}")]
    Read {
        /// Path that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not a feature collection.
    #[error("boundary file {path} is not a feature collection")]
    Malformed {
        /// Path that was requested.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct CollectionDocument {
    features: Vec<FeatureDocument>,
}

#[derive(Debug, Deserialize)]
struct FeatureDocument {
    #[serde(default)]
    properties: Value,
    #[serde(default)]
    geometry: Value,
}

impl FeatureDocument {
    fn into_feature(self) -> Feature {
        let attributes = match self.properties {
            Value::Object(map) => Attributes::new(map),
            _ => Attributes::default(),
        };
        Feature::new(attributes, geometry_from_value(self.geometry))
    }
}

fn geometry_from_value(value: Value) -> RawGeometry {
    let Value::Object(mut object) = value else {
        return RawGeometry::missing();
    };
    let kind = match object.get("type") {
        Some(Value::String(tag)) => GeometryKind::from_tag(tag),
        Some(_) | None => return RawGeometry::missing(),
    };
    let coordinates = object.remove("coordinates").unwrap_or(Value::Null);
    RawGeometry::new(kind, coordinates)
}

/// Decode a feature collection from JSON text.
///
/// # Examples
/// ```
/// use ridings_data::parse_feature_collection;
///
/// let features = parse_feature_collection(r#"{"features": [{"properties": {"FEDNAME": "Nunavut"}}]}"#)
///     .expect("collection");
/// assert_eq!(features.len(), 1);
/// ```
pub fn parse_feature_collection(text: &str) -> Result<Vec<Feature>, serde_json::Error> {
    let document: CollectionDocument = serde_json::from_str(text)?;
    Ok(document
        .features
        .into_iter()
        .map(FeatureDocument::into_feature)
        .collect())
}

/// Read and decode the feature collection at `path`.
pub fn read_feature_collection(path: &Utf8Path) -> Result<Vec<Feature>, InputError> {
    let present = ridings_fs::is_regular_file(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if !present {
        return Err(InputError::Missing {
            path: path.to_path_buf(),
        });
    }
    let text = ridings_fs::read_utf8_file(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let features = parse_feature_collection(&text).map_err(|source| InputError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    info!("read {} features from {path}", features.len());
    Ok(features)
}
