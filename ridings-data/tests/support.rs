//! Shared helpers for the behaviour tests.

use camino::Utf8PathBuf;
use ridings_core::Feature;
use ridings_data::read_feature_collection;

/// Directory holding the JSON fixtures.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Features of the sample collection.
pub fn sample_features() -> Vec<Feature> {
    let path = fixtures_dir().join("boundaries.geojson");
    read_feature_collection(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {path}: {err}"))
}
