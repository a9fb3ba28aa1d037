//! Test helpers for writing boundary collections into a scratch workspace.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

const COLLECTION: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature",
     "properties": {"FEDNAME": "Ottawa Centre", "PRUID": "35", "FEDUID": "35075"},
     "geometry": {"type": "Polygon", "coordinates": [[[-75.72, 45.38], [-75.68, 45.38], [-75.68, 45.42], [-75.72, 45.42], [-75.72, 45.38]]]}},
    {"type": "Feature",
     "properties": {"FEDNAME": "Ottawa Centre", "PRUID": "35", "FEDUID": "35076"},
     "geometry": {"type": "Polygon", "coordinates": [[[-75.72, 45.38], [-75.68, 45.38], [-75.68, 45.42], [-75.72, 45.42], [-75.72, 45.38]]]}},
    {"type": "Feature",
     "properties": {"FEDNAME": "Bowtie Riding", "PRUID": "47", "FEDUID": "47001"},
     "geometry": {"type": "Polygon", "coordinates": [[[-100.0, 50.0], [-99.0, 51.0], [-99.0, 50.0], [-100.0, 51.0], [-100.0, 50.0]]]}},
    {"type": "Feature",
     "properties": {"FEDNAME": "Broken Riding", "PRUID": "24", "FEDUID": "24001"},
     "geometry": {"type": "Point", "coordinates": [-73.6, 45.5]}}
  ]
}"#;

/// Scratch directory holding a boundary collection.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        write_utf8(&root.join("ridings.geojson"), COLLECTION.as_bytes());
        Self { _dir: dir, root }
    }

    pub(super) fn source(&self) -> Utf8PathBuf {
        self.root.join("ridings.geojson")
    }

    /// Database path inside a directory that does not exist yet.
    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("db/ridings.db")
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write fixture");
}

pub(super) fn output_text(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).expect("utf-8 output")
}
