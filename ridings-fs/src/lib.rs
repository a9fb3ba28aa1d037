//! Capability-based file access for boundary inputs and store locations.
//!
//! Paths arrive as UTF-8 from configuration; every helper resolves them
//! against an ambient directory handle from `cap-std` before touching the
//! filesystem.
#![forbid(unsafe_code)]

use std::io::{self, Read};
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Read a whole UTF-8 file into memory.
pub fn read_utf8_file(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Whether `path` names an existing regular file.
///
/// A missing file or missing parent directory yields `Ok(false)`; other I/O
/// failures are returned.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let dir = match fs_utf8::Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Create the directory that will hold `path` when it does not exist yet.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (base, relative) = split_ambient_base(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// Split `dir` into an ambient base directory handle and the path below it.
pub fn split_ambient_base(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();
    let (base, relative) = match std_dir.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = dir
                .strip_prefix(&base)
                .or_else(|_| dir.strip_prefix(prefix))
                .map_err(|_| io::Error::other("failed to strip drive prefix"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = dir
                .strip_prefix(&base)
                .map_err(|_| io::Error::other("failed to strip filesystem root"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), dir.to_path_buf()),
    };
    let handle = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((handle, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn temp() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
        (dir, root)
    }

    #[rstest]
    fn reads_file_contents(temp: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = temp;
        let path = root.join("ridings.geojson");
        fs::write(&path, "{\"features\": []}").expect("write");
        assert_eq!(read_utf8_file(&path).expect("read"), "{\"features\": []}");
    }

    #[rstest]
    fn regular_file_checks(temp: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = temp;
        let file = root.join("present.geojson");
        fs::write(&file, "{}").expect("write");
        assert!(is_regular_file(&file).expect("file"));
        assert!(!is_regular_file(&root.join("absent.geojson")).expect("absent"));
        assert!(!is_regular_file(&root.join("missing/absent.geojson")).expect("no parent"));
        assert!(!is_regular_file(&root).expect("directory"));
    }

    #[rstest]
    fn creates_nested_parent_directories(temp: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = temp;
        let target = root.join("data/db/ridings.db");
        ensure_parent_dir(&target).expect("create parents");
        assert!(root.join("data/db").is_dir());
    }

    #[rstest]
    #[case("ridings.db")]
    #[case("/")]
    fn paths_without_parent_are_accepted(#[case] path: &str) {
        ensure_parent_dir(Utf8Path::new(path)).expect("no-op");
    }
}
