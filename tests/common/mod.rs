use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Write `content` to `name` inside a fresh temporary directory. The caller
/// must hold onto `TempDir` to keep the file alive.
pub fn write_report(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// Path to a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
