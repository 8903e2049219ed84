use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::KeyPaths;

/// Path to a key fixture under `testdata/`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

/// Key paths pointing at the fixture signing and encryption keys.
pub fn fixture_key_paths() -> KeyPaths {
    KeyPaths::new(
        fixture_path("signing_private.pem"),
        fixture_path("encryption_public.pem"),
    )
}

/// Fixture file content as a string.
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("read fixture")
}

/// Write `contents` into a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped, so callers
/// must keep it alive for as long as they use the path.
pub fn write_temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write temp file");
    (dir, path)
}
