//! BDD harness (cucumber-rs).
//!
//! Scenarios live in `features/` and drive the `manifold` binary against
//! scratch copies of the fixture projects under `tests/fixtures/`.

use camino::{Utf8Path, Utf8PathBuf};

/// Root of the shared fixture projects.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures")
}
