//! Reference classification and loader-relative path construction.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Token dyld expands to the directory of the file doing the loading.
pub const LOADER_PATH: &str = "@loader_path";

/// Name of the library directory inside a bundle.
pub const LIB_DIR: &str = "lib";

/// Whether a reference points into the package-manager prefix.
///
/// This is a plain string prefix test; references like `@rpath/...` or
/// `/usr/lib/...` never match a filesystem prefix.
pub fn is_vendor_path(reference: &str, vendor_prefix: &str) -> bool {
    reference.starts_with(vendor_prefix)
}

/// Resolve every symlink in `reference` to the real file.
pub fn resolve_real_path(reference: &str) -> Result<PathBuf> {
    fs::canonicalize(reference)
        .with_context(|| format!("Failed to resolve library path: {}", reference))
}

/// Final path component as a string.
#[must_use]
pub fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Install id for a bundled library: `@loader_path/<name>`.
pub fn library_install_id(name: &str) -> String {
    format!("{}/{}", LOADER_PATH, name)
}

/// Reference used by the bundled executable: `@loader_path/lib/<name>`.
pub fn executable_reference(name: &str) -> String {
    format!("{}/{}/{}", LOADER_PATH, LIB_DIR, name)
}

/// Reference used by one bundled library to a sibling: `@loader_path/<name>`.
pub fn sibling_reference(name: &str) -> String {
    library_install_id(name)
}
