//! Error conditions callers may want to match on.
//!
//! Everything else is reported as a plain `anyhow` error with context.
//! These travel inside `anyhow::Error` and can be recovered with
//! `downcast_ref::<BundleError>()`.

use std::path::PathBuf;
use thiserror::Error;

/// Bundling failures with a dedicated meaning.
#[derive(Error, Debug)]
pub enum BundleError {
    /// The executable to bundle is not installed.
    #[error("source binary not found: {} (install it first, e.g. `brew install rsync`)", path.display())]
    SourceMissing {
        /// Path that was checked.
        path: PathBuf,
    },

    /// Two different real files resolve to the same library file name.
    #[error(
        "library name collision for {name}: {} and {} are different files",
        existing.display(),
        incoming.display()
    )]
    NameCollision {
        /// Shared file name.
        name: String,
        /// Real path already copied into the bundle.
        existing: PathBuf,
        /// Real path that would have replaced it.
        incoming: PathBuf,
    },
}
