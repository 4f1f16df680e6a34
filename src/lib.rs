//! Mach-O dylib bundling utilities.
//!
//! Copies an executable plus every shared library it pulls in from a
//! package-manager prefix (Homebrew's `/opt/homebrew/` by default) into a
//! flat, relocatable directory, then rewrites load paths with `otool -L` and
//! `install_name_tool` so nothing points back at the prefix. Libraries
//! outside the prefix are treated as system libraries and left alone.

mod analyze;
mod bundle;
mod config;
mod copy;
mod error;
mod paths;
mod rewrite;
mod tool;

pub use analyze::{get_library_dependencies, parse_otool_output};
pub use bundle::{BundleReport, Bundler, CopiedLibrary, UnbundledReference};
pub use config::{BundleConfig, DEFAULT_OUTPUT, DEFAULT_SOURCE, DEFAULT_VENDOR_PREFIX};
pub use copy::{copy_preserving, make_executable, recreate_dir};
pub use error::BundleError;
pub use paths::{
    executable_reference, is_vendor_path, library_install_id, resolve_real_path,
    sibling_reference, LIB_DIR, LOADER_PATH,
};
pub use rewrite::{change_dependency, set_install_id};
pub use tool::{LoadCommandTool, SystemTools};
