//! The load command capability the bundler is written against.

use anyhow::Result;
use std::path::Path;

use crate::{analyze, rewrite};

/// Inspect and mutate the library references embedded in a binary.
pub trait LoadCommandTool {
    /// List the references recorded in the binary, in load command order.
    fn dependencies(&self, binary: &Path) -> Result<Vec<String>>;

    /// Set a dylib's own install id.
    fn set_install_id(&self, library: &Path, new_id: &str) -> Result<()>;

    /// Replace the reference `old` with `new`.
    fn change_dependency(&self, binary: &Path, old: &str, new: &str) -> Result<()>;
}

impl<T: LoadCommandTool + ?Sized> LoadCommandTool for &T {
    fn dependencies(&self, binary: &Path) -> Result<Vec<String>> {
        (**self).dependencies(binary)
    }

    fn set_install_id(&self, library: &Path, new_id: &str) -> Result<()> {
        (**self).set_install_id(library, new_id)
    }

    fn change_dependency(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
        (**self).change_dependency(binary, old, new)
    }
}

/// Shells out to the platform's `otool` and `install_name_tool`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTools;

impl LoadCommandTool for SystemTools {
    fn dependencies(&self, binary: &Path) -> Result<Vec<String>> {
        analyze::get_library_dependencies(binary)
    }

    fn set_install_id(&self, library: &Path, new_id: &str) -> Result<()> {
        rewrite::set_install_id(library, new_id)
    }

    fn change_dependency(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
        rewrite::change_dependency(binary, old, new)
    }
}
