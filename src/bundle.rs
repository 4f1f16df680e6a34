//! Bundling an executable and its vendored dylibs into one directory.
//!
//! A run has three phases:
//!
//! 1. Copy the executable into a freshly created bundle root.
//! 2. Walk the dependency closure, copying every vendor-prefixed library
//!    flat into `lib/`, deduplicated by the real file's name.
//! 3. Point every copied library's install id and every vendored reference
//!    at `@loader_path`, so the bundle works wherever it is moved.
//!
//! References outside the vendor prefix are system libraries and are left
//! exactly as they were.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::BundleConfig;
use crate::copy::{copy_preserving, make_executable, recreate_dir};
use crate::error::BundleError;
use crate::paths::{
    executable_reference, file_name, is_vendor_path, library_install_id, resolve_real_path,
    sibling_reference,
};
use crate::tool::LoadCommandTool;

/// A library copied into the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedLibrary {
    /// Real (symlink-free) path it was copied from.
    pub source: PathBuf,
    /// Path inside the bundle's library directory.
    pub dest: PathBuf,
}

/// Result of a completed bundle run.
#[derive(Debug, Clone)]
pub struct BundleReport {
    pub root: PathBuf,
    pub executable: PathBuf,
    /// Copied libraries keyed by file name.
    pub libraries: BTreeMap<String, CopiedLibrary>,
}

/// A vendored reference still embedded in a bundled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbundledReference {
    pub file: PathBuf,
    pub reference: String,
}

/// Builds a bundle for one [`BundleConfig`] using a [`LoadCommandTool`].
pub struct Bundler<T> {
    config: BundleConfig,
    tool: T,
}

impl<T: LoadCommandTool> Bundler<T> {
    pub fn new(config: BundleConfig, tool: T) -> Self {
        Self { config, tool }
    }

    /// Build the bundle from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::SourceMissing`] before touching the filesystem
    /// if the source binary does not exist. Any other failure aborts the
    /// run and leaves whatever was already written in place.
    pub fn run(&self) -> Result<BundleReport> {
        let source = &self.config.source_path;
        if !source.exists() {
            return Err(BundleError::SourceMissing {
                path: source.clone(),
            }
            .into());
        }

        let root = &self.config.output_root;
        recreate_dir(root)?;
        let lib_dir = self.config.lib_dir();
        std::fs::create_dir_all(&lib_dir)
            .with_context(|| format!("Failed to create directory: {}", lib_dir.display()))?;

        let executable = self.config.executable_path();
        copy_preserving(source, &executable)?;
        make_executable(&executable)?;
        info!(source = %source.display(), bundle = %root.display(), "copied executable");

        let libraries = self.collect(&executable)?;
        info!(count = libraries.len(), "collected vendored libraries");

        self.rewrite(&executable, &libraries)?;
        info!("rewrote load paths");

        Ok(BundleReport {
            root: root.clone(),
            executable,
            libraries,
        })
    }

    /// Copy the vendored dependency closure of `executable` into the
    /// library directory.
    pub fn collect(&self, executable: &Path) -> Result<BTreeMap<String, CopiedLibrary>> {
        let lib_dir = self.config.lib_dir();
        let mut copied: BTreeMap<String, CopiedLibrary> = BTreeMap::new();
        let mut queue = vec![executable.to_path_buf()];

        while let Some(target) = queue.pop() {
            for dep in self.tool.dependencies(&target)? {
                if !is_vendor_path(&dep, &self.config.vendor_prefix) {
                    continue;
                }
                // A stale reference (e.g. an install id naming a removed
                // Cellar version) still counts by its own file name
                let resolved = resolve_real_path(&dep).ok();
                let name = resolved
                    .as_deref()
                    .and_then(file_name)
                    .or_else(|| file_name(Path::new(&dep)))
                    .with_context(|| format!("Library path has no file name: {}", dep))?;

                if let Some(existing) = copied.get(&name) {
                    if let Some(real) = resolved.as_ref().filter(|r| **r != existing.source) {
                        self.name_collision(&name, &existing.source, real)?;
                    }
                    continue;
                }

                let real = resolved.unwrap_or_else(|| PathBuf::from(&dep));
                let dest = lib_dir.join(&name);
                copy_preserving(&real, &dest)?;
                make_executable(&dest)?;
                debug!(library = %name, from = %real.display(), referenced_by = %target.display(), "copied library");

                queue.push(dest.clone());
                copied.insert(name, CopiedLibrary { source: real, dest });
            }
        }

        Ok(copied)
    }

    /// Rewrite install ids and vendored references of the bundled files.
    ///
    /// References are re-read from the copies, not reused from
    /// [`collect`](Self::collect).
    pub fn rewrite(
        &self,
        executable: &Path,
        libraries: &BTreeMap<String, CopiedLibrary>,
    ) -> Result<()> {
        for (name, library) in libraries {
            let id = library_install_id(name);
            self.tool.set_install_id(&library.dest, &id)?;
            debug!(library = %name, id = %id, "set install id");
        }

        let targets = std::iter::once((executable, true))
            .chain(libraries.values().map(|lib| (lib.dest.as_path(), false)));

        for (target, is_executable) in targets {
            for dep in self.tool.dependencies(target)? {
                if !is_vendor_path(&dep, &self.config.vendor_prefix) {
                    continue;
                }
                let Some(name) = bundled_name(&dep).filter(|n| libraries.contains_key(n)) else {
                    continue;
                };
                let new = if is_executable {
                    executable_reference(&name)
                } else {
                    sibling_reference(&name)
                };
                self.tool.change_dependency(target, &dep, &new)?;
                debug!(file = %target.display(), old = %dep, new = %new, "rewrote reference");
            }
        }

        Ok(())
    }

    /// List vendored references still present in a finished bundle.
    ///
    /// Empty for every bundle whose closure was copied completely.
    pub fn verify(&self, report: &BundleReport) -> Result<Vec<UnbundledReference>> {
        let files = std::iter::once(&report.executable)
            .chain(report.libraries.values().map(|lib| &lib.dest));

        let mut leftovers = Vec::new();
        for file in files {
            for dep in self.tool.dependencies(file)? {
                if is_vendor_path(&dep, &self.config.vendor_prefix) {
                    leftovers.push(UnbundledReference {
                        file: file.clone(),
                        reference: dep,
                    });
                }
            }
        }
        Ok(leftovers)
    }

    fn name_collision(&self, name: &str, existing: &Path, incoming: &Path) -> Result<()> {
        if self.config.strict_names {
            return Err(BundleError::NameCollision {
                name: name.to_string(),
                existing: existing.to_path_buf(),
                incoming: incoming.to_path_buf(),
            }
            .into());
        }
        warn!(
            library = %name,
            kept = %existing.display(),
            dropped = %incoming.display(),
            "two different libraries share a file name, keeping the first"
        );
        Ok(())
    }
}

/// File name a reference was bundled under.
///
/// Falls back to the reference's own file name when it no longer resolves.
fn bundled_name(reference: &str) -> Option<String> {
    resolve_real_path(reference)
        .ok()
        .and_then(|real| file_name(&real))
        .or_else(|| file_name(Path::new(reference)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Fails on every call; for paths that must not reach the tool.
    struct Unreachable;

    impl LoadCommandTool for Unreachable {
        fn dependencies(&self, binary: &Path) -> Result<Vec<String>> {
            bail!("unexpected otool call on {}", binary.display())
        }

        fn set_install_id(&self, library: &Path, _: &str) -> Result<()> {
            bail!("unexpected install_name_tool call on {}", library.display())
        }

        fn change_dependency(&self, binary: &Path, _: &str, _: &str) -> Result<()> {
            bail!("unexpected install_name_tool call on {}", binary.display())
        }
    }

    #[test]
    fn test_missing_source_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("vendor/rsync");
        let config = BundleConfig::new(temp.path().join("missing/rsync")).with_output_root(&out);

        let err = Bundler::new(config, Unreachable).run().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BundleError>(),
            Some(BundleError::SourceMissing { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_bundled_name_falls_back_to_reference() {
        assert_eq!(
            bundled_name("/nonexistent/opt/zstd/lib/libzstd.1.dylib").as_deref(),
            Some("libzstd.1.dylib")
        );
    }

    /// Reports the same vendored reference for every file and records edits.
    #[derive(Default)]
    struct Recording {
        ids: RefCell<Vec<PathBuf>>,
        changes: RefCell<Vec<String>>,
    }

    impl LoadCommandTool for Recording {
        fn dependencies(&self, _: &Path) -> Result<Vec<String>> {
            Ok(vec!["/opt/homebrew/lib/libX.dylib".to_string()])
        }

        fn set_install_id(&self, library: &Path, _: &str) -> Result<()> {
            self.ids.borrow_mut().push(library.to_path_buf());
            Ok(())
        }

        fn change_dependency(&self, _: &Path, old: &str, _: &str) -> Result<()> {
            self.changes.borrow_mut().push(old.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_rewrite_leaves_unrecorded_vendor_references() {
        let tools = Recording::default();
        let bundler = Bundler::new(BundleConfig::default(), &tools);
        let exe = Path::new("/tmp/bundle/rsync");

        bundler.rewrite(exe, &BTreeMap::new()).unwrap();
        assert!(tools.changes.borrow().is_empty());

        let mut libraries = BTreeMap::new();
        libraries.insert(
            "libY.dylib".to_string(),
            CopiedLibrary {
                source: PathBuf::from("/opt/homebrew/lib/libY.dylib"),
                dest: PathBuf::from("/tmp/bundle/lib/libY.dylib"),
            },
        );
        bundler.rewrite(exe, &libraries).unwrap();

        assert!(tools.changes.borrow().is_empty());
        assert_eq!(
            *tools.ids.borrow(),
            vec![PathBuf::from("/tmp/bundle/lib/libY.dylib")]
        );
    }

    #[test]
    fn test_rewrite_with_no_libraries_only_reads_executable() {
        struct NoDeps;
        impl LoadCommandTool for NoDeps {
            fn dependencies(&self, _: &Path) -> Result<Vec<String>> {
                Ok(vec!["/usr/lib/libSystem.B.dylib".to_string()])
            }
            fn set_install_id(&self, _: &Path, _: &str) -> Result<()> {
                bail!("no libraries to rename")
            }
            fn change_dependency(&self, _: &Path, _: &str, _: &str) -> Result<()> {
                bail!("system references stay untouched")
            }
        }

        let bundler = Bundler::new(BundleConfig::default(), NoDeps);
        bundler
            .rewrite(Path::new("/tmp/rsync"), &BTreeMap::new())
            .unwrap();
    }
}
