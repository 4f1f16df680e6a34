//! Bundle configuration.

use std::path::{Path, PathBuf};

/// Default executable to bundle.
pub const DEFAULT_SOURCE: &str = "/opt/homebrew/bin/rsync";

/// Default package-manager install prefix.
pub const DEFAULT_VENDOR_PREFIX: &str = "/opt/homebrew/";

/// Default bundle root, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "vendor/rsync";

/// What to bundle, which references count as vendored, and where to put it.
///
/// The bundled executable keeps the source's file name, so the default
/// source lands at `<output_root>/rsync`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    /// Executable to bundle. Never modified.
    pub source_path: PathBuf,
    /// References starting with this string are copied into the bundle.
    pub vendor_prefix: String,
    /// Bundle root. Deleted and recreated on every run.
    pub output_root: PathBuf,
    /// Fail instead of warning when two different files share a name.
    pub strict_names: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE),
            vendor_prefix: DEFAULT_VENDOR_PREFIX.to_string(),
            output_root: PathBuf::from(DEFAULT_OUTPUT),
            strict_names: false,
        }
    }
}

impl BundleConfig {
    /// Start from the defaults with a different source binary.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            ..Self::default()
        }
    }

    pub fn with_vendor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.vendor_prefix = prefix.into();
        self
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_strict_names(mut self, strict: bool) -> Self {
        self.strict_names = strict;
        self
    }

    /// Directory holding the copied libraries.
    pub fn lib_dir(&self) -> PathBuf {
        self.output_root.join(crate::paths::LIB_DIR)
    }

    /// Where the executable lands: the bundle root plus the source's file name.
    pub fn executable_path(&self) -> PathBuf {
        let name = self
            .source_path
            .file_name()
            .unwrap_or_else(|| Path::new("rsync").as_os_str());
        self.output_root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = BundleConfig::default();
        assert_eq!(config.executable_path(), PathBuf::from("vendor/rsync/rsync"));
        assert_eq!(config.lib_dir(), PathBuf::from("vendor/rsync/lib"));
        assert_eq!(config.vendor_prefix, "/opt/homebrew/");
        assert!(!config.strict_names);
    }

    #[test]
    fn test_builder_overrides() {
        let config = BundleConfig::new("/usr/local/bin/ffmpeg")
            .with_vendor_prefix("/usr/local/")
            .with_output_root("/tmp/bundle")
            .with_strict_names(true);
        assert_eq!(config.executable_path(), PathBuf::from("/tmp/bundle/ffmpeg"));
        assert_eq!(config.lib_dir(), PathBuf::from("/tmp/bundle/lib"));
        assert_eq!(config.vendor_prefix, "/usr/local/");
        assert!(config.strict_names);
    }
}
