//! File copying utilities.

use anyhow::{Context, Result};
use std::fs::{self, File, FileTimes};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Make a file executable (chmod 755).
pub fn make_executable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
    Ok(())
}

/// Copy a file, keeping its permissions and access/modification times.
///
/// Missing parent directories of `dst` are created. Returns the number of
/// bytes copied.
pub fn copy_preserving(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let size = fs::copy(src, dst).with_context(|| {
        format!("Failed to copy {} to {}", src.display(), dst.display())
    })?;

    let meta = fs::metadata(src)
        .with_context(|| format!("Failed to read metadata: {}", src.display()))?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    // Read-only handle: package-manager dylibs are often mode 0444
    File::open(dst)
        .and_then(|f| f.set_times(times))
        .with_context(|| format!("Failed to set file times: {}", dst.display()))?;

    Ok(size)
}

/// Delete `dir` if it exists, then create it empty.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() || dir.is_symlink() {
        let removed = if dir.is_dir() && !dir.is_symlink() {
            fs::remove_dir_all(dir)
        } else {
            fs::remove_file(dir)
        };
        removed.with_context(|| format!("Failed to remove existing output: {}", dir.display()))?;
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    Ok(())
}
