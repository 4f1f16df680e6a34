//! Load path rewriting using install_name_tool.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Set the install id of a dylib (`install_name_tool -id`).
pub fn set_install_id(library: &Path, new_id: &str) -> Result<()> {
    run_install_name_tool(library, &["-id", new_id])
}

/// Replace one load command reference of a binary (`install_name_tool -change`).
///
/// install_name_tool rejects the call if `old` is not one of the binary's
/// references.
pub fn change_dependency(binary: &Path, old: &str, new: &str) -> Result<()> {
    run_install_name_tool(binary, &["-change", old, new])
}

fn run_install_name_tool(target: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("install_name_tool")
        .args(args)
        .arg(target)
        .output()
        .context("install_name_tool command not found - install the Xcode command line tools")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "install_name_tool {} failed on {}: {}",
            args.join(" "),
            target.display(),
            stderr.trim()
        );
    }

    Ok(())
}
