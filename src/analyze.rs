//! Mach-O dependency listing using otool.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

static DEPENDENCY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\S+)\s+\(compatibility version").expect("dependency pattern is valid")
});

/// Extract the load commands of a Mach-O binary using `otool -L`.
///
/// For a dylib the first entry is the library's own install id, exactly as
/// otool prints it.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - `otool` is not installed (install the Xcode command line tools)
/// - `otool` exits non-zero, e.g. because the file is not a Mach-O binary
#[must_use = "library dependencies should be processed"]
pub fn get_library_dependencies(binary_path: &Path) -> Result<Vec<String>> {
    // Check file exists first for a clear error message
    if !binary_path.exists() {
        bail!("File does not exist: {}", binary_path.display());
    }

    let output = Command::new("otool")
        .arg("-L")
        .arg(binary_path)
        .output()
        .context("otool command not found - install the Xcode command line tools")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("otool failed on {}: {}", binary_path.display(), stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_otool_output(&stdout))
}

/// Parse `otool -L` output into the listed library paths.
///
/// Example otool output:
/// ```text
/// /opt/homebrew/bin/rsync:
///         /opt/homebrew/opt/openssl@3/lib/libcrypto.3.dylib (compatibility version 3.0.0, current version 3.0.0)
///         /usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1345.100.2)
/// ```
pub fn parse_otool_output(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| DEPENDENCY_LINE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_otool_output() {
        let output = "/opt/homebrew/bin/rsync:
\t/opt/homebrew/opt/openssl@3/lib/libcrypto.3.dylib (compatibility version 3.0.0, current version 3.0.0)
\t/opt/homebrew/opt/xxhash/lib/libxxhash.0.dylib (compatibility version 0.8.0, current version 0.8.2)
\t/usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1345.100.2)
";
        let libs = parse_otool_output(output);
        assert_eq!(
            libs,
            vec![
                "/opt/homebrew/opt/openssl@3/lib/libcrypto.3.dylib",
                "/opt/homebrew/opt/xxhash/lib/libxxhash.0.dylib",
                "/usr/lib/libSystem.B.dylib",
            ]
        );
    }

    #[test]
    fn test_parse_skips_header_even_if_it_matches() {
        let output = "  /weird/header (compatibility version 1.0.0, current version 1.0.0)
\t/usr/lib/libz.1.dylib (compatibility version 1.0.0, current version 1.2.12)
";
        assert_eq!(parse_otool_output(output), vec!["/usr/lib/libz.1.dylib"]);
    }

    #[test]
    fn test_parse_ignores_malformed_lines() {
        let output = "/tmp/libfoo.dylib:
\t@loader_path/libfoo.dylib (compatibility version 1.0.0, current version 1.0.0)
no leading whitespace (compatibility version 1.0.0)
\t/usr/lib/libbar.dylib
\t/opt/homebrew/lib/libbaz.dylib (current version 2.0.0)
";
        assert_eq!(parse_otool_output(output), vec!["@loader_path/libfoo.dylib"]);
    }

    #[test]
    fn test_parse_otool_empty() {
        assert!(parse_otool_output("").is_empty());
        assert!(parse_otool_output("/tmp/not-macho: is not an object file").is_empty());
    }
}
