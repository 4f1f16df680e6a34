//! dylib-bundle CLI entry point.

use clap::Parser;
use dylib_bundle::{
    BundleConfig, BundleError, Bundler, SystemTools, DEFAULT_OUTPUT, DEFAULT_SOURCE,
    DEFAULT_VENDOR_PREFIX,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bundle an executable and its package-manager dylibs into a relocatable directory.
#[derive(Parser, Debug)]
#[command(name = "dylib-bundle")]
#[command(version)]
struct Cli {
    /// Executable to bundle.
    #[arg(long, env = "DYLIB_BUNDLE_SOURCE", default_value = DEFAULT_SOURCE)]
    source: PathBuf,

    /// Dependencies whose path starts with this prefix are copied into the bundle.
    #[arg(long, env = "DYLIB_BUNDLE_VENDOR_PREFIX", default_value = DEFAULT_VENDOR_PREFIX)]
    vendor_prefix: String,

    /// Bundle directory. Deleted and rebuilt on every run.
    #[arg(long, env = "DYLIB_BUNDLE_OUTPUT", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Fail when two different libraries share a file name.
    #[arg(long)]
    strict_names: bool,
}

fn main() {
    let cli = Cli::parse();

    init_logging();

    let config = BundleConfig::new(cli.source)
        .with_vendor_prefix(cli.vendor_prefix)
        .with_output_root(cli.output)
        .with_strict_names(cli.strict_names);

    tracing::debug!(?config, "starting dylib-bundle");

    let bundler = Bundler::new(config, SystemTools);
    let report = match bundler.run() {
        Ok(report) => report,
        Err(e) => {
            match e.downcast_ref::<BundleError>() {
                Some(missing) if matches!(missing, BundleError::SourceMissing { .. }) => {
                    eprintln!("{}", missing);
                }
                _ => {
                    tracing::error!(error = %e, "bundle failed");
                    eprintln!("Error: {:#}", e);
                }
            }
            std::process::exit(1);
        }
    };

    match bundler.verify(&report) {
        Ok(leftovers) => {
            for leftover in leftovers {
                tracing::warn!(
                    file = %leftover.file.display(),
                    reference = %leftover.reference,
                    "vendored reference left unbundled"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to verify bundle"),
    }

    let exe_name = report
        .executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("bundled {} into: {}", exe_name, report.root.display());
}

/// Initialize the tracing subscriber.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dylib_bundle=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
