use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use jacoco2cobertura::{cobertura, ingest, writer};

/// jacoco2cobertura — Convert a JaCoCo XML coverage report to Cobertura
/// format on stdout.
#[derive(Parser)]
#[command(name = "jacoco2cobertura", version, about)]
struct Cli {
    /// Path to the JaCoCo XML report, or `-` to read from stdin.
    report: PathBuf,

    /// Source root prefixed onto derived source file paths.
    #[arg(default_value = ".")]
    source_root: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let report = ingest::load(&cli.report)
        .with_context(|| format!("Failed to read JaCoCo report from {}", cli.report.display()))?;

    let coverage = cobertura::convert(&report, &cli.source_root);

    let stdout = io::stdout().lock();
    writer::write(&coverage, stdout).context("Failed to write Cobertura report")?;
    Ok(())
}
