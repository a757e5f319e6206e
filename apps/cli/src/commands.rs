//! CLI definition, tracing setup, and the generate command.

use std::path::PathBuf;

use advisorygen_core::pipeline::{GenerateSummary, generate};
use advisorygen_shared::{GeneratorConfig, RunConfig, load_config_from};
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// advisorygen — build security advisory pages and listings from JSON records.
#[derive(Parser)]
#[command(
    name = "advisorygen",
    version,
    about = "Generate security advisory pages, listing fragments, and the sidebar \
             from advisory records.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Advisory records root (contains desktop/, mobile/, server/).
    pub input: PathBuf,

    /// Website root; files are written below <OUTPUT>/advisories/.
    pub output: PathBuf,

    /// Generator settings file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Page template (defaults to <INPUT>/advisory-template.<ext>).
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Diagnostics go to stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "advisorygen=info",
        1 => "advisorygen=debug",
        _ => "advisorygen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Resolve configuration and run the generator.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let generator = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => GeneratorConfig::default(),
    };

    if !cli.input.is_dir() {
        return Err(eyre!(
            "advisory directory '{}' does not exist or is not a directory",
            cli.input.display()
        ));
    }

    let config = RunConfig::new(cli.input, cli.output, cli.template, generator)?;

    info!(
        input = %config.input_root.display(),
        output = %config.output_root.display(),
        template = %config.template_path.display(),
        "generating advisories"
    );

    let summary = generate(&config)?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &GenerateSummary) {
    println!();
    for line in summary_lines(summary) {
        println!("{line}");
    }
    println!();
}

/// Summary lines: pages generated against record files discovered, then the
/// reasons for the difference.
fn summary_lines(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "  Advisories generated: {}/{}",
            summary.generated, summary.discovered
        ),
        format!("  Records loaded:       {}", summary.loaded),
        format!("  Skipped files:        {}", summary.skipped),
        format!("  Failed validation:    {}", summary.failures.len()),
    ];
    for failure in &summary.failures {
        lines.push(format!("    - {failure}"));
    }
    lines.push(format!("  Files written:        {}", summary.files.len()));
    lines.push(format!(
        "  Time:                 {:.2}s",
        summary.elapsed.as_secs_f64()
    ));
    lines
}
