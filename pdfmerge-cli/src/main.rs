//! pdfmerge - Merge whole PDF documents into a single document.
//!
//! Command-line front-end for the `pdfmerge` library: expands glob patterns,
//! reads the inputs, merges them and writes the result atomically.

mod cli;
mod output;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, OverwriteMode};
use crate::output::{OutputFormatter, display_plan, display_statistics};
use pdfmerge::error::MergeError;
use pdfmerge::io::{InputReader, OutputWriter};
use pdfmerge::merge::{CancellationFlag, MergeOutput, Merger};
use pdfmerge::utils::collect_paths_for_patterns;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err
            .downcast_ref::<MergeError>()
            .map_or(1, MergeError::exit_code);
        OutputFormatter::quiet().error(&format!("Error: {err}"));
        process::exit(code);
    }
}

/// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> anyhow::Result<()> {
    cli.validate()?;
    let options = cli.to_options()?;
    let formatter = OutputFormatter::new(cli.quiet || cli.json, cli.verbose);

    let paths = collect_paths_for_patterns(&cli.inputs)?;
    debug!(inputs = paths.len(), "resolved input paths");
    for path in &paths {
        formatter.debug(&path.display().to_string());
    }

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdfmerge::NAME, pdfmerge::VERSION));
        formatter.blank_line();
    }

    if !cli.dry_run {
        let confirm = || confirm_overwrite(io::stdin().lock());
        handle_output_overwrite(&cli.output, cli.overwrite_mode(), &formatter, confirm).await?;
    }

    formatter.info(&format!("Reading {} input file(s)...", paths.len()));
    let request = InputReader::new()
        .read_all(&paths, options.effective_jobs())
        .await?;

    let cancellation = CancellationFlag::new();
    {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancellation.cancel();
            }
        });
    }
    let merger = Merger::with_options(options).with_cancellation(cancellation);

    if cli.dry_run {
        let plan = merger.plan(&request)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        display_plan(&formatter, &plan);
        formatter.blank_line();
        formatter.success("Dry run completed successfully");
        formatter.info(&format!("  Output would be: {}", cli.output.display()));
        return Ok(());
    }

    formatter.info("Merging documents...");
    let MergeOutput { bytes, statistics } = merger.merge_async(request).await?;

    let write = OutputWriter::new()
        .write(bytes, &cli.output)
        .await?;
    info!(
        path = %write.output_path.display(),
        pages = statistics.total_pages,
        "merge complete"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&statistics)?);
    } else {
        formatter.blank_line();
        display_statistics(&formatter, &statistics, &write);
    }

    Ok(())
}

/// Decide whether an existing output file may be replaced.
///
/// `confirm` is only consulted in prompt mode outside quiet mode; quiet
/// mode treats prompt like no-clobber.
async fn handle_output_overwrite(
    path: &Path,
    mode: OverwriteMode,
    formatter: &OutputFormatter,
    confirm: impl FnOnce() -> io::Result<bool>,
) -> Result<(), MergeError> {
    if !OutputWriter::new().exists(path).await {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(MergeError::output_exists(path.to_path_buf())),
        OverwriteMode::Prompt => {
            if formatter.is_quiet() {
                return Err(MergeError::output_exists(path.to_path_buf()));
            }

            formatter.warning(&format!("Output file already exists: {}", path.display()));
            if confirm()? {
                Ok(())
            } else {
                Err(MergeError::Cancelled)
            }
        }
    }
}

/// Ask a yes/no question on stdout and read the answer from `input`.
fn confirm_overwrite(mut input: impl BufRead) -> io::Result<bool> {
    print!("Overwrite? [y/N]: ");
    io::stdout().flush()?;

    let mut response = String::new();
    input.read_line(&mut response)?;
    Ok(matches!(
        response.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
