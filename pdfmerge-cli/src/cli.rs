//! CLI argument parsing for pdfmerge.
//!
//! This module defines the command-line interface structure using `clap`
//! and turns the parsed flags into [`MergeOptions`]. It only depends on
//! `clap`, `pdfmerge` and the standard library, so the build script can
//! include it to render the man page.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use pdfmerge::config::{CompressionLevel, MergeOptions, Metadata};
use pdfmerge::error::{MergeError, Result};

/// Behavior when the output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before overwriting.
    #[default]
    Prompt,
    /// Overwrite without asking.
    Force,
    /// Never overwrite; fail instead.
    NoClobber,
}

/// Merge whole PDF documents into a single document.
///
/// Every page of every input is copied into a new, self-contained PDF in
/// the order the inputs are given. Inputs are validated before anything is
/// written; the first invalid input aborts the merge.
#[derive(Parser, Debug)]
#[command(name = "pdfmerge")]
#[command(version)]
#[command(about = "Merge whole PDF documents into a single document", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input PDF files to merge (in order)
    ///
    /// Specify multiple files or use glob patterns. Files matched by a
    /// pattern are merged in the order the pattern yields them.
    ///
    /// Examples:
    ///   pdfmerge a.pdf b.pdf -o merged.pdf
    ///   pdfmerge 'chapters/*.pdf' -o book.pdf
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Validate inputs and show what would be merged without writing output
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output - show details about each input and the result
    ///
    /// Also raises the log level to debug unless RUST_LOG is set.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Overwrite an existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite an existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Add one bookmark per input document, titled with its file name
    #[arg(short, long)]
    pub bookmarks: bool,

    /// Compression level for output PDF
    ///
    /// - none: write objects as copied
    /// - standard: compress uncompressed streams (default)
    /// - maximum: standard plus removal of unreachable objects
    #[arg(short, long, value_name = "LEVEL")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: Option<String>,

    /// Set title metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for output PDF (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Number of input files read and validated concurrently
    ///
    /// Default is the number of CPU cores.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Skip re-parsing the output before it is written
    #[arg(long)]
    pub no_verify: bool,

    /// Load merge options from a JSON file
    ///
    /// Flags given on the command line override values from the file.
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Print the merge statistics (or the dry-run plan) as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Validate CLI arguments before any file is touched.
    ///
    /// # Errors
    ///
    /// Returns an error if no inputs are given, the job count is zero, or
    /// the compression level is unknown.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(MergeError::InsufficientInput);
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(MergeError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if let Some(ref level) = self.compression {
            CompressionLevel::from_str(level)?;
        }

        Ok(())
    }

    /// Resolve the overwrite mode from `--force` and `--no-clobber`.
    pub fn overwrite_mode(&self) -> OverwriteMode {
        if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        }
    }

    /// Build the merge options.
    ///
    /// Starts from the `--options` file when one is given (or the defaults)
    /// and applies every flag that was set on the command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the options file cannot be read or parsed, or if
    /// the resulting options are invalid.
    pub fn to_options(&self) -> Result<MergeOptions> {
        let mut options = match self.options {
            Some(ref path) => {
                let json = std::fs::read_to_string(path).map_err(|source| {
                    MergeError::ReadInput {
                        path: path.clone(),
                        source,
                    }
                })?;
                MergeOptions::from_json(&json)?
            }
            None => MergeOptions::default(),
        };

        if let Some(ref level) = self.compression {
            options.compression = CompressionLevel::from_str(level)?;
        }

        if self.bookmarks {
            options.bookmarks = true;
        }

        if self.no_verify {
            options.verify_output = false;
        }

        if self.jobs.is_some() {
            options.jobs = self.jobs;
        }

        let flags = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );
        let metadata = &mut options.metadata;
        metadata.title = flags.title.or(metadata.title.take());
        metadata.author = flags.author.or(metadata.author.take());
        metadata.subject = flags.subject.or(metadata.subject.take());
        metadata.keywords = flags.keywords.or(metadata.keywords.take());

        options.validate()?;
        Ok(options)
    }
}
