//! Message formatting and display.
//!
//! Human-readable output for the CLI, with support for quiet and verbose
//! modes. Diagnostics go through `tracing`; this module only prints what the
//! user asked to see.

use pdfmerge::io::WriteStatistics;
use pdfmerge::merge::{MergePlan, MergeStatistics};
use pdfmerge::utils::format_file_size;
use std::io;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Debug/verbose message.
    Debug,
}

/// Output formatter with configurable verbosity.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    /// Whether to suppress non-error output.
    quiet: bool,
    /// Whether to show verbose output.
    verbose: bool,
    /// Whether to use colored output.
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: Self::should_use_color(),
        }
    }

    /// Create a quiet formatter (only errors).
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Returns true if stdout is a TTY and TERM is set.
    fn should_use_color() -> bool {
        use std::io::IsTerminal;
        io::stdout().is_terminal() && std::env::var("TERM").is_ok()
    }

    /// Print an informational message. Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message. Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message, even in quiet mode.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message to stderr.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    /// Print a message only in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.verbose {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let line = self.render(level, message);
        if level == MessageLevel::Error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn render(&self, level: MessageLevel, message: &str) -> String {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"), // Green
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"), // Yellow
            MessageLevel::Error => ("✗ ", "\x1b[31m"),   // Red
            MessageLevel::Debug => ("→ ", "\x1b[36m"),   // Cyan
        };

        if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        }
    }

    /// Print a section header. Suppressed in quiet mode.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{title}");
        }
    }

    /// Print a labelled value. Only shown in verbose mode.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose {
            println!("  {label}: {value}");
        }
    }

    /// Print a numbered list item. Suppressed in quiet mode.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            println!("  {index}. {message}");
        }
    }

    /// Print a blank line. Suppressed in quiet mode.
    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }

    /// Check if output should be shown.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    /// Check if verbose output should be shown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// One line describing a planned input, e.g. `a.pdf: 3 pages, 1.2 KB, PDF 1.5`.
pub fn describe_planned(label: &str, pages: usize, bytes: usize, version: Option<(u8, u8)>) -> String {
    let pages = match pages {
        1 => "1 page".to_string(),
        n => format!("{n} pages"),
    };
    let version = match version {
        Some((major, minor)) => format!("PDF {major}.{minor}"),
        None => "unknown version".to_string(),
    };
    format!("{label}: {pages}, {}, {version}", format_file_size(bytes as u64))
}

/// Display a dry-run plan.
pub fn display_plan(formatter: &OutputFormatter, plan: &MergePlan) {
    for document in &plan.documents {
        let summary = &document.summary;
        let label = document
            .label
            .clone()
            .unwrap_or_else(|| format!("Document {}", document.index + 1));

        formatter.list_item(
            document.index + 1,
            &describe_planned(&label, summary.page_count, summary.byte_len, summary.version),
        );
        formatter.detail("Objects", &summary.object_count.to_string());
        if let Some((width, height)) = summary.page_dimensions {
            formatter.detail("First page", &format!("{width:.0} x {height:.0} pt"));
        }
        if let Some(ref title) = summary.title {
            formatter.detail("Title", title);
        }
    }

    formatter.blank_line();
    formatter.info(&format!(
        "Validated {} file(s): {} pages, {}",
        plan.documents.len(),
        plan.total_pages,
        format_file_size(plan.total_bytes)
    ));
}

/// Display merge and write statistics. Details only in verbose mode.
pub fn display_statistics(
    formatter: &OutputFormatter,
    stats: &MergeStatistics,
    write: &WriteStatistics,
) {
    formatter.success(&format!(
        "Merged {} file(s) into {} pages: {} ({})",
        stats.files_merged,
        stats.total_pages,
        write.output_path.display(),
        write.format_file_size()
    ));

    if stats.dangling_references > 0 {
        formatter.warning(&format!(
            "{} reference(s) to missing objects were replaced with null",
            stats.dangling_references
        ));
    }

    if formatter.is_verbose() {
        formatter.section("Statistics");
        formatter.detail("Input files", &stats.files_merged.to_string());
        formatter.detail("Total pages", &stats.total_pages.to_string());
        formatter.detail("Objects copied", &stats.objects_copied.to_string());
        formatter.detail("Bookmarks", &stats.bookmarks_added.to_string());
        formatter.detail("PDF version", &stats.version);
        formatter.detail("Compression", &format!("{:?}", stats.compression));
        formatter.detail("Input size", &stats.format_input_size());
        formatter.detail("Output size", &stats.format_output_size());
        formatter.detail(
            "Merge time",
            &format!("{:.2}s", stats.elapsed.as_secs_f64()),
        );
        formatter.detail(
            "Write time",
            &format!("{:.2}s", write.write_time.as_secs_f64()),
        );
    }
}
