//! pdfmerge - Merge whole PDF documents into a single document.
//!
//! The engine takes an ordered list of PDF byte buffers and produces one new,
//! self-contained PDF holding every page of every input, in input order.
//! Each page is deep-copied into the output together with everything it
//! depends on (content streams, fonts, images, annotations), so the output
//! never refers back to its inputs.
//!
//! Processing happens in three stages:
//!
//! - **Validation** ([`validation`]): every buffer is parsed and its page tree
//!   checked before anything is copied. The first invalid input aborts the
//!   merge.
//! - **Extraction** ([`merge::pages`]): pages are listed in reading order.
//! - **Composition** ([`merge::composer`]): pages are copied into a fresh
//!   document, which is then serialized.
//!
//! The library does not touch the filesystem during a merge; [`io`] offers
//! helpers for reading inputs from and writing the output to disk.
//!
//! # Examples
//!
//! ## Basic Merge
//!
//! ```no_run
//! # fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let merged = pdfmerge::merge(&[a, b])?;
//! std::fs::write("merged.pdf", merged)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Options, Labels and Statistics
//!
//! ```no_run
//! use pdfmerge::config::{CompressionLevel, Metadata, MergeOptions};
//! use pdfmerge::merge::{MergeInput, MergeRequest, Merger};
//!
//! # async fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let options = MergeOptions {
//!     compression: CompressionLevel::Maximum,
//!     metadata: Metadata::new(Some("Annual Report".to_string()), None, None, None),
//!     bookmarks: true,
//!     ..Default::default()
//! };
//!
//! let request = MergeRequest::new()
//!     .with_input(MergeInput::new(a).with_label("intro.pdf"))
//!     .with_input(MergeInput::new(b).with_label("appendix.pdf"));
//!
//! let output = Merger::with_options(options).merge_async(request).await?;
//! println!("Created {} page document", output.statistics.total_pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading and Writing Files
//!
//! ```no_run
//! use pdfmerge::io::{InputReader, OutputWriter};
//! use pdfmerge::merge::Merger;
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let request = InputReader::new().read_all(&paths, 4).await?;
//!
//! let output = Merger::new().merge_async(request).await?;
//! OutputWriter::new().write(output.bytes, Path::new("merged.pdf")).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{CompressionLevel, MergeOptions, Metadata};
pub use error::{CompositionError, MergeError, Result, ValidationError};
pub use merge::{CancellationFlag, MergeInput, MergeOutput, MergeRequest, MergeStatistics, Merger};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Merge PDF buffers into one PDF with default options.
///
/// Shorthand for `Merger::new().merge(buffers)`.
///
/// # Errors
///
/// - [`MergeError::InsufficientInput`] if `buffers` is empty
/// - [`MergeError::Validation`] for the first invalid buffer, with its index
/// - [`MergeError::Composition`] if the output cannot be built
pub fn merge<B: AsRef<[u8]>>(buffers: &[B]) -> Result<Vec<u8>> {
    Merger::new().merge(buffers)
}
