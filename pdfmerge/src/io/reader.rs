//! Reading input files into merge requests.
//!
//! The engine itself never touches the filesystem. This module turns a list
//! of paths into a [`MergeRequest`] whose labels are the file names.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::io::reader::InputReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = InputReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let request = reader.read_all(&paths, 4).await?;
//! assert_eq!(request.len(), 2);
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::merge::{MergeInput, MergeRequest};

/// Reads input files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputReader;

impl InputReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read one file into a labelled input.
    ///
    /// The label is the file name, or the whole path if it has none.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::ReadInput`] if the file cannot be read.
    pub async fn read(&self, path: &Path) -> Result<MergeInput> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| MergeError::ReadInput {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), bytes = bytes.len(), "read input");

        Ok(MergeInput::new(bytes).with_label(label_for(path)))
    }

    /// Read every file, at most `jobs` at a time, keeping the order of `paths`.
    ///
    /// Stops at the first file (in path order) that cannot be read.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::ReadInput`] for the first unreadable file.
    pub async fn read_all<P: AsRef<Path>>(&self, paths: &[P], jobs: usize) -> Result<MergeRequest> {
        let jobs = jobs.max(1);

        let reads = paths.iter().map(|path| self.read(path.as_ref()));
        let inputs: Vec<MergeInput> = stream::iter(reads).buffered(jobs).try_collect().await?;

        Ok(inputs.into_iter().collect())
    }
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
