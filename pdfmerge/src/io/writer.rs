//! Writing merged output to disk.
//!
//! Writes are atomic: the bytes go to a uniquely named temporary file in the
//! target's directory, which is then renamed over it. A failed write never leaves a truncated
//! output behind.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::io::writer::OutputWriter;
//! use std::path::Path;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = OutputWriter::new();
//! let stats = writer.write(bytes, Path::new("output.pdf")).await?;
//! println!("Wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::task;
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::utils::format_file_size;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes output files.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputWriter;

impl OutputWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }

    /// Write `bytes` to `path` atomically, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::WriteOutput`] if the directory cannot be created,
    /// or the temporary file cannot be written or renamed.
    pub async fn write(&self, bytes: Vec<u8>, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();

        task::spawn_blocking(move || write_atomic(&bytes, path_buf))
            .await
            .map_err(|e| MergeError::TaskFailed(format!("Write task failed: {e}")))?
    }

    /// Check if output file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

fn write_atomic(bytes: &[u8], path: PathBuf) -> Result<WriteStatistics> {
    let start = Instant::now();
    let write_error = |path: &Path, source| MergeError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| write_error(&dir, e))?;

    // Dropping the temp file on an error path removes it.
    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| write_error(&dir, e))?;
    let result = (|| -> std::io::Result<()> {
        let mut writer = std::io::BufWriter::new(temp.as_file_mut());
        writer.write_all(bytes)?;
        writer.flush()?;
        drop(writer);
        temp.as_file().sync_all()
    })();
    if let Err(e) = result {
        return Err(write_error(temp.path(), e));
    }

    temp.persist(&path)
        .map_err(|e| write_error(&path, e.error))?;

    let stats = WriteStatistics {
        write_time: start.elapsed(),
        file_size: bytes.len() as u64,
        output_path: path,
    };

    debug!(
        path = %stats.output_path.display(),
        bytes = stats.file_size,
        "wrote output"
    );
    Ok(stats)
}
