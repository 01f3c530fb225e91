//! Configuration for merge operations.
//!
//! [`MergeOptions`] controls how the output document is finished: compression,
//! document metadata, per-input bookmarks and post-serialization verification.
//! Options are plain data and (de)serialize with serde, so a front-end can load
//! them from a JSON file.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{MergeError, Result};

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - objects are written exactly as copied.
    None,
    /// Flate-compress streams that are not compressed yet.
    #[default]
    Standard,
    /// Standard compression plus pruning of unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = MergeError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(MergeError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Document information written to the output's Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    ///
    /// Blank values are dropped.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }
}

/// Options for a merge operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeOptions {
    /// Compression applied to the output.
    pub compression: CompressionLevel,

    /// Metadata written to the output's Info dictionary.
    pub metadata: Metadata,

    /// Add one outline entry per input document.
    pub bookmarks: bool,

    /// Re-parse the serialized output and check its page count.
    pub verify_output: bool,

    /// Number of documents validated concurrently by async merges
    /// (None = available parallelism).
    pub jobs: Option<usize>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::Standard,
            metadata: Metadata::default(),
            bookmarks: false,
            verify_output: true,
            jobs: None,
        }
    }
}

impl MergeOptions {
    /// Load options from a JSON document.
    ///
    /// Missing fields take their default values. Metadata values are
    /// trimmed and blank ones dropped, as with [`Metadata::new`].
    pub fn from_json(json: &str) -> Result<Self> {
        let mut options: Self = serde_json::from_str(json)
            .map_err(|e| MergeError::invalid_config(format!("Invalid options file: {e}")))?;
        let Metadata {
            title,
            author,
            subject,
            keywords,
        } = options.metadata;
        options.metadata = Metadata::new(title, author, subject, keywords);
        options.validate()?;
        Ok(options)
    }

    /// Validate the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the job count is zero.
    pub fn validate(&self) -> Result<()> {
        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(MergeError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        Ok(())
    }

    /// Get the effective number of concurrent validation jobs.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
