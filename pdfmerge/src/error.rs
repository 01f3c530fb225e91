//! Error types for pdfmerge.
//!
//! Errors fall into three groups:
//!
//! - **Validation errors** ([`ValidationError`]): a single input buffer could
//!   not be turned into a usable source document. Always attributed to an
//!   input index by [`MergeError::Validation`].
//! - **Composition errors** ([`CompositionError`]): an internal invariant was
//!   violated while building the output. These indicate a defect and are
//!   logged where they are raised.
//! - **Collaborator errors**: reading input files, writing the output and
//!   configuration problems raised by the I/O layer and the CLI.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for pdfmerge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Why a single input buffer was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The buffer has zero length.
    #[error("input is empty")]
    EmptyInput,

    /// The buffer does not parse as a PDF container.
    #[error("not a valid PDF document: {reason}")]
    MalformedDocument {
        /// Parser diagnostic.
        reason: String,
    },

    /// The buffer parses but uses a structure that cannot be copied safely.
    #[error("unsupported PDF structure: {reason}")]
    UnsupportedStructure {
        /// What was not supported.
        reason: String,
    },
}

impl ValidationError {
    /// Create a MalformedDocument error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedStructure error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedStructure {
            reason: reason.into(),
        }
    }
}

/// An internal invariant was violated while building the output document.
///
/// Carries the input document index and page index (within that document)
/// when the failure can be pinned to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionError {
    /// Index of the input document being copied, if any.
    pub document: Option<usize>,
    /// Index of the page within that document, if any.
    pub page: Option<usize>,
    /// Description of the violated invariant.
    pub reason: String,
}

impl CompositionError {
    /// Create an error that is not tied to a specific input.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            document: None,
            page: None,
            reason: reason.into(),
        }
    }

    /// Attach the input document index.
    pub fn in_document(mut self, document: usize) -> Self {
        self.document = Some(document);
        self
    }

    /// Attach the page index within the document.
    pub fn at_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

impl fmt::Display for CompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to compose output")?;
        match (self.document, self.page) {
            (Some(document), Some(page)) => write!(f, " (document {document}, page {page})")?,
            (Some(document), None) => write!(f, " (document {document})")?,
            (None, Some(page)) => write!(f, " (page {page})")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.reason)
    }
}

impl std::error::Error for CompositionError {}

/// Main error type for pdfmerge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The request contained no input buffers.
    #[error("No input documents were supplied")]
    InsufficientInput,

    /// An input buffer failed validation.
    #[error("Input {index}{} was rejected: {source}", label_suffix(.label))]
    Validation {
        /// Zero-based index of the failing input.
        index: usize,
        /// Caller-supplied label for the input (usually a file name).
        label: Option<String>,
        /// Why the input was rejected.
        #[source]
        source: ValidationError,
    },

    /// Building or serializing the output failed.
    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// The merge was cancelled between documents.
    #[error("Merge cancelled")]
    Cancelled,

    /// An input file could not be read.
    #[error("Failed to read input file: {}\n  Reason: {source}", .path.display())]
    ReadInput {
        /// Path of the input file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The output file could not be written.
    #[error("Failed to write output file: {}\n  Reason: {source}", .path.display())]
    WriteOutput {
        /// Path of the output file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Output file already exists and overwriting is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output path",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },

    /// A background merge task panicked or was aborted.
    #[error("Background merge task failed: {0}")]
    TaskFailed(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn label_suffix(label: &Option<String>) -> String {
    match label {
        Some(label) => format!(" ({label})"),
        None => String::new(),
    }
}

impl MergeError {
    /// Create a Validation error for the input at `index`.
    pub fn validation(index: usize, label: Option<String>, source: ValidationError) -> Self {
        Self::Validation {
            index,
            label,
            source,
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Index of the input this error is attributed to, if any.
    pub fn input_index(&self) -> Option<usize> {
        match self {
            Self::Validation { index, .. } => Some(*index),
            Self::Composition(err) => err.document,
            _ => None,
        }
    }

    /// The validation failure behind this error, if it is one.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Check if this error indicates a defect in pdfmerge rather than bad input.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Composition(_) | Self::TaskFailed(_))
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InsufficientInput => 1,
            Self::InvalidConfig { .. } => 1,
            Self::ReadInput { .. } => 2,
            Self::Validation { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::WriteOutput { .. } => 5,
            Self::Io(_) => 5,
            Self::Composition(_) => 6,
            Self::TaskFailed(_) => 6,
            Self::Cancelled => 130, // Standard exit code for SIGINT
        }
    }
}
