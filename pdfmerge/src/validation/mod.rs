//! Input validation for pdfmerge.
//!
//! The validator turns one raw input buffer into a [`SourceDocument`] or a
//! [`ValidationError`]. It performs:
//! - Empty input detection
//! - PDF container parsing (header, cross-reference data, trailer)
//! - Encryption detection
//! - Catalog and page-tree verification
//!
//! Validation of one buffer never looks at any other buffer, and the buffer
//! itself is never modified.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::validation::Validator;
//!
//! # fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new();
//! let document = validator.validate(bytes)?;
//! println!("PDF has {} pages", document.page_count());
//! # Ok(())
//! # }
//! ```

mod document;
pub mod page_tree;

pub use document::{DocumentSummary, SourceDocument};
pub(crate) use document::{Skeleton, parse_version};

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ValidationError;

/// Validator for PDF input buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate a single PDF buffer.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyInput`] if the buffer has zero length
    /// - [`ValidationError::MalformedDocument`] if it does not parse as a PDF
    ///   or lacks a catalog or page tree
    /// - [`ValidationError::UnsupportedStructure`] if it is encrypted or its
    ///   page tree has an unexpected shape
    pub fn validate(&self, buffer: &[u8]) -> Result<SourceDocument, ValidationError> {
        if buffer.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let document =
            Document::load_mem(buffer).map_err(|e| classify_load_error(&e.to_string()))?;

        if document.trailer.has(b"Encrypt") {
            return Err(ValidationError::unsupported("document is encrypted"));
        }

        let catalog_id = catalog_id(&document)?;
        let pages_root = pages_root(&document, catalog_id)?;
        let tree = page_tree::walk(&document, pages_root)?;

        debug!(
            bytes = buffer.len(),
            pages = tree.pages.len(),
            objects = document.objects.len(),
            version = %document.version,
            "validated document"
        );

        Ok(SourceDocument::new(document, buffer.len(), catalog_id, tree))
    }
}

/// Map a parser error message onto the validation taxonomy.
///
/// Encryption and unimplemented parser features are structural limitations;
/// everything else means the bytes are not a usable PDF.
pub(crate) fn classify_load_error(message: &str) -> ValidationError {
    let lower = message.to_lowercase();
    let unsupported = ["encrypt", "decrypt", "password", "unimplemented", "unsupported"];

    if unsupported.iter().any(|needle| lower.contains(needle)) {
        ValidationError::unsupported(message)
    } else {
        ValidationError::malformed(message)
    }
}

fn catalog_id(document: &Document) -> Result<ObjectId, ValidationError> {
    let root = document
        .trailer
        .get(b"Root")
        .map_err(|_| ValidationError::malformed("trailer has no /Root entry"))?;

    let Object::Reference(catalog_id) = root else {
        return Err(ValidationError::malformed(
            "trailer /Root is not an indirect reference",
        ));
    };

    match document.objects.get(catalog_id) {
        Some(Object::Dictionary(_)) => Ok(*catalog_id),
        Some(_) => Err(ValidationError::malformed("document catalog is not a dictionary")),
        None => Err(ValidationError::malformed("document catalog does not exist")),
    }
}

fn pages_root(document: &Document, catalog_id: ObjectId) -> Result<ObjectId, ValidationError> {
    let Some(Object::Dictionary(catalog)) = document.objects.get(&catalog_id) else {
        return Err(ValidationError::malformed("document catalog is not a dictionary"));
    };

    match catalog.get(b"Pages") {
        Ok(Object::Reference(pages_id)) => Ok(*pages_id),
        Ok(_) => Err(ValidationError::unsupported(
            "catalog /Pages is not an indirect reference",
        )),
        Err(_) => Err(ValidationError::malformed("catalog has no /Pages entry")),
    }
}
