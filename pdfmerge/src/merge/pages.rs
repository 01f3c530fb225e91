//! Page extraction.
//!
//! Extraction turns a validated [`SourceDocument`] into one [`PageHandle`] per
//! page, in the order the document's page tree lists them. The page tree was
//! already walked by the validator, so extraction cannot fail.

use lopdf::ObjectId;

use crate::validation::SourceDocument;
use crate::validation::page_tree::PageEntry;

/// Reference to one page of a source document.
///
/// Borrowed from the [`SourceDocument`] and never outlives it.
#[derive(Debug, Clone, Copy)]
pub struct PageHandle<'a> {
    document: &'a SourceDocument,
    index: usize,
}

impl<'a> PageHandle<'a> {
    /// The document this page belongs to.
    pub fn document(&self) -> &'a SourceDocument {
        self.document
    }

    /// Zero-based index of the page within its document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Object id of the page dictionary in the source document.
    pub fn object_id(&self) -> Option<ObjectId> {
        self.entry().map(|entry| entry.id)
    }

    pub(crate) fn entry(&self) -> Option<&'a PageEntry> {
        self.document.page(self.index)
    }
}

/// Page extractor for validated documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageExtractor;

impl PageExtractor {
    /// Create a new page extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract handles for every page of `document`, in reading order.
    ///
    /// A document without pages yields an empty vector.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfmerge::merge::pages::PageExtractor;
    /// # use pdfmerge::validation::Validator;
    /// # fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    /// let document = Validator::new().validate(bytes)?;
    /// let handles = PageExtractor::new().extract_pages(&document);
    /// assert_eq!(handles.len(), document.page_count());
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract_pages<'a>(&self, document: &'a SourceDocument) -> Vec<PageHandle<'a>> {
        (0..document.page_count())
            .map(|index| PageHandle { document, index })
            .collect()
    }

    /// Number of pages `extract_pages` would return.
    pub fn page_count(&self, document: &SourceDocument) -> usize {
        document.page_count()
    }
}
