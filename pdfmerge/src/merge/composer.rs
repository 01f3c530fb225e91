//! Output document assembly.
//!
//! The [`Composer`] owns a fresh [`OutputDocument`] and appends the pages of
//! each source document to it, one document at a time, in the order given.
//! Once every document is in, the output is finished (metadata, outline,
//! compression), checked for structural consistency and serialized.

use lopdf::{Document, Object, ObjectId, dictionary};
use tracing::{debug, error};

use crate::config::{CompressionLevel, MergeOptions};
use crate::error::{CompositionError, MergeError, Result};
use crate::merge::bookmarks::{Bookmark, BookmarkManager};
use crate::merge::copier::{Anchors, ObjectCopier};
use crate::merge::merger::CancellationFlag;
use crate::merge::metadata::MetadataManager;
use crate::merge::pages::PageHandle;
use crate::validation::{SourceDocument, Validator, parse_version};

const PAGES_ROOT_ID: ObjectId = (1, 0);
const CATALOG_ID: ObjectId = (2, 0);
const MIN_OUTPUT_VERSION: (u8, u8) = (1, 4);

/// One document's contribution to the output.
#[derive(Debug, Clone)]
pub struct ComposeInput<'a> {
    /// The validated source document.
    pub document: &'a SourceDocument,
    /// Pages to copy, in output order.
    pub pages: Vec<PageHandle<'a>>,
    /// Label used for the document's bookmark.
    pub label: Option<&'a str>,
}

/// Serialized output and facts gathered while building it.
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    /// The complete output PDF.
    pub bytes: Vec<u8>,
    /// Number of pages in the output.
    pub page_count: usize,
    /// Number of objects copied out of the source documents.
    pub objects_copied: usize,
    /// References to missing source objects that were copied as null.
    pub dangling_references: usize,
    /// Number of outline entries written.
    pub bookmarks: usize,
    /// PDF version written to the output header.
    pub version: String,
}

/// The accumulating merged document.
///
/// Always structurally valid: the page tree lists exactly the committed
/// pages and every committed object's references resolve.
#[derive(Debug)]
pub(crate) struct OutputDocument {
    document: Document,
    pages: Vec<ObjectId>,
    version: (u8, u8),
    objects_copied: usize,
    dangling: usize,
    first_pages: Vec<(usize, ObjectId)>,
}

impl OutputDocument {
    pub(crate) fn new() -> Self {
        let mut document = Document::with_version("1.4");
        document.objects.insert(
            PAGES_ROOT_ID,
            dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }
            .into(),
        );
        document.objects.insert(
            CATALOG_ID,
            dictionary! {
                "Type" => "Catalog",
                "Pages" => PAGES_ROOT_ID,
            }
            .into(),
        );
        document.max_id = CATALOG_ID.0;
        document.trailer.set("Root", CATALOG_ID);

        Self {
            document,
            pages: Vec::new(),
            version: MIN_OUTPUT_VERSION,
            objects_copied: 0,
            dangling: 0,
            first_pages: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Copy `handles` out of `source` and append them.
    ///
    /// On error nothing of the document is committed.
    pub(crate) fn append_document<'a>(
        &mut self,
        index: usize,
        source: &'a SourceDocument,
        handles: &[PageHandle<'a>],
    ) -> std::result::Result<(), CompositionError> {
        let anchors = Anchors {
            catalog: CATALOG_ID,
            pages_root: PAGES_ROOT_ID,
        };
        let mut copier =
            ObjectCopier::new(source, index, anchors, self.document.max_id + 1, handles);
        for handle in handles {
            copier.copy_page(handle)?;
        }
        let copied = copier.finish();

        if let Some(first) = copied.pages.first() {
            self.first_pages.push((index, *first));
        }
        self.objects_copied += copied.objects.len();
        self.dangling += copied.dangling;
        self.document.max_id = self.document.max_id.max(copied.next_id.saturating_sub(1));
        self.document.objects.extend(copied.objects);
        self.pages.extend(copied.pages);
        self.sync_page_tree()?;

        if let Some(version) = parse_version(source.version()) {
            self.version = self.version.max(version);
        }

        debug!(
            document = index,
            pages = handles.len(),
            total_pages = self.pages.len(),
            "appended document"
        );
        Ok(())
    }

    fn sync_page_tree(&mut self) -> std::result::Result<(), CompositionError> {
        let Some(Object::Dictionary(root)) = self.document.objects.get_mut(&PAGES_ROOT_ID) else {
            return Err(CompositionError::new("output page tree root is missing"));
        };

        let kids: Vec<Object> = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        root.set("Kids", Object::Array(kids));
        root.set("Count", Object::Integer(self.pages.len() as i64));
        Ok(())
    }

    /// Finish and serialize the document.
    pub(crate) fn serialize(
        mut self,
        options: &MergeOptions,
        labels: &[Option<&str>],
    ) -> std::result::Result<ComposedDocument, CompositionError> {
        MetadataManager::new().set_metadata(&mut self.document, &options.metadata)?;

        let bookmarks = if options.bookmarks {
            let items: Vec<Bookmark> = self
                .first_pages
                .iter()
                .map(|&(index, page)| {
                    let title = labels
                        .get(index)
                        .copied()
                        .flatten()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Document {}", index + 1));
                    Bookmark::new(title, page)
                })
                .collect();
            BookmarkManager::new().add_outline(&mut self.document, CATALOG_ID, &items)?
        } else {
            0
        };

        let version = format!("{}.{}", self.version.0, self.version.1);
        self.document.version = version.clone();

        match options.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => self.document.compress(),
            CompressionLevel::Maximum => {
                self.document.prune_objects();
                self.document.compress();
            }
        }

        self.check_consistency()?;

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| CompositionError::new(format!("serializer failed: {e}")))?;

        if options.verify_output {
            verify(&bytes, self.pages.len())?;
        }

        Ok(ComposedDocument {
            bytes,
            page_count: self.pages.len(),
            objects_copied: self.objects_copied,
            dangling_references: self.dangling,
            bookmarks,
            version,
        })
    }

    /// Every reference resolves and the page tree matches the copied pages.
    fn check_consistency(&self) -> std::result::Result<(), CompositionError> {
        let Some(Object::Dictionary(root)) = self.document.objects.get(&PAGES_ROOT_ID) else {
            return Err(CompositionError::new("output page tree root is missing"));
        };

        let count = root.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(-1);
        let kids = root.get(b"Kids").and_then(|k| k.as_array()).map(|k| k.len());
        if count != self.pages.len() as i64 || kids.ok() != Some(self.pages.len()) {
            return Err(CompositionError::new(format!(
                "page tree lists {count} pages, expected {}",
                self.pages.len()
            )));
        }

        for (id, object) in &self.document.objects {
            let mut stack = vec![object];
            while let Some(current) = stack.pop() {
                match current {
                    Object::Reference(target) if !self.document.objects.contains_key(target) => {
                        return Err(CompositionError::new(format!(
                            "object {} {} R references missing object {} {} R",
                            id.0, id.1, target.0, target.1
                        )));
                    }
                    Object::Array(items) => stack.extend(items),
                    Object::Dictionary(dict) => stack.extend(dict.iter().map(|(_, v)| v)),
                    Object::Stream(stream) => stack.extend(stream.dict.iter().map(|(_, v)| v)),
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

fn verify(bytes: &[u8], expected_pages: usize) -> std::result::Result<(), CompositionError> {
    let reparsed = Validator::new().validate(bytes).map_err(|e| {
        CompositionError::new(format!("serialized output does not re-open: {e}"))
    })?;

    if reparsed.page_count() != expected_pages {
        return Err(CompositionError::new(format!(
            "serialized output has {} pages, expected {expected_pages}",
            reparsed.page_count()
        )));
    }
    Ok(())
}

/// Document composer.
///
/// # Examples
///
/// ```no_run
/// # use pdfmerge::config::MergeOptions;
/// # use pdfmerge::merge::composer::{ComposeInput, Composer};
/// # use pdfmerge::merge::pages::PageExtractor;
/// # use pdfmerge::validation::Validator;
/// # fn example(a: &[u8], b: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
/// let validator = Validator::new();
/// let first = validator.validate(a)?;
/// let second = validator.validate(b)?;
///
/// let extractor = PageExtractor::new();
/// let inputs = vec![
///     ComposeInput { document: &first, pages: extractor.extract_pages(&first), label: None },
///     ComposeInput { document: &second, pages: extractor.extract_pages(&second), label: None },
/// ];
///
/// let composed = Composer::new(MergeOptions::default()).compose(&inputs)?;
/// assert_eq!(composed.page_count, first.page_count() + second.page_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Composer {
    options: MergeOptions,
    cancellation: Option<CancellationFlag>,
}

impl Composer {
    /// Create a composer with the given options.
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            cancellation: None,
        }
    }

    /// Check `flag` before copying each document.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Compose `inputs` into a single serialized PDF.
    ///
    /// # Errors
    ///
    /// - [`MergeError::Composition`] if the output cannot be made consistent
    /// - [`MergeError::Cancelled`] if cancellation was requested between documents
    pub fn compose(&self, inputs: &[ComposeInput<'_>]) -> Result<ComposedDocument> {
        let mut output = OutputDocument::new();

        for (index, input) in inputs.iter().enumerate() {
            if self.cancellation.as_ref().is_some_and(|flag| flag.is_cancelled()) {
                debug!(document = index, "merge cancelled before copy");
                return Err(MergeError::Cancelled);
            }

            output
                .append_document(index, input.document, &input.pages)
                .map_err(|err| report(err.in_document(index)))?;
        }

        let labels: Vec<Option<&str>> = inputs.iter().map(|input| input.label).collect();
        output.serialize(&self.options, &labels).map_err(report)
    }
}

fn report(err: CompositionError) -> MergeError {
    error!(
        document = err.document,
        page = err.page,
        reason = %err.reason,
        "composition failed"
    );
    MergeError::Composition(err)
}
