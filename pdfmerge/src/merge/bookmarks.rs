//! Bookmark (outline) management for PDFs.
//!
//! Builds a flat outline with one entry per merged input, each pointing at
//! the first page that input contributed.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::CompositionError;
use crate::utils::encode_text_string;

/// One outline entry: a title and the page it jumps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// Text shown in the viewer's outline panel.
    pub title: String,
    /// Destination page in the output document.
    pub page: ObjectId,
}

impl Bookmark {
    /// Create a bookmark.
    pub fn new(title: impl Into<String>, page: ObjectId) -> Self {
        Self {
            title: title.into(),
            page,
        }
    }
}

/// Manager for PDF bookmarks (outlines).
#[derive(Debug, Clone, Copy, Default)]
pub struct BookmarkManager;

impl BookmarkManager {
    /// Create a new bookmark manager.
    pub fn new() -> Self {
        Self
    }

    /// Attach an outline with `items` to the catalog `catalog_id`.
    ///
    /// Returns the number of outline entries written. An empty `items` list
    /// leaves the document untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if `catalog_id` is not a dictionary in `doc`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfmerge::merge::bookmarks::{Bookmark, BookmarkManager};
    /// # use lopdf::{Document, ObjectId};
    /// # fn example(mut doc: Document, catalog: ObjectId, page: ObjectId) -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = BookmarkManager::new();
    /// manager.add_outline(&mut doc, catalog, &[Bookmark::new("Chapter 1", page)])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_outline(
        &self,
        doc: &mut Document,
        catalog_id: ObjectId,
        items: &[Bookmark],
    ) -> Result<usize, CompositionError> {
        if items.is_empty() {
            return Ok(0);
        }

        if !matches!(doc.objects.get(&catalog_id), Some(Object::Dictionary(_))) {
            return Err(CompositionError::new(
                "cannot attach outline: catalog is not a dictionary",
            ));
        }

        let outline_id = doc.new_object_id();
        let item_ids: Vec<ObjectId> = items.iter().map(|_| doc.new_object_id()).collect();

        for (i, (item, &item_id)) in items.iter().zip(&item_ids).enumerate() {
            // [page /XYZ null null null] keeps the viewer's position and zoom.
            let dest = vec![
                Object::Reference(item.page),
                Object::Name(b"XYZ".to_vec()),
                Object::Null,
                Object::Null,
                Object::Null,
            ];

            let mut dict = Dictionary::new();
            dict.set(
                "Title",
                Object::String(encode_text_string(&item.title), StringFormat::Literal),
            );
            dict.set("Parent", Object::Reference(outline_id));
            dict.set("Dest", Object::Array(dest));
            if i > 0 {
                dict.set("Prev", Object::Reference(item_ids[i - 1]));
            }
            if let Some(next) = item_ids.get(i + 1) {
                dict.set("Next", Object::Reference(*next));
            }

            doc.objects.insert(item_id, Object::Dictionary(dict));
        }

        let mut outline = Dictionary::new();
        outline.set("Type", Object::Name(b"Outlines".to_vec()));
        outline.set("Count", Object::Integer(item_ids.len() as i64));
        if let (Some(first), Some(last)) = (item_ids.first(), item_ids.last()) {
            outline.set("First", Object::Reference(*first));
            outline.set("Last", Object::Reference(*last));
        }
        doc.objects.insert(outline_id, Object::Dictionary(outline));

        if let Some(Object::Dictionary(catalog)) = doc.objects.get_mut(&catalog_id) {
            catalog.set("Outlines", Object::Reference(outline_id));
            catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
        }

        Ok(item_ids.len())
    }
}
