//! Parsed source documents.

use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::merge::metadata::MetadataManager;
use crate::validation::page_tree::{PageEntry, PageTree};

/// One validated input document.
///
/// Owns the parsed object table of the input and the list of its pages in
/// reading order. Read-only once created.
#[derive(Debug)]
pub struct SourceDocument {
    document: Document,
    byte_len: usize,
    catalog_id: ObjectId,
    pages: Vec<PageEntry>,
    tree_nodes: BTreeSet<ObjectId>,
}

/// Where a reference into a source's document skeleton is re-anchored when
/// pages are copied out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skeleton {
    /// The document catalog.
    Catalog,
    /// An intermediate page-tree node.
    PageTreeNode,
}

impl SourceDocument {
    pub(crate) fn new(
        document: Document,
        byte_len: usize,
        catalog_id: ObjectId,
        tree: PageTree,
    ) -> Self {
        Self {
            document,
            byte_len,
            catalog_id,
            pages: tree.pages,
            tree_nodes: tree.nodes,
        }
    }

    /// Size of the input buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Object ids of the pages, in reading order.
    pub fn page_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.pages.iter().map(|page| page.id)
    }

    /// PDF version from the file header, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// Number of objects in the document's object table.
    pub fn object_count(&self) -> usize {
        self.document.objects.len()
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn page(&self, index: usize) -> Option<&PageEntry> {
        self.pages.get(index)
    }

    pub(crate) fn is_page(&self, id: ObjectId) -> bool {
        self.pages.iter().any(|page| page.id == id)
    }

    pub(crate) fn skeleton(&self, id: ObjectId) -> Option<Skeleton> {
        if id == self.catalog_id {
            Some(Skeleton::Catalog)
        } else if self.tree_nodes.contains(&id) {
            Some(Skeleton::PageTreeNode)
        } else {
            None
        }
    }

    /// Summarize the document for reporting.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            byte_len: self.byte_len,
            page_count: self.page_count(),
            version: parse_version(self.version()),
            object_count: self.object_count(),
            page_dimensions: self.first_page_dimensions(),
            title: MetadataManager::new().get_metadata(&self.document).title,
        }
    }

    fn first_page_dimensions(&self) -> Option<(f32, f32)> {
        let page = self.pages.first()?;
        let Ok(Object::Dictionary(dict)) = self.document.get_object(page.id) else {
            return None;
        };

        let media_box = dict
            .get(b"MediaBox")
            .or_else(|_| page.inherited.get(b"MediaBox"))
            .ok()?;
        let media_box = match media_box {
            Object::Reference(id) => self.document.get_object(*id).ok()?,
            other => other,
        };

        if let Object::Array(arr) = media_box
            && arr.len() >= 4
        {
            let width = arr[2].as_float().ok()? - arr[0].as_float().ok()?;
            let height = arr[3].as_float().ok()? - arr[1].as_float().ok()?;
            return Some((width, height));
        }
        None
    }
}

/// Parse a `"major.minor"` version string.
pub(crate) fn parse_version(version: &str) -> Option<(u8, u8)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Summary of a validated input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Size of the input in bytes.
    pub byte_len: usize,

    /// Number of pages.
    pub page_count: usize,

    /// PDF version (major, minor).
    pub version: Option<(u8, u8)>,

    /// Number of objects in the object table.
    pub object_count: usize,

    /// Width and height of the first page in points, if available.
    pub page_dimensions: Option<(f32, f32)>,

    /// Title from the document's Info dictionary.
    pub title: Option<String>,
}
