//! Structural deep copy of pages between object tables.
//!
//! An [`ObjectCopier`] copies the pages of one source document, and everything
//! they reference, into freshly allocated object ids of the output. The
//! old-to-new id map lives for exactly one source document: objects shared by
//! several of its pages are copied once, and nothing is shared with other
//! sources.
//!
//! Copied objects are staged inside the copier. The output document only sees
//! them once [`ObjectCopier::finish`] hands them over, so a failure half way
//! through a document leaves the output untouched.

use lopdf::{Object, ObjectId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{trace, warn};

use crate::error::CompositionError;
use crate::merge::pages::PageHandle;
use crate::validation::{Skeleton, SourceDocument};

/// Output objects that references into a source's skeleton are re-anchored to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Anchors {
    pub(crate) catalog: ObjectId,
    pub(crate) pages_root: ObjectId,
}

/// Objects copied from one source document, ready to be committed.
#[derive(Debug, Default)]
pub(crate) struct CopiedDocument {
    pub(crate) objects: BTreeMap<ObjectId, Object>,
    /// New ids of the copied pages, in copy order.
    pub(crate) pages: Vec<ObjectId>,
    /// First object number not used by the copy.
    pub(crate) next_id: u32,
    /// References to missing source objects that were copied as null.
    pub(crate) dangling: usize,
}

pub(crate) struct ObjectCopier<'a> {
    source: &'a SourceDocument,
    document_index: usize,
    anchors: Anchors,
    next_id: u32,
    map: HashMap<ObjectId, ObjectId>,
    queue: VecDeque<(ObjectId, ObjectId)>,
    objects: BTreeMap<ObjectId, Object>,
    pages: Vec<ObjectId>,
    dangling: usize,
}

impl<'a> ObjectCopier<'a> {
    /// Create a copier for `source`, allocating output ids from `first_id`.
    ///
    /// Every page in `handles` gets its output id up front, so references
    /// between those pages (links, annotations) resolve to the copies.
    pub(crate) fn new(
        source: &'a SourceDocument,
        document_index: usize,
        anchors: Anchors,
        first_id: u32,
        handles: &[PageHandle<'a>],
    ) -> Self {
        let mut copier = Self {
            source,
            document_index,
            anchors,
            next_id: first_id,
            map: HashMap::new(),
            queue: VecDeque::new(),
            objects: BTreeMap::new(),
            pages: Vec::with_capacity(handles.len()),
            dangling: 0,
        };

        for handle in handles {
            if let Some(old_id) = handle.object_id() {
                let new_id = copier.allocate();
                copier.map.insert(old_id, new_id);
            }
        }

        copier
    }

    /// Copy one page and its dependency closure.
    ///
    /// Inherited attributes are written onto the copy and its `/Parent` is
    /// pointed at the output page-tree root.
    pub(crate) fn copy_page(&mut self, handle: &PageHandle<'a>) -> Result<ObjectId, CompositionError> {
        let source = self.source;
        let page_index = handle.index();
        let failure = |reason: String| {
            CompositionError::new(reason)
                .in_document(self.document_index)
                .at_page(page_index)
        };

        let Some(entry) = handle.entry() else {
            return Err(failure(format!("page index {page_index} is out of range")));
        };
        let Some(&new_id) = self.map.get(&entry.id) else {
            return Err(failure(format!(
                "page {} {} R has no allocated output id",
                entry.id.0, entry.id.1
            )));
        };
        let Some(Object::Dictionary(source_dict)) = source.document().objects.get(&entry.id) else {
            return Err(failure(format!(
                "page {} {} R is not a dictionary",
                entry.id.0, entry.id.1
            )));
        };

        let mut dict = source_dict.clone();
        dict.remove(b"Parent");
        for (key, value) in entry.inherited.iter() {
            if !dict.has(key) {
                dict.set(key.clone(), value.clone());
            }
        }

        let mut page = Object::Dictionary(dict);
        self.rewrite(&mut page);
        if let Object::Dictionary(dict) = &mut page {
            dict.set("Parent", Object::Reference(self.anchors.pages_root));
        }
        self.objects.insert(new_id, page);

        self.drain().map_err(|err| err.at_page(page_index))?;
        self.pages.push(new_id);

        trace!(
            document = self.document_index,
            page = page_index,
            id = new_id.0,
            "copied page"
        );
        Ok(new_id)
    }

    /// Hand the staged objects over for committing.
    pub(crate) fn finish(self) -> CopiedDocument {
        CopiedDocument {
            objects: self.objects,
            pages: self.pages,
            next_id: self.next_id,
            dangling: self.dangling,
        }
    }

    fn allocate(&mut self) -> ObjectId {
        let id = (self.next_id, 0);
        self.next_id += 1;
        id
    }

    /// Copy every object queued by `rewrite` until the closure is complete.
    fn drain(&mut self) -> Result<(), CompositionError> {
        let source = self.source;

        while let Some((old_id, new_id)) = self.queue.pop_front() {
            let Some(object) = source.document().objects.get(&old_id) else {
                return Err(CompositionError::new(format!(
                    "object {} {} R vanished from its source",
                    old_id.0, old_id.1
                ))
                .in_document(self.document_index));
            };

            let mut object = object.clone();
            self.rewrite(&mut object);
            self.objects.insert(new_id, object);
        }

        Ok(())
    }

    /// Rewrite every reference inside `object` to its output id.
    fn rewrite(&mut self, object: &mut Object) {
        let mut stack = vec![object];

        while let Some(current) = stack.pop() {
            if let Object::Reference(old_id) = *current {
                *current = match self.resolve(old_id) {
                    Some(new_id) => Object::Reference(new_id),
                    None => Object::Null,
                };
                continue;
            }

            match current {
                Object::Array(items) => stack.extend(items.iter_mut()),
                Object::Dictionary(dict) => stack.extend(dict.iter_mut().map(|(_, value)| value)),
                Object::Stream(stream) => {
                    let length = stream.content.len() as i64;
                    stream.dict.set("Length", length);
                    stack.extend(stream.dict.iter_mut().map(|(_, value)| value));
                }
                _ => {}
            }
        }
    }

    fn resolve(&mut self, old_id: ObjectId) -> Option<ObjectId> {
        if let Some(&new_id) = self.map.get(&old_id) {
            return Some(new_id);
        }

        match self.source.skeleton(old_id) {
            Some(Skeleton::Catalog) => return Some(self.anchors.catalog),
            Some(Skeleton::PageTreeNode) => return Some(self.anchors.pages_root),
            None => {}
        }

        // A page that is not part of this copy.
        if self.source.is_page(old_id) {
            return None;
        }

        if !self.source.document().objects.contains_key(&old_id) {
            self.dangling += 1;
            warn!(
                document = self.document_index,
                object = old_id.0,
                generation = old_id.1,
                "dangling reference copied as null"
            );
            return None;
        }

        let new_id = self.allocate();
        self.map.insert(old_id, new_id);
        self.queue.push_back((old_id, new_id));
        Some(new_id)
    }
}
