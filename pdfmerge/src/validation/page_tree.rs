//! Typed page-tree traversal.
//!
//! Walks the `/Pages` tree of a parsed document depth-first, left to right,
//! which is the document's reading order. Every node must be tagged either
//! `/Type /Pages` (with a `/Kids` array) or `/Type /Page`; anything else,
//! a cycle, a shared node or a tree deeper than [`MAX_PAGE_TREE_DEPTH`] is
//! rejected as an unsupported structure.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeSet;

use crate::error::ValidationError;

/// Maximum nesting of intermediate page-tree nodes below the root.
pub const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Page attributes a page may inherit from its ancestors.
pub(crate) const INHERITABLE_ATTRIBUTES: [&[u8]; 4] =
    [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A page leaf found by the walk.
#[derive(Debug, Clone)]
pub(crate) struct PageEntry {
    /// Object id of the page dictionary in the source document.
    pub(crate) id: ObjectId,
    /// Inherited attributes the page does not define itself.
    pub(crate) inherited: Dictionary,
}

/// Result of walking a page tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageTree {
    /// Leaves in reading order.
    pub(crate) pages: Vec<PageEntry>,
    /// Intermediate (`/Type /Pages`) nodes, root included.
    pub(crate) nodes: BTreeSet<ObjectId>,
}

enum NodeKind {
    Pages,
    Page,
}

fn node_kind(dict: &Dictionary) -> Option<NodeKind> {
    match dict.get(b"Type") {
        Ok(Object::Name(name)) if name.as_slice() == b"Pages" => Some(NodeKind::Pages),
        Ok(Object::Name(name)) if name.as_slice() == b"Page" => Some(NodeKind::Page),
        _ => None,
    }
}

fn display_id(id: ObjectId) -> String {
    format!("{} {} R", id.0, id.1)
}

/// Walk the page tree rooted at `root`.
pub(crate) fn walk(doc: &Document, root: ObjectId) -> Result<PageTree, ValidationError> {
    let mut tree = PageTree::default();
    let mut seen = BTreeSet::new();
    let mut stack = vec![(root, 0usize, Dictionary::new())];

    while let Some((id, depth, inherited)) = stack.pop() {
        if depth > MAX_PAGE_TREE_DEPTH {
            return Err(ValidationError::unsupported(format!(
                "page tree is nested deeper than {MAX_PAGE_TREE_DEPTH} levels"
            )));
        }

        if !seen.insert(id) {
            return Err(ValidationError::unsupported(format!(
                "page tree node {} is reachable more than once",
                display_id(id)
            )));
        }

        let dict = match doc.objects.get(&id) {
            Some(Object::Dictionary(dict)) => dict,
            Some(_) => {
                return Err(ValidationError::unsupported(format!(
                    "page tree node {} is not a dictionary",
                    display_id(id)
                )));
            }
            None => {
                return Err(ValidationError::malformed(format!(
                    "page tree node {} does not exist",
                    display_id(id)
                )));
            }
        };

        match node_kind(dict) {
            Some(NodeKind::Page) if id == root => {
                return Err(ValidationError::unsupported(
                    "page tree root is a page, not a /Pages node",
                ));
            }
            Some(NodeKind::Page) => {
                let mut own_inherited = Dictionary::new();
                for (key, value) in inherited.iter() {
                    if !dict.has(key) {
                        own_inherited.set(key.clone(), value.clone());
                    }
                }
                tree.pages.push(PageEntry {
                    id,
                    inherited: own_inherited,
                });
            }
            Some(NodeKind::Pages) => {
                tree.nodes.insert(id);

                let mut child_inherited = inherited;
                for key in INHERITABLE_ATTRIBUTES {
                    if let Ok(value) = dict.get(key) {
                        child_inherited.set(key.to_vec(), value.clone());
                    }
                }

                let kids = kids_of(doc, dict, id)?;
                for kid in kids.iter().rev() {
                    let Object::Reference(kid_id) = kid else {
                        return Err(ValidationError::unsupported(format!(
                            "page tree node {} has a direct object in /Kids",
                            display_id(id)
                        )));
                    };
                    stack.push((*kid_id, depth + 1, child_inherited.clone()));
                }
            }
            None => {
                return Err(ValidationError::unsupported(format!(
                    "page tree node {} is neither /Type /Pages nor /Type /Page",
                    display_id(id)
                )));
            }
        }
    }

    Ok(tree)
}

fn kids_of<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    id: ObjectId,
) -> Result<&'a Vec<Object>, ValidationError> {
    match dict.get(b"Kids") {
        Ok(Object::Array(kids)) => Ok(kids),
        Ok(Object::Reference(kids_id)) => match doc.objects.get(kids_id) {
            Some(Object::Array(kids)) => Ok(kids),
            _ => Err(ValidationError::unsupported(format!(
                "/Kids of page tree node {} does not resolve to an array",
                display_id(id)
            ))),
        },
        _ => Err(ValidationError::unsupported(format!(
            "page tree node {} has no /Kids array",
            display_id(id)
        ))),
    }
}
