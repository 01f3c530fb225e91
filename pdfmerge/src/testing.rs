//! In-memory PDF fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Populate `doc` with one page per label and serialize it.
///
/// The font and resources live on the page-tree root, so every page
/// inherits them. Each page draws its label as text.
pub(crate) fn build_into(doc: &mut Document, labels: &[&str]) -> Vec<u8> {
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let kids: Vec<Object> = labels
        .iter()
        .map(|label| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, text_content(label)));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }
        .into(),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    save(doc)
}

/// A PDF 1.5 document with one page per label.
pub(crate) fn build_pdf(labels: &[&str]) -> Vec<u8> {
    build_into(&mut Document::with_version("1.5"), labels)
}

/// A two-page document, modified by `edit` before it is serialized.
pub(crate) fn build_pdf_with(edit: impl FnOnce(&mut Document)) -> Vec<u8> {
    let mut doc = Document::load_mem(&build_pdf(&["one", "two"])).unwrap();
    edit(&mut doc);
    save(&mut doc)
}

/// A document whose pages sit below an intermediate page-tree node that
/// carries the inherited resources and media box.
pub(crate) fn build_nested_pdf(labels: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let root_id = doc.new_object_id();
    let inner_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let kids: Vec<Object> = labels
        .iter()
        .map(|label| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, text_content(label)));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => inner_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        inner_id,
        dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }
        .into(),
    );
    doc.objects.insert(
        root_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => labels.len() as i64,
            "Kids" => vec![inner_id.into()],
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }
        .into(),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => root_id,
    });
    doc.trailer.set("Root", catalog_id);

    save(&mut doc)
}

/// Serialize a document.
pub(crate) fn save(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// The text drawn on each page of a PDF, in page order.
pub(crate) fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = doc.get_page_content(*page_id).unwrap();
            let content = Content::decode(&content).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(text, _)) => Some(String::from_utf8_lossy(text).into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("")
        })
        .collect()
}

fn text_content(label: &str) -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(label)]),
            Operation::new("ET", vec![]),
        ],
    };
    content.encode().unwrap()
}
