//! Integration tests for basic PDF merging operations.

use pdfmerge::config::{CompressionLevel, MergeOptions, Metadata};
use pdfmerge::io::{InputReader, OutputWriter};
use pdfmerge::merge::{MergeInput, MergeRequest, Merger};
use rstest::rstest;
use std::collections::HashSet;
use tempfile::TempDir;

use crate::common::{nested_pdf, page_font, page_texts, pdf_with_pages, reopen, write_fixture};

#[test]
fn test_merge_three_documents_in_order() {
    let a = pdf_with_pages(&["A0", "A1", "A2"]);
    let b = pdf_with_pages(&["B0"]);
    let c = pdf_with_pages(&["C0", "C1"]);

    let merged = pdfmerge::merge(&[a, b, c]).unwrap();

    assert_eq!(
        page_texts(&merged),
        vec!["A0", "A1", "A2", "B0", "C0", "C1"]
    );
}

#[test]
fn test_merge_skips_document_without_pages() {
    let x = pdf_with_pages(&[]);
    let y = pdf_with_pages(&["Y0", "Y1"]);

    let merged = pdfmerge::merge(&[x, y]).unwrap();
    assert_eq!(page_texts(&merged), vec!["Y0", "Y1"]);
}

#[test]
fn test_merge_only_empty_documents() {
    let merged = pdfmerge::merge(&[pdf_with_pages(&[]), pdf_with_pages(&[])]).unwrap();
    assert!(reopen(&merged).get_pages().is_empty());
}

#[test]
fn test_single_document_identity() {
    let input = pdf_with_pages(&["P0", "P1", "P2", "P3"]);

    let merged = pdfmerge::merge(&[&input]).unwrap();
    assert_eq!(page_texts(&merged), page_texts(&input));
}

#[test]
fn test_merge_output_is_valid_input() {
    let first = pdfmerge::merge(&[pdf_with_pages(&["A0"]), pdf_with_pages(&["B0", "B1"])]).unwrap();
    let second = pdfmerge::merge(&[first, pdf_with_pages(&["C0"])]).unwrap();

    assert_eq!(page_texts(&second), vec!["A0", "B0", "B1", "C0"]);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(7)]
fn test_page_count_conservation(#[case] documents: usize) {
    let inputs: Vec<Vec<u8>> = (0..documents)
        .map(|i| {
            let labels: Vec<String> = (0..=i).map(|p| format!("D{i}P{p}")).collect();
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            pdf_with_pages(&labels)
        })
        .collect();

    let merged = pdfmerge::merge(&inputs).unwrap();
    let expected: usize = (1..=documents).sum();
    assert_eq!(reopen(&merged).get_pages().len(), expected);
}

#[test]
fn test_shared_font_copied_once_per_document() {
    let input = pdf_with_pages(&["A0", "A1", "A2"]);

    let merged = pdfmerge::merge(&[&input]).unwrap();
    let doc = reopen(&merged);

    let fonts: HashSet<_> = doc
        .get_pages()
        .values()
        .map(|page_id| page_font(&doc, *page_id))
        .collect();
    assert_eq!(fonts.len(), 1);
}

#[test]
fn test_copies_of_same_source_are_disjoint() {
    let input = pdf_with_pages(&["A0", "A1"]);

    let merged = pdfmerge::merge(&[&input, &input]).unwrap();
    let doc = reopen(&merged);
    let pages: Vec<_> = doc.get_pages().into_values().collect();

    assert_eq!(pages.len(), 4);
    assert_eq!(pages.iter().collect::<HashSet<_>>().len(), 4);
    assert_eq!(page_font(&doc, pages[0]), page_font(&doc, pages[1]));
    assert_ne!(page_font(&doc, pages[1]), page_font(&doc, pages[2]));
    assert_eq!(page_texts(&merged), vec!["A0", "A1", "A0", "A1"]);
}

#[test]
fn test_inherited_attributes_survive_reparenting() {
    let input = nested_pdf(&["N0", "N1", "N2", "N3"]);

    let merged = pdfmerge::merge(&[&input]).unwrap();
    let doc = reopen(&merged);
    let pages: Vec<_> = doc.get_pages().into_values().collect();

    assert_eq!(page_texts(&merged), vec!["N0", "N1", "N2", "N3"]);
    for (index, page_id) in pages.iter().enumerate() {
        let page = doc.get_dictionary(*page_id).unwrap();
        let rotate = page.get(b"Rotate").unwrap().as_i64().unwrap();
        assert_eq!(rotate, if index < 2 { 90 } else { 0 });

        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 595.0);
        assert!(page.has(b"Resources"));
    }
}

#[test]
fn test_output_page_tree_is_flat() {
    let merged = pdfmerge::merge(&[nested_pdf(&["N0", "N1"]), pdf_with_pages(&["P0"])]).unwrap();
    let doc = reopen(&merged);

    let pages_id = doc
        .catalog()
        .unwrap()
        .get(b"Pages")
        .unwrap()
        .as_reference()
        .unwrap();
    let root = doc.get_dictionary(pages_id).unwrap();
    assert_eq!(root.get(b"Count").unwrap().as_i64().unwrap(), 3);

    for page_id in doc.get_pages().values() {
        let page = doc.get_dictionary(*page_id).unwrap();
        assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), pages_id);
    }
}

#[test]
fn test_output_metadata() {
    let options = MergeOptions {
        metadata: Metadata::new(
            Some("Quarterly Report".to_string()),
            Some("Finance".to_string()),
            None,
            None,
        ),
        ..Default::default()
    };

    let request = MergeRequest::from(vec![pdf_with_pages(&["A0"])]);
    let output = Merger::with_options(options).merge_request(&request).unwrap();
    let doc = reopen(&output.bytes);

    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_id).unwrap();
    let text = |key: &[u8]| match info.get(key).unwrap() {
        lopdf::Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
        other => panic!("unexpected value: {other:?}"),
    };

    assert_eq!(text(b"Title"), "Quarterly Report");
    assert_eq!(text(b"Author"), "Finance");
    assert!(text(b"Producer").starts_with("pdfmerge"));
    assert!(text(b"CreationDate").starts_with("D:"));
}

#[test]
fn test_options_file_metadata_is_trimmed() {
    let options =
        MergeOptions::from_json(r#"{"metadata": {"title": "   ", "author": "  Jane  "}}"#).unwrap();
    let request = MergeRequest::from(vec![pdf_with_pages(&["A0"])]);

    let output = Merger::with_options(options).merge_request(&request).unwrap();
    let doc = reopen(&output.bytes);
    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_id).unwrap();

    assert!(!info.has(b"Title"));
    match info.get(b"Author").unwrap() {
        lopdf::Object::String(bytes, _) => assert_eq!(bytes.as_slice(), b"Jane"),
        other => panic!("unexpected value: {other:?}"),
    }
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
fn test_compression_levels(#[case] compression: CompressionLevel) {
    let options = MergeOptions {
        compression,
        ..Default::default()
    };
    let request = MergeRequest::new()
        .with_input(MergeInput::new(pdf_with_pages(&["A0", "A1"])))
        .with_input(MergeInput::new(nested_pdf(&["B0", "B1"])));

    let output = Merger::with_options(options).merge_request(&request).unwrap();
    assert_eq!(page_texts(&output.bytes), vec!["A0", "A1", "B0", "B1"]);
    assert_eq!(output.statistics.compression, compression);
}

#[test]
fn test_output_version_follows_inputs() {
    // nested_pdf writes PDF 1.6, pdf_with_pages 1.5.
    let merged = pdfmerge::merge(&[pdf_with_pages(&["A0"]), nested_pdf(&["B0", "B1"])]).unwrap();
    assert_eq!(reopen(&merged).version, "1.6");
}

#[tokio::test]
async fn test_merge_files_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_fixture(temp_dir.path(), "first.pdf", &pdf_with_pages(&["A0"]));
    let second = write_fixture(temp_dir.path(), "second.pdf", &pdf_with_pages(&["B0", "B1"]));
    let output_path = temp_dir.path().join("out/merged.pdf");

    let request = InputReader::new().read_all(&[first, second], 2).await.unwrap();
    let output = Merger::new().merge_async(request).await.unwrap();
    let stats = OutputWriter::new()
        .write(output.bytes.clone(), &output_path)
        .await
        .unwrap();

    assert_eq!(stats.file_size, output.bytes.len() as u64);
    let written = std::fs::read(&output_path).unwrap();
    assert_eq!(page_texts(&written), vec!["A0", "B0", "B1"]);
}
