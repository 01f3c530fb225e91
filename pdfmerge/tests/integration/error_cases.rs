//! Integration tests for error handling and edge cases.

use lopdf::{Document, Object, dictionary};
use pdfmerge::error::{MergeError, ValidationError};
use pdfmerge::io::InputReader;
use pdfmerge::merge::{MergeInput, MergeRequest, Merger};
use rstest::rstest;
use std::path::PathBuf;

use crate::common::{cyclic_pdf, pdf_with_pages, reopen};

fn validation_failure(err: &MergeError) -> (usize, &ValidationError) {
    match err {
        MergeError::Validation { index, source, .. } => (*index, source),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_error_empty_request() {
    let err = Merger::new().merge_request(&MergeRequest::new()).unwrap_err();
    assert!(matches!(err, MergeError::InsufficientInput));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_error_corrupt_first_input() {
    let corrupt = b"This is not a PDF file".to_vec();
    let valid = pdf_with_pages(&["Y0", "Y1"]);

    let err = pdfmerge::merge(&[corrupt, valid]).unwrap_err();
    let (index, source) = validation_failure(&err);

    assert_eq!(index, 0);
    assert!(matches!(source, ValidationError::MalformedDocument { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_error_empty_buffer_reports_index_and_label() {
    let request = MergeRequest::new()
        .with_input(MergeInput::new(pdf_with_pages(&["A0"])).with_label("first.pdf"))
        .with_input(MergeInput::new(Vec::new()).with_label("second.pdf"));

    let err = Merger::new().merge_request(&request).unwrap_err();
    let (index, source) = validation_failure(&err);

    assert_eq!(index, 1);
    assert_eq!(source, &ValidationError::EmptyInput);
    assert!(err.to_string().contains("second.pdf"));
}

#[test]
fn test_error_cyclic_page_tree() {
    let err = pdfmerge::merge(&[pdf_with_pages(&["A0"]), cyclic_pdf()]).unwrap_err();
    let (index, source) = validation_failure(&err);

    assert_eq!(index, 1);
    assert!(matches!(source, ValidationError::UnsupportedStructure { .. }));
}

#[test]
fn test_error_lowest_failing_index_wins() {
    let inputs = vec![
        pdf_with_pages(&["A0"]),
        pdf_with_pages(&["B0"]),
        b"%PDF-1.4 truncated".to_vec(),
        Vec::new(),
    ];

    let err = pdfmerge::merge(&inputs).unwrap_err();
    assert_eq!(err.input_index(), Some(2));
}

#[test]
fn test_error_encrypted_input_is_unsupported() {
    let mut doc = reopen(&pdf_with_pages(&["B0"]));
    let encrypt_id = doc.add_object(lopdf::dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let encrypted = save(&mut doc);

    let err = pdfmerge::merge(&[pdf_with_pages(&["A0"]), encrypted]).unwrap_err();
    let (index, source) = validation_failure(&err);

    assert_eq!(index, 1);
    assert!(matches!(source, ValidationError::UnsupportedStructure { .. }));
}

#[test]
fn test_error_missing_catalog() {
    let mut doc = reopen(&pdf_with_pages(&["A0"]));
    doc.trailer.set("Root", Object::Reference((999, 0)));
    let bytes = save(&mut doc);

    let err = pdfmerge::merge(&[bytes]).unwrap_err();
    let (_, source) = validation_failure(&err);
    assert!(matches!(source, ValidationError::MalformedDocument { .. }));
}

#[rstest]
#[case::random_text(b"Hello, world!".to_vec())]
#[case::header_only(b"%PDF-1.7\n".to_vec())]
#[case::binary_noise(vec![0x00, 0xFF, 0x25, 0x50, 0x44, 0x46, 0x13, 0x37])]
#[case::truncated_trailer(b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<<".to_vec())]
fn test_error_garbage_input(#[case] garbage: Vec<u8>) {
    let err = pdfmerge::merge(&[pdf_with_pages(&["A0"]), garbage]).unwrap_err();
    let (index, source) = validation_failure(&err);

    assert_eq!(index, 1);
    assert_ne!(source, &ValidationError::EmptyInput);
}

#[test]
fn test_inputs_are_not_modified() {
    let input = pdf_with_pages(&["A0", "A1"]);
    let snapshot = input.clone();

    pdfmerge::merge(&[&input, &input]).unwrap();
    assert_eq!(input, snapshot);
}

#[tokio::test]
async fn test_error_missing_file() {
    let missing = PathBuf::from("/nonexistent/file.pdf");

    let err = InputReader::new()
        .read_all(std::slice::from_ref(&missing), 1)
        .await
        .unwrap_err();

    match &err {
        MergeError::ReadInput { path, .. } => assert_eq!(path, &missing),
        other => panic!("expected ReadInput, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
