//! Integration tests for dry-run planning.

use pdfmerge::error::{MergeError, ValidationError};
use pdfmerge::merge::{MergeInput, MergeRequest, Merger};

use crate::common::{cyclic_pdf, nested_pdf, pdf_with_pages};

#[test]
fn test_plan_summarizes_each_input() {
    let request = MergeRequest::new()
        .with_input(MergeInput::new(pdf_with_pages(&["A0", "A1", "A2"])).with_label("a.pdf"))
        .with_input(MergeInput::new(nested_pdf(&["B0", "B1"])).with_label("b.pdf"));

    let plan = Merger::new().plan(&request).unwrap();

    assert_eq!(plan.documents.len(), 2);
    assert_eq!(plan.total_pages, 5);
    assert_eq!(plan.total_bytes, request.total_bytes());

    let first = &plan.documents[0];
    assert_eq!(first.index, 0);
    assert_eq!(first.label.as_deref(), Some("a.pdf"));
    assert_eq!(first.summary.page_count, 3);
    assert_eq!(first.summary.version, Some((1, 5)));
    assert_eq!(first.summary.page_dimensions, Some((612.0, 792.0)));

    let second = &plan.documents[1];
    assert_eq!(second.summary.page_count, 2);
    assert_eq!(second.summary.version, Some((1, 6)));
    assert_eq!(second.summary.page_dimensions, Some((595.0, 842.0)));
}

#[test]
fn test_plan_agrees_with_merge() {
    let request = MergeRequest::from(vec![
        pdf_with_pages(&["A0"]),
        pdf_with_pages(&[]),
        nested_pdf(&["C0", "C1", "C2", "C3"]),
    ]);
    let merger = Merger::new();

    let plan = merger.plan(&request).unwrap();
    let output = merger.merge_request(&request).unwrap();

    assert_eq!(plan.total_pages, output.statistics.total_pages);
    assert_eq!(plan.total_bytes, output.statistics.input_size);
}

#[test]
fn test_plan_document_without_pages() {
    let request = MergeRequest::from(vec![pdf_with_pages(&[])]);

    let plan = Merger::new().plan(&request).unwrap();
    assert_eq!(plan.total_pages, 0);
    assert_eq!(plan.documents[0].summary.page_dimensions, None);
}

#[test]
fn test_plan_fails_like_merge() {
    let request = MergeRequest::from(vec![pdf_with_pages(&["A0"]), cyclic_pdf()]);
    let merger = Merger::new();

    let plan_err = merger.plan(&request).unwrap_err();
    let merge_err = merger.merge_request(&request).unwrap_err();

    assert_eq!(plan_err.input_index(), Some(1));
    assert_eq!(plan_err.input_index(), merge_err.input_index());
    assert_eq!(plan_err.validation_error(), merge_err.validation_error());
    assert!(matches!(
        plan_err.validation_error(),
        Some(ValidationError::UnsupportedStructure { .. })
    ));
}

#[test]
fn test_plan_empty_request() {
    let err = Merger::new().plan(&MergeRequest::new()).unwrap_err();
    assert!(matches!(err, MergeError::InsufficientInput));
}

#[test]
fn test_plan_serializes_to_json() {
    let request = MergeRequest::new()
        .with_input(MergeInput::new(pdf_with_pages(&["A0"])).with_label("a.pdf"));

    let plan = Merger::new().plan(&request).unwrap();
    let json = serde_json::to_value(&plan).unwrap();

    assert_eq!(json["totalPages"], 1);
    assert_eq!(json["documents"][0]["label"], "a.pdf");
    assert_eq!(json["documents"][0]["summary"]["pageCount"], 1);
}
