//! Integration tests for the asynchronous merge path.

use pdfmerge::config::MergeOptions;
use pdfmerge::error::{MergeError, ValidationError};
use pdfmerge::merge::{CancellationFlag, MergeInput, MergeRequest, Merger};
use rstest::rstest;

use crate::common::{cyclic_pdf, page_texts, pdf_with_pages};

fn request(documents: usize) -> MergeRequest {
    (0..documents)
        .map(|i| {
            let labels = [format!("D{i}P0"), format!("D{i}P1")];
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            MergeInput::new(pdf_with_pages(&labels)).with_label(format!("doc{i}.pdf"))
        })
        .collect()
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(8)]
#[tokio::test]
async fn test_async_preserves_order(#[case] jobs: usize) {
    let merger = Merger::with_options(MergeOptions {
        jobs: Some(jobs),
        ..Default::default()
    });

    let output = merger.merge_async(request(5)).await.unwrap();
    let expected: Vec<String> = (0..5)
        .flat_map(|i| [format!("D{i}P0"), format!("D{i}P1")])
        .collect();

    assert_eq!(page_texts(&output.bytes), expected);
    assert_eq!(output.statistics.files_merged, 5);
    assert_eq!(output.statistics.total_pages, 10);
}

#[tokio::test]
async fn test_async_matches_sync_page_order() {
    let merger = Merger::new();
    let sync = merger.merge_request(&request(3)).unwrap();
    let async_output = merger.merge_async(request(3)).await.unwrap();

    assert_eq!(page_texts(&sync.bytes), page_texts(&async_output.bytes));
    assert_eq!(sync.statistics.total_pages, async_output.statistics.total_pages);
}

#[tokio::test]
async fn test_async_reports_lowest_failing_index() {
    let mut request = request(2);
    request.push(MergeInput::new(cyclic_pdf()).with_label("cycle.pdf"));
    request.push(MergeInput::new(Vec::new()).with_label("empty.pdf"));

    let merger = Merger::with_options(MergeOptions {
        jobs: Some(4),
        ..Default::default()
    });
    let err = merger.merge_async(request).await.unwrap_err();

    match err {
        MergeError::Validation {
            index,
            label,
            source,
        } => {
            assert_eq!(index, 2);
            assert_eq!(label.as_deref(), Some("cycle.pdf"));
            assert!(matches!(source, ValidationError::UnsupportedStructure { .. }));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_async_cancelled() {
    let flag = CancellationFlag::new();
    let merger = Merger::new().with_cancellation(flag.clone());
    flag.cancel();

    let err = merger.merge_async(request(3)).await.unwrap_err();
    assert!(matches!(err, MergeError::Cancelled));
    assert_eq!(err.exit_code(), 130);
}

#[tokio::test]
async fn test_async_empty_request() {
    let err = Merger::new()
        .merge_async(MergeRequest::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MergeError::InsufficientInput));
}
