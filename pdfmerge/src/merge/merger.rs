//! Merge orchestration.
//!
//! The [`Merger`] runs the three stages in order: every input is validated
//! (stopping at the first failure), pages are extracted from each document and
//! the composer builds and serializes the output. Nothing is produced unless
//! every stage succeeds.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{CompressionLevel, MergeOptions};
use crate::error::{MergeError, Result};
use crate::merge::composer::{ComposeInput, ComposedDocument, Composer};
use crate::merge::pages::PageExtractor;
use crate::utils::format_file_size;
use crate::validation::{DocumentSummary, SourceDocument, Validator};

/// Cooperative cancellation signal shared between a caller and a merge.
///
/// Checked before each document is validated and before each document is
/// copied. A document that is already being copied is finished first.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create a flag that is not raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One input buffer with an optional label used in errors and bookmarks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeInput {
    /// The complete PDF file contents.
    pub bytes: Vec<u8>,
    /// Human-readable name, usually the file name.
    pub label: Option<String>,
}

impl MergeInput {
    /// Create an unlabelled input.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, label: None }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Ordered sequence of inputs to merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRequest {
    inputs: Vec<MergeInput>,
}

impl MergeRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input.
    pub fn push(&mut self, input: MergeInput) {
        self.inputs.push(input);
    }

    /// Append an input, builder style.
    pub fn with_input(mut self, input: MergeInput) -> Self {
        self.push(input);
        self
    }

    /// The inputs, in merge order.
    pub fn inputs(&self) -> &[MergeInput] {
        &self.inputs
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the request has no inputs.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Combined size of all input buffers.
    pub fn total_bytes(&self) -> u64 {
        self.inputs.iter().map(|input| input.bytes.len() as u64).sum()
    }

    fn labels(&self) -> Vec<Option<&str>> {
        self.inputs.iter().map(|input| input.label.as_deref()).collect()
    }

    fn borrowed(&self) -> Vec<(&[u8], Option<&str>)> {
        self.inputs
            .iter()
            .map(|input| (input.bytes.as_slice(), input.label.as_deref()))
            .collect()
    }
}

impl From<Vec<Vec<u8>>> for MergeRequest {
    fn from(buffers: Vec<Vec<u8>>) -> Self {
        buffers.into_iter().map(MergeInput::new).collect()
    }
}

impl FromIterator<MergeInput> for MergeRequest {
    fn from_iter<I: IntoIterator<Item = MergeInput>>(iter: I) -> Self {
        Self {
            inputs: iter.into_iter().collect(),
        }
    }
}

/// Statistics about a merge operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStatistics {
    /// Number of input documents merged.
    pub files_merged: usize,

    /// Total number of pages in the output.
    pub total_pages: usize,

    /// Number of objects copied out of the inputs.
    pub objects_copied: usize,

    /// References to missing objects that were written as null.
    pub dangling_references: usize,

    /// Number of outline entries added.
    pub bookmarks_added: usize,

    /// Combined size of the inputs.
    pub input_size: u64,

    /// Size of the serialized output.
    pub output_size: u64,

    /// PDF version of the output.
    pub version: String,

    /// Compression applied to the output.
    pub compression: CompressionLevel,

    /// Wall-clock time of the whole merge.
    pub elapsed: Duration,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of a merge: the output bytes and statistics about them.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The merged PDF.
    pub bytes: Vec<u8>,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// One validated input of a dry run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedDocument {
    /// Position of the input in the request.
    pub index: usize,

    /// Label of the input, if any.
    pub label: Option<String>,

    /// What the validator found.
    pub summary: DocumentSummary,
}

/// What a merge would produce, without composing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePlan {
    /// Inputs in merge order.
    pub documents: Vec<PlannedDocument>,

    /// Number of pages the output would have.
    pub total_pages: usize,

    /// Combined size of the inputs.
    pub total_bytes: u64,
}

/// PDF merger that combines multiple documents.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    /// Options applied to the output.
    options: MergeOptions,

    /// Raised by the caller to stop between documents.
    cancellation: Option<CancellationFlag>,

    /// Validator for input buffers.
    validator: Validator,

    /// Page extractor for validated documents.
    page_extractor: PageExtractor,
}

impl Merger {
    /// Create a new merger with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a merger with the given options.
    pub fn with_options(options: MergeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Attach a cancellation flag.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// The options this merger applies.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge buffers into one PDF.
    ///
    /// # Errors
    ///
    /// - [`MergeError::InsufficientInput`] if `buffers` is empty
    /// - [`MergeError::Validation`] for the first (lowest index) invalid buffer
    /// - [`MergeError::Composition`] if the output cannot be built
    /// - [`MergeError::Cancelled`] if the attached flag was raised
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfmerge::merge::Merger;
    /// # fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
    /// let merged = Merger::new().merge(&[a, b])?;
    /// std::fs::write("merged.pdf", merged)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn merge<B: AsRef<[u8]>>(&self, buffers: &[B]) -> Result<Vec<u8>> {
        let started = Instant::now();
        let inputs: Vec<(&[u8], Option<&str>)> =
            buffers.iter().map(|buffer| (buffer.as_ref(), None)).collect();
        let input_size = inputs.iter().map(|(bytes, _)| bytes.len() as u64).sum();

        let documents = self.validate_all(&inputs)?;
        let labels = vec![None; documents.len()];
        let composed = self.compose_validated(&documents, &labels)?;

        Ok(self.finish(composed, documents.len(), input_size, started).bytes)
    }

    /// Merge a request and report statistics.
    ///
    /// Same failure modes as [`Merger::merge`]; labels of the request are
    /// used in validation errors and bookmarks.
    pub fn merge_request(&self, request: &MergeRequest) -> Result<MergeOutput> {
        let started = Instant::now();

        let documents = self.validate_all(&request.borrowed())?;
        let composed = self.compose_validated(&documents, &request.labels())?;

        Ok(self.finish(composed, documents.len(), request.total_bytes(), started))
    }

    /// Merge a request off the caller's thread.
    ///
    /// Up to `jobs` inputs are validated concurrently on the blocking pool.
    /// Results are taken in request order, so the lowest failing index wins
    /// just like in [`Merger::merge_request`]. Composition then runs as a
    /// single blocking task.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfmerge::merge::{MergeRequest, Merger};
    /// # async fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
    /// let request = MergeRequest::from(vec![a, b]);
    /// let output = Merger::new().merge_async(request).await?;
    /// println!("{} pages", output.statistics.total_pages);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge_async(&self, request: MergeRequest) -> Result<MergeOutput> {
        let started = Instant::now();

        if request.is_empty() {
            return Err(MergeError::InsufficientInput);
        }

        info!(documents = request.len(), "merging documents");

        let request = Arc::new(request);
        let jobs = self.options.effective_jobs();

        let tasks = (0..request.len()).map(|index| {
            let request = Arc::clone(&request);
            let merger = self.clone();
            async move {
                tokio::task::spawn_blocking(move || {
                    let input = &request.inputs[index];
                    merger.validate_one(index, &input.bytes, input.label.as_deref())
                })
                .await
                .map_err(|e| MergeError::TaskFailed(e.to_string()))?
            }
        });

        let mut results = stream::iter(tasks).buffered(jobs);
        let mut documents = Vec::with_capacity(request.len());
        while let Some(result) = results.next().await {
            documents.push(result?);
        }

        let merger = self.clone();
        let composed = {
            let request = Arc::clone(&request);
            tokio::task::spawn_blocking(move || {
                merger.compose_validated(&documents, &request.labels())
            })
            .await
            .map_err(|e| MergeError::TaskFailed(e.to_string()))??
        };

        Ok(self.finish(composed, request.len(), request.total_bytes(), started))
    }

    /// Validate every input and report what the merge would produce.
    ///
    /// Fails exactly like a merge would during validation.
    pub fn plan(&self, request: &MergeRequest) -> Result<MergePlan> {
        let documents = self.validate_all(&request.borrowed())?;

        let documents: Vec<PlannedDocument> = documents
            .iter()
            .zip(request.inputs())
            .enumerate()
            .map(|(index, (document, input))| PlannedDocument {
                index,
                label: input.label.clone(),
                summary: document.summary(),
            })
            .collect();
        let total_pages = documents.iter().map(|d| d.summary.page_count).sum();

        Ok(MergePlan {
            documents,
            total_pages,
            total_bytes: request.total_bytes(),
        })
    }

    fn validate_all(&self, inputs: &[(&[u8], Option<&str>)]) -> Result<Vec<SourceDocument>> {
        if inputs.is_empty() {
            return Err(MergeError::InsufficientInput);
        }

        info!(documents = inputs.len(), "merging documents");

        inputs
            .iter()
            .enumerate()
            .map(|(index, (bytes, label))| self.validate_one(index, bytes, *label))
            .collect()
    }

    fn validate_one(
        &self,
        index: usize,
        bytes: &[u8],
        label: Option<&str>,
    ) -> Result<SourceDocument> {
        if self.is_cancelled() {
            debug!(document = index, "merge cancelled before validation");
            return Err(MergeError::Cancelled);
        }

        let document = self
            .validator
            .validate(bytes)
            .map_err(|e| MergeError::validation(index, label.map(str::to_string), e))?;

        debug!(
            document = index,
            label = label.unwrap_or_default(),
            pages = document.page_count(),
            "validated input"
        );
        Ok(document)
    }

    fn compose_validated(
        &self,
        documents: &[SourceDocument],
        labels: &[Option<&str>],
    ) -> Result<ComposedDocument> {
        let inputs: Vec<ComposeInput<'_>> = documents
            .iter()
            .enumerate()
            .map(|(index, document)| ComposeInput {
                document,
                pages: self.page_extractor.extract_pages(document),
                label: labels.get(index).copied().flatten(),
            })
            .collect();

        let mut composer = Composer::new(self.options.clone());
        if let Some(flag) = &self.cancellation {
            composer = composer.with_cancellation(flag.clone());
        }
        composer.compose(&inputs)
    }

    fn finish(
        &self,
        composed: ComposedDocument,
        files_merged: usize,
        input_size: u64,
        started: Instant,
    ) -> MergeOutput {
        let statistics = MergeStatistics {
            files_merged,
            total_pages: composed.page_count,
            objects_copied: composed.objects_copied,
            dangling_references: composed.dangling_references,
            bookmarks_added: composed.bookmarks,
            input_size,
            output_size: composed.bytes.len() as u64,
            version: composed.version,
            compression: self.options.compression,
            elapsed: started.elapsed(),
        };

        info!(
            files = statistics.files_merged,
            pages = statistics.total_pages,
            objects = statistics.objects_copied,
            output_bytes = statistics.output_size,
            elapsed_ms = statistics.elapsed.as_millis() as u64,
            "merge complete"
        );

        MergeOutput {
            bytes: composed.bytes,
            statistics,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|flag| flag.is_cancelled())
    }
}
