//! PDF merge engine.
//!
//! - [`pages`]: page handles in reading order
//! - [`copier`]: deep copy of pages into the output's object space
//! - [`composer`]: the output document and its serialization
//! - [`metadata`], [`bookmarks`]: Info dictionary and outline of the output
//! - [`merger`]: orchestration, statistics, dry runs and async merges

pub mod bookmarks;
pub mod composer;
pub(crate) mod copier;
pub mod merger;
pub mod metadata;
pub mod pages;

pub use composer::{ComposeInput, ComposedDocument, Composer};
pub use merger::{
    CancellationFlag, MergeInput, MergeOutput, MergePlan, MergeRequest, MergeStatistics, Merger,
    PlannedDocument,
};
pub use pages::{PageExtractor, PageHandle};
