//! File I/O around the merge engine.
//!
//! - [`reader`]: reads input files into a [`MergeRequest`](crate::merge::MergeRequest)
//! - [`writer`]: writes the merged bytes atomically

pub mod reader;
pub mod writer;

pub use reader::InputReader;
pub use writer::{OutputWriter, WriteStatistics};
