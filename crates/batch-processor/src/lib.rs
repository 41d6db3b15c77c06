//! VMAP Batch - Classify a photo sequence and lay it out
//!
//! Each item is decoded and classified independently; a failing item becomes an
//! [`ItemOutcome::Failed`] entry and the batch carries on. Outcomes keep input
//! order whether the loop runs sequentially or on the rayon pool.

pub mod config;
pub mod naming;
pub mod processor;
pub mod report;
pub mod source;

pub use config::VmapConfig;
pub use naming::{descriptive_filename, extract_sequence, sequence_group};
pub use processor::BatchProcessor;
pub use report::{BatchReport, ClassificationRecord, ItemError, ItemOutcome};
pub use source::{FileImageSource, ImageSource, MemoryImageSource};
